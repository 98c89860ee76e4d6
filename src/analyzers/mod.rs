//! Built-in analyzers

pub mod helpers;

mod equals_hashcode;
mod property_changed_nameof;
mod switch_enum;

pub use equals_hashcode::{EqualsHashCodeAnalyzer, EQUALS_AND_GET_HASH_CODE};
pub use property_changed_nameof::{PropertyChangedNameOfAnalyzer, ON_PROPERTY_CHANGED_WITHOUT_NAMEOF};
pub use switch_enum::{SwitchEnumAnalyzer, SWITCH_MISSING_ENUM_MEMBER};

use crate::analyzer::Analyzer;
use std::sync::Arc;

/// Every analyzer shipped with the crate
pub fn builtin_analyzers() -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(EqualsHashCodeAnalyzer),
        Arc::new(SwitchEnumAnalyzer),
        Arc::new(PropertyChangedNameOfAnalyzer),
    ]
}
