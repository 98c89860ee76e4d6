//! Built-in code fixes

mod nameof;
mod switch_cases;

pub use nameof::NameOfFix;
pub use switch_cases::AddMissingCasesFix;

use crate::codefix::CodeFixProvider;
use std::sync::Arc;

/// Every code fix shipped with the crate
pub fn builtin_fixes() -> Vec<Arc<dyn CodeFixProvider>> {
    vec![Arc::new(NameOfFix), Arc::new(AddMissingCasesFix)]
}
