mod common;

use common::{Arg, Exit, Fixture, Label, Method, UnitWriter};
use pretty_assertions::assert_eq;
use sharpcheck::{
    Compilation, Config, Engine, Fixer, JsonFormatter, OutputFormatter, Severity, SymbolId,
    SyntaxKind, TextFormatter,
};
use std::path::Path;

/// Symbols shared by every unit of the sample project
struct Project {
    f: Fixture,
    color: SymbolId,
    members: Vec<SymbolId>,
    person: SymbolId,
    name: SymbolId,
    point: SymbolId,
    point_equals: SymbolId,
}

impl Project {
    fn new() -> Self {
        let mut f = Fixture::new();
        let object_equals = f.object_equals;
        let (color, members) = f.enum_type("Color", &["Red", "Green", "Blue"]);
        let person = f.class("Person");
        let name = f.property(person, "Name");
        let point = f.class("Point");
        let point_equals = f.override_of(point, "Equals", 1, object_equals);
        Self {
            f,
            color,
            members,
            person,
            name,
            point,
            point_equals,
        }
    }

    /// `Person` with a notification in `Update()` and a switch in `Paint()`
    fn person(
        &mut self,
        path: &str,
        update: impl FnOnce(&mut UnitWriter),
        sections: impl FnOnce(&mut UnitWriter),
    ) {
        let (person, name, color) = (self.person, self.name, self.color);
        self.f.unit(path, |w| {
            w.class("Person", Some(person), &[SyntaxKind::PublicKeyword], |w| {
                w.property(SyntaxKind::StringKeyword, "Name", Some(name));
                w.method(Method::new("Update"), update);
                w.method(Method::new("Paint"), |w| {
                    w.switch("color", Some(color), sections);
                });
            });
        });
    }

    fn point(&mut self) {
        let (point, equals) = (self.point, self.point_equals);
        self.f.unit("App/Point.cs", |w| {
            w.class("Point", Some(point), &[SyntaxKind::PublicKeyword], |w| {
                w.method(
                    Method::overriding("Equals", SyntaxKind::BoolKeyword)
                        .parameter(SyntaxKind::ObjectKeyword, "obj")
                        .symbol(equals),
                    |_| {},
                );
            });
        });
    }

    fn legacy(&mut self) {
        let (person, name) = (self.person, self.name);
        self.f.unit("Legacy/Old.cs", |w| {
            w.class("Person", Some(person), &[], |w| {
                w.property(SyntaxKind::StringKeyword, "Name", Some(name));
                w.method(Method::new("Reset"), |w| {
                    w.call("OnPropertyChanged", &[Arg::Str("Name")]);
                });
            });
        });
    }

    /// Four findings: one per rule in `App/`, one more SC0003 in `Legacy/`
    fn sample() -> (Self, Compilation) {
        let mut project = Self::new();
        let red = project.members[0];
        project.person(
            "App/Person.cs",
            |w| {
                w.call("OnPropertyChanged", &[Arg::Str("Name")]);
            },
            |w| {
                w.section(&[Label::Qualified("Color", "Red", Some(red))], Exit::Break);
            },
        );
        project.point();
        project.legacy();
        let compilation = project.f.take_compilation();
        (project, compilation)
    }
}

fn findings(engine: &Engine, compilation: &Compilation) -> Vec<(String, String, Severity)> {
    engine
        .analyze(compilation)
        .diagnostics
        .into_iter()
        .map(|d| (d.location.file.display().to_string(), d.rule_id, d.severity))
        .collect()
}

fn finding(file: &str, rule_id: &str, severity: Severity) -> (String, String, Severity) {
    (file.to_string(), rule_id.to_string(), severity)
}

#[test]
fn builtin_analyzers_report_in_source_order() {
    let (_, compilation) = Project::sample();
    let engine = Engine::with_builtin_analyzers(Config::default()).unwrap();
    let result = engine.analyze(&compilation);

    assert_eq!(result.units_processed, 3);
    assert_eq!(result.warning_count, 4);
    assert_eq!(result.units_with_warnings, 3);
    assert_eq!(result.exit_code(), 1);
    assert!(!result.cancelled);
    assert_eq!(
        findings(&engine, &compilation),
        vec![
            finding("App/Person.cs", "SC0003", Severity::Warning),
            finding("App/Person.cs", "SC0002", Severity::Warning),
            finding("App/Point.cs", "SC0001", Severity::Warning),
            finding("Legacy/Old.cs", "SC0003", Severity::Warning),
        ]
    );
}

#[test]
fn project_config_file_filters_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".sharpcheck.yaml"),
        concat!(
            "rules:\n",
            "  disabled:\n",
            "    - switch-missing-enum-member\n",
            "  severity:\n",
            "    SC0001: error\n",
            "  per_file:\n",
            "    \"Legacy/**\": [all]\n",
        ),
    )
    .unwrap();
    let config = Config::load_from_dirs(dir.path(), None).unwrap();

    let (_, compilation) = Project::sample();
    let engine = Engine::with_builtin_analyzers(config).unwrap();
    let result = engine.analyze(&compilation);

    assert_eq!(result.error_count, 1);
    assert_eq!(result.warning_count, 1);
    assert_eq!(result.exit_code(), 2);
    assert_eq!(
        findings(&engine, &compilation),
        vec![
            finding("App/Person.cs", "SC0003", Severity::Warning),
            finding("App/Point.cs", "SC0001", Severity::Error),
        ]
    );
}

#[test]
fn generated_units_are_detected_three_ways() {
    let mut f = Fixture::new();
    let empty = |w: &mut UnitWriter| {
        w.class("Form1", None, &[], |_| {});
    };
    f.unit("Plain.cs", empty);
    f.generated_unit("Flagged.cs", empty);
    f.unit("Form1.designer.cs", empty);
    f.unit("Header.cs", |w| {
        w.comment("// <auto-generated/>");
        w.class("Form1", None, &[], |_| {});
    });
    let compilation = f.take_compilation();

    let engine = Engine::new(Config::default()).unwrap();
    let generated: Vec<bool> = compilation
        .units
        .iter()
        .map(|u| engine.is_generated(u))
        .collect();
    assert_eq!(generated, vec![false, true, true, true]);

    let mut config = Config::default();
    config.generated_code.detect_header = false;
    let engine = Engine::new(config).unwrap();
    let header = compilation.unit(Path::new("Header.cs")).unwrap();
    assert!(!engine.is_generated(header));
}

#[test]
fn snapshot_round_trip_gives_identical_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let (_, compilation) = Project::sample();
    compilation.save(&path).unwrap();
    let loaded = Compilation::load(&path).unwrap();

    let engine = Engine::with_builtin_analyzers(Config::default()).unwrap();
    assert_eq!(
        engine.analyze(&loaded).diagnostics,
        engine.analyze(&compilation).diagnostics
    );
}

#[test]
fn fixer_applies_safe_fixes_unless_unsafe_is_requested() {
    let (mut project, compilation) = Project::sample();
    let engine = Engine::with_builtin_analyzers(Config::default()).unwrap();
    let diagnostics = engine.analyze(&compilation).diagnostics;

    let mut fixer = Fixer::default();
    fixer.collect_from_diagnostics(&diagnostics);
    assert_eq!(fixer.pending_count(), 3);
    let safe = fixer.apply_all(&compilation);
    assert_eq!(safe.fixes_applied, 2);
    assert_eq!(safe.fixes_skipped, 1);
    assert_eq!(safe.units_modified, 2);
    assert!(safe.errors.is_empty());

    let mut fixer = Fixer::default().with_unsafe_fixes(true);
    fixer.collect_from_diagnostics(&diagnostics);
    let all = fixer.apply_all(&compilation);
    assert_eq!(all.fixes_applied, 3);
    assert_eq!(all.unsafe_fixes_applied, 1);

    let members = project.members.clone();
    project.person(
        "App/Person.cs",
        |w| {
            w.call("OnPropertyChanged", &[Arg::NameOf("Name")]);
        },
        |w| {
            w.section(&[Label::Qualified("Color", "Red", Some(members[0]))], Exit::Break);
            w.section(&[Label::Qualified("Color", "Green", Some(members[1]))], Exit::Throw);
            w.section(&[Label::Qualified("Color", "Blue", Some(members[2]))], Exit::Throw);
        },
    );
    let expected = project.f.take_compilation();
    let path = Path::new("App/Person.cs");
    assert_eq!(
        all.fixed[path].text(),
        expected.unit(path).unwrap().tree.text()
    );
}

#[test]
fn formatters_render_the_same_result() {
    let (_, compilation) = Project::sample();
    let engine = Engine::with_builtin_analyzers(Config::default()).unwrap();
    let result = engine.analyze(&compilation);

    let text = TextFormatter::new().without_color().format(&result);
    assert!(text.contains("warning[SC0001]: Equals() and GetHashcode() must be implemented together."));
    assert!(text.contains("OnPropertyChanged(Name) can use the nameof() operator."));
    assert!(text.contains("3 units processed: 4 warnings"));

    let value: serde_json::Value =
        serde_json::from_str(&JsonFormatter::new().format(&result)).unwrap();
    assert_eq!(value["diagnostics"].as_array().unwrap().len(), 4);
    assert_eq!(value["summary"]["warning_count"], 4);
    assert_eq!(value["diagnostics"][1]["properties"]["enum_name"], "Color");
    assert_eq!(value["diagnostics"][1]["properties"]["missing_members"], "Green,Blue");
}

#[test]
fn cancelled_engine_returns_a_partial_result() {
    let (_, compilation) = Project::sample();
    let engine = Engine::with_builtin_analyzers(Config::default()).unwrap();
    engine.cancellation_token().cancel();

    let result = engine.analyze(&compilation);
    assert!(result.cancelled);
    assert!(result.diagnostics.is_empty());
}
