use std::fmt::Write;

use serde::de::DeserializeOwned;
use serde_json::Value;
use similar::TextDiff;
use trellis::layout::{LayoutConfig, PageData, layout_transform};
use trellis::transform::{ThemeConfig, Transformer};
use trellis::validate::{validate_layout_config, validate_manifest, validate_theme_config};
use trellis::{Format, Node, compose_page, load_layout, load_theme};

use crate::ARGS;
use crate::collect::{Kind, Test};
use crate::report::Outcome;

/// Runs a single fixture.
pub fn run(test: &Test) -> Outcome {
    let mut outcome = Outcome::default();

    let actual = match produce(test) {
        Ok(actual) => actual,
        Err(err) => {
            writeln!(outcome.problems, "{err}").unwrap();
            return outcome;
        }
    };

    let expected = test.body.get("expected");
    if expected == Some(&actual) {
        return outcome;
    }

    if ARGS.update {
        let mut body = test.body.clone();
        body.insert("expected".into(), actual);
        let mut text = serde_json::to_string_pretty(&body).unwrap();
        text.push('\n');
        std::fs::write(&test.path, text).unwrap();
        writeln!(outcome.notes, "updated expected output").unwrap();
        return outcome;
    }

    outcome.mismatch = true;
    let Some(expected) = expected else {
        writeln!(outcome.problems, "fixture has no expected output").unwrap();
        return outcome;
    };

    let old = serde_json::to_string_pretty(expected).unwrap();
    let new = serde_json::to_string_pretty(&actual).unwrap();
    let diff = TextDiff::from_lines(&old, &new);
    write!(
        outcome.problems,
        "{}",
        diff.unified_diff().context_radius(3).header("expected", "actual")
    )
    .unwrap();
    outcome
}

/// Computes a fixture's actual output.
fn produce(test: &Test) -> Result<Value, String> {
    match test.kind {
        Kind::Transform => {
            let theme = theme(test)?;
            let input: Node = field(test, "input")?;
            to_value(Transformer::new(theme).transform(&input))
        }
        Kind::Layout => {
            let layout = layout(test)?;
            let page: PageData = field(test, "page")?;
            let prefix: String = field(test, "prefix")?;
            to_value(layout_transform(&layout, &page, &prefix))
        }
        Kind::Page => {
            let transformer = Transformer::new(theme(test)?);
            let layout = layout(test)?;
            let page: PageData = field(test, "page")?;
            to_value(compose_page(&transformer, &layout, page))
        }
        Kind::ValidateTheme => to_value(validate_theme_config(raw(test, "config")?)),
        Kind::ValidateLayout => to_value(validate_layout_config(raw(test, "config")?)),
        Kind::ValidateManifest => to_value(validate_manifest(raw(test, "config")?)),
    }
}

fn theme(test: &Test) -> Result<ThemeConfig, String> {
    let text = raw(test, "theme")?.to_string();
    let warned = load_theme(&text, Format::Json).map_err(|err| err.to_string())?;
    Ok(warned.output)
}

fn layout(test: &Test) -> Result<LayoutConfig, String> {
    let text = raw(test, "layout")?.to_string();
    let warned = load_layout(&text, Format::Json).map_err(|err| err.to_string())?;
    Ok(warned.output)
}

fn raw<'a>(test: &'a Test, key: &str) -> Result<&'a Value, String> {
    test.body.get(key).ok_or_else(|| format!("fixture has no `{key}`"))
}

fn field<T: DeserializeOwned>(test: &Test, key: &str) -> Result<T, String> {
    serde_json::from_value(raw(test, key)?.clone())
        .map_err(|err| format!("invalid `{key}` ({err})"))
}

fn to_value(output: impl serde::Serialize) -> Result<Value, String> {
    serde_json::to_value(output).map_err(|err| err.to_string())
}
