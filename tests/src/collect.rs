use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use ecow::EcoString;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{ARGS, SUITE_PATH};

/// A fixture from the suite.
pub struct Test {
    /// The fixture's path below the suite, without extension.
    pub name: EcoString,
    pub path: PathBuf,
    pub kind: Kind,
    /// The fixture's fields: the inputs for its kind plus `expected`.
    pub body: Map<String, Value>,
}

impl Display for Test {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// What a fixture exercises.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    /// `theme` applied to `input`.
    Transform,
    /// `layout` composed over `page` with `prefix`.
    Layout,
    /// `page` transformed with `theme` and composed into `layout`.
    Page,
    /// `config` checked as a theme configuration.
    ValidateTheme,
    /// `config` checked as a layout.
    ValidateLayout,
    /// `config` checked as a manifest.
    ValidateManifest,
}

impl Kind {
    /// The kind's name as written in fixtures.
    pub fn name(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Layout => "layout",
            Self::Page => "page",
            Self::ValidateTheme => "validate-theme",
            Self::ValidateLayout => "validate-layout",
            Self::ValidateManifest => "validate-manifest",
        }
    }
}

/// Collects all selected fixtures and the number of skipped ones.
pub fn collect() -> Result<(Vec<Test>, usize), Vec<String>> {
    let mut tests = vec![];
    let mut errors = vec![];
    let mut skipped = 0;

    for entry in walkdir::WalkDir::new(SUITE_PATH).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                errors.push(err.to_string());
                continue;
            }
        };

        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }

        let name = test_name(path);
        if !ARGS.selects(&name) {
            skipped += 1;
            continue;
        }

        match parse(path) {
            Ok((kind, body)) => tests.push(Test { name, path: path.into(), kind, body }),
            Err(err) => errors.push(format!("{}: {err}", path.display())),
        }
    }

    if errors.is_empty() { Ok((tests, skipped)) } else { Err(errors) }
}

fn test_name(path: &Path) -> EcoString {
    let relative = path.strip_prefix(SUITE_PATH).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .into()
}

fn parse(path: &Path) -> Result<(Kind, Map<String, Value>), String> {
    let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    let Value::Object(body) =
        serde_json::from_str(&text).map_err(|err| format!("invalid JSON ({err})"))?
    else {
        return Err("fixture must be an object".into());
    };
    let kind = body.get("kind").cloned().ok_or("fixture has no kind")?;
    let kind = serde_json::from_value(kind).map_err(|err| format!("invalid kind ({err})"))?;
    Ok((kind, body))
}
