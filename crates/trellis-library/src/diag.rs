//! Diagnostics.

use std::fmt::{self, Display, Formatter};

use ecow::{EcoVec, eco_vec};
use serde::Serialize;

/// Early-return with a [`StrResult`].
///
/// ```ignore
/// bail!("unknown source `{}`", raw);
/// ```
#[macro_export]
#[doc(hidden)]
macro_rules! __bail {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        return Err($crate::diag::error!($fmt $(, $arg)*))
    };
}

/// Construct an [`EcoString`] error message.
#[macro_export]
#[doc(hidden)]
macro_rules! __error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::diag::eco_format!($fmt, $($arg),*)
    };
}

#[rustfmt::skip]
#[doc(inline)]
pub use {
    crate::__bail as bail,
    crate::__error as error,
    ecow::{eco_format, EcoString},
};

/// A result type with a string error message.
pub type StrResult<T> = Result<T, EcoString>;

/// An output alongside warnings generated while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Warned<T> {
    /// The produced output.
    pub output: T,
    /// Warnings generated while producing the output.
    pub warnings: EcoVec<ConfigDiagnostic>,
}

impl<T> Warned<T> {
    /// Wrap an output without any warnings.
    pub fn new(output: T) -> Self {
        Self { output, warnings: eco_vec![] }
    }

    /// Map the output while keeping the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Warned<U> {
        Warned { output: f(self.output), warnings: self.warnings }
    }
}

/// The severity of a [`ConfigDiagnostic`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A structural problem. The configuration cannot be used as is.
    Error,
    /// A dangling cross-reference. The configuration still works.
    Warning,
}

/// A problem found in a configuration object.
///
/// The path uses dotted field access and bracketed indices, e.g.
/// `runes.Hint.structure.icon.group` or `routeRules[0].layout`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct ConfigDiagnostic {
    /// Whether this blocks the configuration.
    pub severity: Severity,
    /// Where in the configuration the problem is.
    pub path: EcoString,
    /// What is wrong.
    pub message: EcoString,
    /// Additional hints on how to fix the problem.
    #[serde(skip_serializing_if = "EcoVec::is_empty")]
    pub hints: EcoVec<EcoString>,
}

impl ConfigDiagnostic {
    /// Create a new, bare error.
    pub fn error(path: impl Into<EcoString>, message: impl Into<EcoString>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
            hints: eco_vec![],
        }
    }

    /// Create a new, bare warning.
    pub fn warning(path: impl Into<EcoString>, message: impl Into<EcoString>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
            hints: eco_vec![],
        }
    }

    /// Adds a single hint to the diagnostic.
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

impl Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{}: {}", self.path, self.message)?;
        }
        for hint in &self.hints {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

/// Joins diagnostics into a single error message, one per line.
pub fn join_diagnostics<'a>(
    diagnostics: impl IntoIterator<Item = &'a ConfigDiagnostic>,
) -> EcoString {
    let mut message = EcoString::new();
    for (i, diag) in diagnostics.into_iter().enumerate() {
        if i > 0 {
            message.push('\n');
        }
        message.push_str(&eco_format!("{diag}"));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_level(text: &str) -> StrResult<u8> {
        let Ok(level) = text.parse::<u8>() else {
            bail!("invalid heading level `{}`", text);
        };
        Ok(level)
    }

    #[test]
    fn test_bail() {
        assert_eq!(parse_level("2"), Ok(2));
        assert_eq!(parse_level("x"), Err("invalid heading level `x`".into()));
    }

    #[test]
    fn test_display() {
        let diag = ConfigDiagnostic::error("prefix", "Must be a non-empty string")
            .with_hint("themes usually use `rf`");
        assert_eq!(
            diag.to_string(),
            "prefix: Must be a non-empty string (hint: themes usually use `rf`)"
        );
        let bare = ConfigDiagnostic::warning("", "Config must be a non-null object");
        assert_eq!(bare.to_string(), "Config must be a non-null object");
        assert_eq!(
            join_diagnostics([&diag, &bare]).lines().count(),
            2,
        );
    }
}
