//! Environment marker classification.
//!
//! Only two marker shapes are understood: the optional-feature form
//! `extra == 'NAME'` and the interpreter-version form
//! `python_version OP 'X.Y'`. Anything else, including compound markers
//! joined by `and`/`or`, is reported as unsupported.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::name::normalize;
use crate::core::requirement::VersionOp;

static EXTRA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^extra\s*==\s*(?:'([^']+)'|"([^"]+)")$"#).unwrap()
});

static PYTHON_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^python_version\s*(~=|==|!=|<=|>=|<|>)\s*(?:'([^']+)'|"([^"]+)")$"#).unwrap()
});

/// The conditional context of one requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// No marker: always required.
    Unconditional,
    /// Gated by an optional feature flag. The flag name is normalized.
    Extra(String),
    /// Gated by an interpreter version comparison.
    PythonVersion { op: VersionOp, version: String },
    /// Any other marker, carried verbatim.
    Unsupported(String),
}

impl Marker {
    /// Classify the text after `;` (or its absence).
    pub fn classify(marker: Option<&str>) -> Marker {
        let Some(marker) = marker.map(str::trim) else {
            return Marker::Unconditional;
        };
        if marker.is_empty() {
            return Marker::Unconditional;
        }

        if let Some(caps) = EXTRA.captures(marker) {
            let flag = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            return Marker::Extra(normalize(flag));
        }

        if let Some(caps) = PYTHON_VERSION.captures(marker) {
            if let Ok(op) = caps[1].parse::<VersionOp>() {
                let version = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
                return Marker::PythonVersion {
                    op,
                    version: version.to_string(),
                };
            }
        }

        Marker::Unsupported(marker.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_none() {
        assert_eq!(Marker::classify(None), Marker::Unconditional);
        assert_eq!(Marker::classify(Some("  ")), Marker::Unconditional);
    }

    #[test]
    fn test_classify_extra() {
        assert_eq!(
            Marker::classify(Some("extra == 'test'")),
            Marker::Extra("test".to_string())
        );
        assert_eq!(
            Marker::classify(Some("extra == \"Docs.Build\"")),
            Marker::Extra("docs-build".to_string())
        );
    }

    #[test]
    fn test_classify_python_version() {
        assert_eq!(
            Marker::classify(Some("python_version < \"3\"")),
            Marker::PythonVersion {
                op: VersionOp::Lt,
                version: "3".to_string()
            }
        );
        assert_eq!(
            Marker::classify(Some("python_version >= '3.8'")),
            Marker::PythonVersion {
                op: VersionOp::Ge,
                version: "3.8".to_string()
            }
        );
    }

    #[test]
    fn test_classify_unsupported() {
        for marker in [
            "sys_platform == 'win32'",
            "extra == 'test' and python_version < '3.8'",
            "platform_python_implementation != \"PyPy\"",
        ] {
            assert_eq!(
                Marker::classify(Some(marker)),
                Marker::Unsupported(marker.to_string())
            );
        }
    }
}
