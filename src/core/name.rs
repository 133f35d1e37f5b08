//! Project name canonicalization.
//!
//! PyPI project names are case-insensitive and treat `.`, `-` and `_` loosely.
//! Every lookup key in the resolver goes through [`normalize`]; the
//! separator-swapped variants are only used as fallbacks, so the scanned
//! tree's own separator choice is preserved at rest.

/// Canonicalize a project identifier into a comparable key.
///
/// Lower-cases the name and replaces `.` with `-`. Underscores are kept.
pub fn normalize(id: &str) -> String {
    id.trim().to_lowercase().replace('.', "-")
}

/// Package name for a project that is not packaged yet.
///
/// Like [`normalize`], but `_` also becomes `-`, so every separator spelling
/// of a project maps to the same package.
pub fn package_name(id: &str) -> String {
    normalize(id).replace('_', "-")
}

/// The key with `-` and `_` swapped in both directions.
///
/// Returns the `_`→`-` variant first, then the `-`→`_` variant. Variants equal
/// to the input are omitted.
pub fn separator_variants(key: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(2);
    for candidate in [key.replace('_', "-"), key.replace('-', "_")] {
        if candidate != key && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// Check that a string looks like a registry project name.
///
/// Names start and end with an alphanumeric character and contain only
/// alphanumerics, `.`, `-` and `_`.
pub fn is_valid_project_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) if first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric() => {
            bytes
                .iter()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Django"), "django");
        assert_eq!(normalize("zope.interface"), "zope-interface");
        assert_eq!(normalize("Foo_Bar"), "foo_bar");
        assert_eq!(normalize("  requests "), "requests");
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("typing_extensions"), "typing-extensions");
        assert_eq!(package_name("Typing.Extensions"), "typing-extensions");
        assert_eq!(package_name("typing-extensions"), "typing-extensions");
    }

    #[test]
    fn test_normalize_idempotent() {
        for name in ["Foo.Bar_baz", "ruamel.yaml.clib", "PyYAML", "a-b_c.d", ""] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_separator_variants() {
        assert_eq!(separator_variants("foo_bar"), vec!["foo-bar".to_string()]);
        assert_eq!(separator_variants("foo-bar"), vec!["foo_bar".to_string()]);
        assert_eq!(
            separator_variants("a-b_c"),
            vec!["a-b-c".to_string(), "a_b_c".to_string()]
        );
        assert!(separator_variants("numpy").is_empty());
    }

    #[test]
    fn test_valid_project_name() {
        assert!(is_valid_project_name("numpy"));
        assert!(is_valid_project_name("zope.interface"));
        assert!(is_valid_project_name("Foo_Bar-2"));
        assert!(!is_valid_project_name(""));
        assert!(!is_valid_project_name("-leading"));
        assert!(!is_valid_project_name("foo=="));
        assert!(!is_valid_project_name("foo bar"));
    }
}
