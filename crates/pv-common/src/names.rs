//! Cell type and signature name handling.
//!
//! Upstream artifacts spell the same cell type several ways
//! (`CD8_T_effector`, `cd8 t-effector`, ...). Matching goes through
//! [`canonical_key`]; display keeps whatever spelling the data used.

use regex::Regex;
use std::sync::OnceLock;

/// Separator between cell type and signature in a feature key.
pub const FEATURE_SEPARATOR: &str = "||";

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Literal pattern; compiled by every test that calls `canonical_key`.
    RE.get_or_init(|| Regex::new(r"[\s_\-]+").expect("static regex"))
}

/// Case- and separator-insensitive matching key.
pub fn canonical_key(name: &str) -> String {
    separator_re()
        .replace_all(name.trim(), " ")
        .trim()
        .to_uppercase()
}

/// True when two names refer to the same cell type or signature.
pub fn same_name(a: &str, b: &str) -> bool {
    canonical_key(a) == canonical_key(b)
}

/// Build a `"CellType||Signature"` feature key.
pub fn feature_key(cell_type: &str, signature: &str) -> String {
    format!("{}{}{}", cell_type, FEATURE_SEPARATOR, signature)
}

/// Canonical form of a feature key, for set membership.
pub fn canonical_feature(cell_type: &str, signature: &str) -> String {
    feature_key(&canonical_key(cell_type), &canonical_key(signature))
}

/// Split a feature into `(cell_type, signature)`.
///
/// A feature without the separator is returned whole as the first element.
pub fn split_feature(feature: &str) -> (&str, Option<&str>) {
    match feature.split_once(FEATURE_SEPARATOR) {
        Some((cell, sig)) => (cell.trim(), Some(sig.trim())),
        None => (feature.trim(), None),
    }
}

/// Display form of a signature name.
///
/// Drops a trailing `_Signature`/`_signature`, turns underscores into spaces
/// and truncates to `max_len` characters with a `...` suffix.
pub fn format_signature_name(name: &str, max_len: usize) -> String {
    let trimmed = name
        .trim()
        .trim_end_matches("_Signature")
        .trim_end_matches("_signature");
    let display = trimmed.replace('_', " ");

    if display.chars().count() > max_len && max_len > 3 {
        let kept: String = display.chars().take(max_len - 3).collect();
        format!("{}...", kept.trim_end())
    } else {
        display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key_collapses_separators() {
        assert_eq!(canonical_key("cd8_t-effector"), "CD8 T EFFECTOR");
        assert_eq!(canonical_key("  CD8  T_effector "), "CD8 T EFFECTOR");
        assert!(same_name("Monocyte_classical", "monocyte classical"));
        assert!(!same_name("Monocyte", "Monocytes"));
    }

    #[test]
    fn test_separator_pattern_compiles() {
        let re = separator_re();
        assert!(re.is_match("a_b"));
        assert!(!re.is_match("ab"));
    }

    #[test]
    fn test_feature_round_trip() {
        let key = feature_key("TAM", "Glycolysis");
        assert_eq!(key, "TAM||Glycolysis");
        assert_eq!(split_feature(&key), ("TAM", Some("Glycolysis")));
        assert_eq!(split_feature("Fibroblasts"), ("Fibroblasts", None));
        assert_eq!(canonical_feature("tam", "glycolysis"), "TAM||GLYCOLYSIS");
    }

    #[test]
    fn test_format_signature_name() {
        assert_eq!(
            format_signature_name("Fatty_Acid_Oxidation_Signature", 40),
            "Fatty Acid Oxidation"
        );
        assert_eq!(format_signature_name("OXPHOS", 40), "OXPHOS");
        let long = format_signature_name("A_very_long_signature_name_that_goes_on", 12);
        assert!(long.ends_with("..."));
        assert!(long.chars().count() <= 12);
    }
}
