//! Token sanitizing for text spliced into Cypher.
//!
//! Cypher binds values as parameters but not labels or relationship types,
//! so any type name embedded in query text passes through [`sanitize`] first.

/// Remove every character outside `[A-Za-z0-9_]`.
pub fn sanitize(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_keeps_identifier_tokens() {
        assert_eq!(sanitize("KNOWS"), "KNOWS");
        assert_eq!(sanitize("DateEntry"), "DateEntry");
        assert_eq!(sanitize("PART_OF_EVENT"), "PART_OF_EVENT");
    }

    #[test]
    fn test_strips_injection_attempts() {
        assert_eq!(sanitize("KNOWS]->(x) DETACH DELETE x //"), "KNOWSxDETACHDELETEx");
        assert_eq!(sanitize("Character`:Admin"), "CharacterAdmin");
        assert_eq!(sanitize("date-entries"), "dateentries");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_strips_non_ascii_letters() {
        assert_eq!(sanitize("Łocation"), "ocation");
        assert_eq!(sanitize("ＫNOWS"), "NOWS");
    }

    fn is_subsequence(needle: &str, haystack: &str) -> bool {
        let mut rest = haystack.chars();
        needle.chars().all(|c| rest.any(|h| h == c))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn output_uses_identifier_alphabet_only(s in "\\PC*") {
            let out = sanitize(&s);
            prop_assert!(out.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }

        #[test]
        fn output_is_subsequence_of_input(s in "\\PC*") {
            let out = sanitize(&s);
            prop_assert!(is_subsequence(&out, &s));
        }

        #[test]
        fn identifier_tokens_pass_unchanged(s in "[A-Za-z0-9_]{0,64}") {
            prop_assert_eq!(sanitize(&s), s);
        }
    }
}
