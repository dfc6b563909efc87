//! School name canonicalization for comparison.

/// Low-information tokens stripped wherever they occur as substrings.
/// Multi-word tokens must come before their constituent words so that
/// "high school" is removed whole rather than leaving a dangling "high".
const GENERIC_TOKENS: &[&str] = &[
    "senior high school",
    "high school",
    "school",
    "academy",
];

/// Canonicalize a school name: lowercase, strip generic tokens, collapse
/// whitespace. Computed as a fixpoint so the result is idempotent even when
/// stripping reassembles a token out of adjacent fragments.
pub fn normalize(name: &str) -> String {
    let mut current = collapse(&name.to_lowercase());
    loop {
        let mut next = current.clone();
        for token in GENERIC_TOKENS {
            next = next.replace(token, " ");
        }
        next = collapse(&next);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize("  Central  "), "central");
    }

    #[test]
    fn strips_multiword_token_before_single() {
        // "high school" stripped whole; no stray "high" left behind
        assert_eq!(normalize("Central High School"), "central");
        assert_eq!(normalize("Boulder Senior High School"), "boulder");
    }

    #[test]
    fn strips_tokens_mid_string() {
        assert_eq!(normalize("St. Mary Academy of the Hills"), "st. mary of the hills");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn all_generic_tokens_yield_empty() {
        assert_eq!(normalize("High School"), "");
        assert_eq!(normalize("school academy"), "");
    }

    #[test]
    fn idempotent() {
        for name in [
            "Central High School",
            "",
            "school",
            "Academy Academy",
            "  Mixed   Case  SCHOOL name ",
            "schoschool olhigh school",
        ] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once, "normalize not idempotent for {name:?}");
        }
    }
}
