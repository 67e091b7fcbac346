//! Track-name sanitization

/// Name used when the user leaves the track name empty.
pub const FALLBACK_NAME: &str = "audio_temp";

/// Map free text to a filesystem-safe identifier.
///
/// Keeps ASCII alphanumerics, `-` and `_`; every other character becomes
/// `_`. Runs of `_` collapse to one and leading/trailing `_` are stripped,
/// so `"Sem  Limites!!"` becomes `"Sem_Limites"`.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let mapped = if c.is_ascii_alphanumeric() || c == '-' {
            c
        } else {
            '_'
        };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }
    out.trim_matches('_').to_string()
}

/// Sanitize a requested track name, falling back to [`FALLBACK_NAME`] when
/// nothing usable is left.
pub fn resolve_track_name(requested: &str) -> String {
    let name = sanitize_name(requested);
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Sem  Limites!!"), "Sem_Limites");
        assert_eq!(sanitize_name("Test Song"), "Test_Song");
        assert_eq!(sanitize_name("already_clean-1"), "already_clean-1");
        assert_eq!(sanitize_name("__lots___of__underscores__"), "lots_of_underscores");
        assert_eq!(sanitize_name("!!!"), "");
        assert_eq!(sanitize_name(""), "");
    }

    #[test]
    fn test_sanitize_output_charset() {
        // For any input the output stays in [A-Za-z0-9_-], with no repeated
        // underscores and none at the edges.
        for input in ["a b/c\\d:e", "áéíóú", "mix & match (live) [2019]", "..", "a__b"] {
            let clean = sanitize_name(input);
            assert!(
                clean.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "unexpected char in {clean:?}"
            );
            assert!(!clean.contains("__"), "repeated underscore in {clean:?}");
            assert!(!clean.starts_with('_') && !clean.ends_with('_'));
        }
    }

    #[test]
    fn test_resolve_track_name_fallback() {
        assert_eq!(resolve_track_name(""), FALLBACK_NAME);
        assert_eq!(resolve_track_name("???"), FALLBACK_NAME);
        assert_eq!(resolve_track_name("My Song"), "My_Song");
    }
}
