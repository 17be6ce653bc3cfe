/// Shared text-normalisation helpers
///
/// Turn a human-readable label into a path-safe slug
///
/// Labels from the spreadsheet ("Resc Bahamas, The Est", "Age 15-24") become
/// lowercase identifiers usable in URIs and code lists. ASCII alphanumerics
/// and `/` survive; every other run of characters collapses to a single `-`.
/// A `/` inside a label is kept so that slash-separated country pairs remain
/// recognisable for the `-/-` join applied during country recoding.
///
/// # Examples
///
/// ```
/// use ips_tidy::utils::pathify;
///
/// assert_eq!(pathify("Inflow"), "inflow");
/// assert_eq!(pathify("Resc Bahamas, The Est"), "resc-bahamas-the-est");
/// assert_eq!(pathify("Serbia / Montenegro"), "serbia-/-montenegro");
/// assert_eq!(pathify("  Age 15-24 "), "age-15-24");
/// ```
pub fn pathify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_hyphen = false;

    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '/' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pathify_lowercases() {
        assert_eq!(pathify("Inflow"), "inflow");
    }

    #[test]
    fn test_pathify_collapses_punctuation_runs() {
        assert_eq!(pathify("Bahamas, The"), "bahamas-the");
    }

    #[test]
    fn test_pathify_keeps_slash() {
        assert_eq!(pathify("Serbia / Montenegro"), "serbia-/-montenegro");
    }

    #[test]
    fn test_pathify_keeps_digits_and_internal_hyphen() {
        assert_eq!(pathify("Age 15-24"), "age-15-24");
    }

    #[test]
    fn test_pathify_trims_outer_separators() {
        assert_eq!(pathify("  Non-British  "), "non-british");
        assert_eq!(pathify("(Other)"), "other");
    }

    #[test]
    fn test_pathify_empty() {
        assert_eq!(pathify(""), "");
        assert_eq!(pathify("   "), "");
    }
}
