//! Person-name splitting and organization detection for contact records.

/// Corporate designators that mark an account name as an organization.
///
/// Compared case-insensitively against each word of the name, with dots
/// removed so that `L.L.C.` and `Inc.` match as well.
const CORPORATE_SUFFIXES: &[&str] = &[
    "LLC",
    "LLP",
    "PLLC",
    "LP",
    "INC",
    "INCORPORATED",
    "CORP",
    "CORPORATION",
    "CO",
    "COMPANY",
    "LTD",
    "LIMITED",
    "BANK",
    "TRUST",
    "GROUP",
    "HOLDINGS",
    "PARTNERS",
    "ASSOCIATES",
    "FOUNDATION",
];

/// Split a combined display name into `(first_name, last_name)`.
///
/// - no tokens: both empty
/// - one token: the token is the first name, last name is empty
/// - several tokens: the last token is the last name, the rest joined by a
///   single space is the first name
pub fn split_display_name(display_name: &str) -> (String, String) {
    let tokens: Vec<&str> = display_name.split_whitespace().collect();
    match tokens.as_slice() {
        [] => (String::new(), String::new()),
        [only] => ((*only).to_string(), String::new()),
        [rest @ .., last] => (rest.join(" "), (*last).to_string()),
    }
}

fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '.')
        .replace('.', "")
        .to_ascii_uppercase()
}

/// True when any word of `name` is a corporate designator.
pub fn has_corporate_suffix(name: &str) -> bool {
    name.split(|c: char| c.is_whitespace() || c == ',')
        .map(normalize_word)
        .filter(|word| !word.is_empty())
        .any(|word| CORPORATE_SUFFIXES.contains(&word.as_str()))
}

/// Classify an account display name as an organization.
///
/// A name with no whitespace (a single word such as `Acme`) or one carrying a
/// corporate designator is an organization; anything else is a person.
pub fn is_organization_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return false;
    }
    !trimmed.contains(char::is_whitespace) || has_corporate_suffix(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_single_and_multi_token_names() {
        assert_eq!(split_display_name("Cher"), ("Cher".into(), "".into()));
        assert_eq!(
            split_display_name("John Smith"),
            ("John".into(), "Smith".into())
        );
        assert_eq!(
            split_display_name("  Mary  Ann   van Dyke "),
            ("Mary Ann van".into(), "Dyke".into())
        );
        assert_eq!(split_display_name("   "), ("".into(), "".into()));
    }

    #[test]
    fn classifies_organizations() {
        assert!(is_organization_name("Acme LLC"));
        assert!(is_organization_name("Acme"));
        assert!(is_organization_name("Smith, Inc."));
        assert!(is_organization_name("First National Bank"));
        assert!(is_organization_name("Widgets L.L.C."));
        assert!(is_organization_name("acme holdings"));
    }

    #[test]
    fn classifies_individuals() {
        assert!(!is_organization_name("John Smith"));
        assert!(!is_organization_name("Jane Trustworthy"));
        assert!(!is_organization_name(""));
    }
}
