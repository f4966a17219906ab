//! Field-name conversion between the wire convention (camelCase) and the
//! internal convention (snake_case).
//!
//! Both functions are total over ASCII identifiers. Empty input yields empty
//! output, and empty `_` segments contribute nothing to the camelCase form.

/// Converts a camelCase (or PascalCase) name into snake_case.
///
/// An `_` is inserted before every upper-case letter except the first
/// character, and the letter is lowered. Names that are already snake_case
/// come back unchanged.
#[must_use]
pub fn to_snake(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);

    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 && !result.ends_with('_') {
                result.push('_');
            }
            result.push(ch.to_ascii_lowercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// Converts a snake_case name into camelCase.
///
/// The first non-empty fragment has its first character lowered; every
/// following fragment has its first character raised. The remainder of each
/// fragment is kept as is, so camelCase input comes back unchanged.
#[must_use]
pub fn to_camel(name: &str) -> String {
    let mut result = String::with_capacity(name.len());

    for (i, word) in name.split('_').filter(|w| !w.is_empty()).enumerate() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                result.push(first.to_ascii_lowercase());
            } else {
                result.push(first.to_ascii_uppercase());
            }
            result.push_str(chars.as_str());
        }
    }

    result
}

/// Returns `true` if the name is reserved for introspection (`__typename`,
/// `__schema`, ...).
#[must_use]
pub fn is_introspection(name: &str) -> bool {
    name.starts_with("__")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn converts_between_conventions() {
        assert_eq!(to_snake("displayName"), "display_name");
        assert_eq!(to_camel("display_name"), "displayName");
    }

    #[test]
    fn leaves_names_in_target_convention_as_is() {
        assert_eq!(to_snake("display_name"), "display_name");
        assert_eq!(to_camel("displayName"), "displayName");
        assert_eq!(to_snake("id"), "id");
        assert_eq!(to_camel("id"), "id");
    }

    #[test]
    fn pascal_case_lowers_leading_character() {
        assert_eq!(to_snake("DisplayName"), "display_name");
        assert_eq!(to_snake("GetDummies"), "get_dummies");
    }

    #[test]
    fn camel_lowers_only_first_character_of_first_fragment() {
        assert_eq!(to_camel("Display_name"), "displayName");
        assert_eq!(to_camel("raise_exception"), "raiseException");
    }

    #[test]
    fn empty_and_underscore_edge_cases() {
        assert_eq!(to_snake(""), "");
        assert_eq!(to_camel(""), "");
        assert_eq!(to_camel("_"), "");
        assert_eq!(to_camel("__leading"), "leading");
        assert_eq!(to_camel("trailing_"), "trailing");
        assert_eq!(to_camel("double__under"), "doubleUnder");
        assert_eq!(to_snake("already_Mixed"), "already_mixed");
    }

    #[test]
    fn detects_introspection_names() {
        assert!(is_introspection("__typename"));
        assert!(!is_introspection("_private"));
        assert!(!is_introspection("name"));
    }

    fn camel_identifier() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,6}([A-Z][a-z0-9]{1,6}){0,4}"
    }

    proptest! {
        #[test]
        fn camel_snake_round_trip(name in camel_identifier()) {
            prop_assert_eq!(to_camel(&to_snake(&name)), name);
        }

        #[test]
        fn snake_output_has_no_upper_case(name in camel_identifier()) {
            let snake = to_snake(&name);
            prop_assert!(!snake.chars().any(|c| c.is_ascii_uppercase()));
        }
    }
}
