//! City names derived from parcel `PLACENAME` values.

use std::collections::BTreeMap;

/// City for a parcel place name: the alias for the upper-cased name if
/// one is configured, otherwise the name in title case.
///
/// Returns `None` for a blank place name.
#[must_use]
pub fn from_place_name(place_name: &str, aliases: &BTreeMap<String, String>) -> Option<String> {
    let place_name = place_name.trim();
    if place_name.is_empty() {
        return None;
    }
    if let Some(alias) = aliases.get(&place_name.to_uppercase()) {
        return Some(alias.clone());
    }
    Some(title_case(place_name))
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases() -> BTreeMap<String, String> {
        BTreeMap::from([("CITY OF MEQUON".to_string(), "Mequon".to_string())])
    }

    #[test]
    fn uses_alias_table() {
        assert_eq!(
            from_place_name("City of Mequon", &aliases()).as_deref(),
            Some("Mequon")
        );
    }

    #[test]
    fn title_cases_unknown_names() {
        assert_eq!(
            from_place_name("  PORT   WASHINGTON ", &aliases()).as_deref(),
            Some("Port Washington")
        );
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(from_place_name("  ", &aliases()), None);
    }
}
