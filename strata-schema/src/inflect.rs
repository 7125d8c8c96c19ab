//! Name inflection for association names and foreign key columns.
//!
//! Association names are stored singular and lower-camel cased
//! (`"friend"`, `"homeAddress"`). List-valued associations attach under the
//! pluralized name (`"friends"`). Only the last camel-case segment of a name
//! is inflected, so `"homeEvents"` singularizes to `"homeEvent"`.

use convert_case::{Case, Casing};

/// Irregular (singular, plural) pairs.
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
];

/// Words that are the same in singular and plural.
const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
];

/// Convert a name to lower camel case (`"home_address"` -> `"homeAddress"`).
pub fn lower_camel(name: &str) -> String {
    name.to_case(Case::Camel)
}

/// Convert a name to pascal case (`"person"` -> `"Person"`).
pub fn pascal(name: &str) -> String {
    name.to_case(Case::Pascal)
}

/// Normalize a logical association name: lower camel case, singular.
///
/// ```rust
/// use strata_schema::inflect::normalize_name;
///
/// assert_eq!(normalize_name("Friends"), "friend");
/// assert_eq!(normalize_name("home_events"), "homeEvent");
/// assert_eq!(normalize_name("people"), "person");
/// ```
pub fn normalize_name(name: &str) -> String {
    singularize(&lower_camel(name))
}

/// Singularize the last segment of a camel-case name.
pub fn singularize(word: &str) -> String {
    let (head, segment) = split_last_segment(word);
    let lower = segment.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, plural)| *plural == lower) {
        return format!("{}{}", head, match_case(segment, singular));
    }

    let singular = if lower.len() > 3 && lower.ends_with("ies") {
        format!("{}y", &segment[..segment.len() - 3])
    } else if lower.ends_with("sses")
        || lower.ends_with("uses")
        || lower.ends_with("xes")
        || lower.ends_with("zes")
        || lower.ends_with("ches")
        || lower.ends_with("shes")
    {
        segment[..segment.len() - 2].to_string()
    } else if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        segment.to_string()
    } else if lower.len() > 1 && lower.ends_with('s') {
        segment[..segment.len() - 1].to_string()
    } else {
        segment.to_string()
    };

    format!("{}{}", head, singular)
}

/// Pluralize the last segment of a camel-case name.
pub fn pluralize(word: &str) -> String {
    let (head, segment) = split_last_segment(word);
    let lower = segment.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return format!("{}{}", head, match_case(segment, plural));
    }

    let plural = if lower.ends_with('y') && !ends_with_vowel_y(&lower) {
        format!("{}ies", &segment[..segment.len() - 1])
    } else if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{}es", segment)
    } else {
        format!("{}s", segment)
    };

    format!("{}{}", head, plural)
}

/// Foreign key column for an association.
///
/// `<name>Id` when the association name matches the target model name,
/// otherwise `<name><Target>Id` so that two associations to the same model
/// use distinct columns.
///
/// ```rust
/// use strata_schema::inflect::foreign_key;
///
/// assert_eq!(foreign_key("event", "Event"), "eventId");
/// assert_eq!(foreign_key("friend", "Person"), "friendPersonId");
/// ```
pub fn foreign_key(name: &str, target_model: &str) -> String {
    if lower_camel(name) == lower_camel(target_model) {
        format!("{}Id", lower_camel(name))
    } else {
        format!("{}{}Id", lower_camel(name), pascal(target_model))
    }
}

fn split_last_segment(word: &str) -> (&str, &str) {
    let idx = word
        .char_indices()
        .filter(|(i, c)| *i > 0 && c.is_uppercase())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);
    word.split_at(idx)
}

fn match_case(template: &str, word: &str) -> String {
    if template.chars().next().is_some_and(char::is_uppercase) {
        pascal(word)
    } else {
        word.to_string()
    }
}

fn ends_with_vowel_y(lower: &str) -> bool {
    let mut chars = lower.chars().rev();
    chars.next();
    matches!(chars.next(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}
