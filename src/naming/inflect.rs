//! English pluralisation.
//!
//! The classic inflection rule set: uncountable words, a short list of
//! irregular nouns, then regular-expression suffix rules tried from the most
//! specific (last) to the catch-all (first).

use regex::Regex;

const PLURAL_RULES: &[(&str, &str)] = &[
    ("$", "s"),
    ("(?i)(s)$", "${1}"),
    ("(?i)^(ax|test)is$", "${1}es"),
    ("(?i)(octop|vir)us$", "${1}i"),
    ("(?i)(octop|vir)i$", "${1}i"),
    ("(?i)(alias|status|campus)$", "${1}es"),
    ("(?i)(bu)s$", "${1}ses"),
    ("(?i)(buffal|tomat)o$", "${1}oes"),
    ("(?i)([ti])um$", "${1}a"),
    ("(?i)([ti])a$", "${1}a"),
    ("(?i)sis$", "ses"),
    ("(?i)(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
    ("(?i)(hive)$", "${1}s"),
    ("(?i)([^aeiouy]|qu)y$", "${1}ies"),
    ("(?i)(x|ch|ss|sh)$", "${1}es"),
    ("(?i)(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
    ("(?i)^(m|l)ouse$", "${1}ice"),
    ("(?i)^(m|l)ice$", "${1}ice"),
    ("(?i)^(ox)$", "${1}en"),
    ("(?i)^(oxen)$", "${1}"),
    ("(?i)(quiz)$", "${1}zes"),
];

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("ox", "oxen"),
];

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
];

/// Compiled rule set.
#[derive(Debug)]
pub struct Inflector {
    rules: Vec<(Regex, &'static str)>,
}

impl Default for Inflector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inflector {
    pub fn new() -> Self {
        let rules = PLURAL_RULES
            .iter()
            .rev()
            .map(|(pattern, replacement)| {
                (
                    Regex::new(pattern).expect("built-in pluralisation rule"),
                    *replacement,
                )
            })
            .collect();
        Self { rules }
    }

    /// Plural of `word`, keeping the case of the part it leaves alone.
    pub fn pluralize(&self, word: &str) -> String {
        if word.is_empty() {
            return String::new();
        }
        let lower = word.to_ascii_lowercase();
        if UNCOUNTABLE
            .iter()
            .any(|u| lower == *u || word.ends_with(&capitalize(u)))
        {
            return word.to_string();
        }
        for (singular, plural) in IRREGULAR {
            let variants = [
                (singular.to_ascii_uppercase(), plural.to_ascii_uppercase()),
                (capitalize(singular), capitalize(plural)),
                (singular.to_string(), plural.to_string()),
            ];
            for (from, to) in variants {
                if let Some(stem) = word.strip_suffix(from.as_str()) {
                    // `Woman` but not `Human` losing its stem boundary.
                    if stem.is_empty() || from.starts_with(|c: char| c.is_uppercase()) {
                        return format!("{stem}{to}");
                    }
                }
            }
        }
        for (regex, replacement) in &self.rules {
            if regex.is_match(word) {
                return regex.replace(word, *replacement).into_owned();
            }
        }
        word.to_string()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
