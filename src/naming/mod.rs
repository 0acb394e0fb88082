//! Identifier normalisation.
//!
//! Raw table and column names become three spellings:
//!
//! | form        | `user_id` | `blog_urls` |
//! |-------------|-----------|-------------|
//! | word case   | `UserID`  | `BlogUrls`  |
//! | lower camel | `userID`  | `blogUrls`  |
//! | snake       | `user_id` | `blog_urls` |
//!
//! Word case runs `convert_case` and then upper-cases a trailing acronym.

mod inflect;

pub use inflect::Inflector;

use std::sync::LazyLock;

use convert_case::{Boundary, Case, Casing};

/// Go common initialisms.
pub const ACRONYMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

static SHARED: LazyLock<Naming> = LazyLock::new(Naming::new);

/// Acronym table plus pluraliser. Immutable once built.
#[derive(Debug)]
pub struct Naming {
    /// `(capitalized, upper)`, longest first.
    acronyms: Vec<(String, &'static str)>,
    inflector: Inflector,
}

impl Default for Naming {
    fn default() -> Self {
        Self::new()
    }
}

impl Naming {
    pub fn new() -> Self {
        let mut acronyms: Vec<(String, &'static str)> = ACRONYMS
            .iter()
            .map(|upper| (capitalized(upper), *upper))
            .collect();
        acronyms.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self {
            acronyms,
            inflector: Inflector::new(),
        }
    }

    /// The process-wide instance.
    pub fn shared() -> &'static Naming {
        &SHARED
    }

    /// `user_id` → `UserID`, `_id` → `ID`.
    pub fn word_case(&self, raw: &str) -> String {
        let base = raw.to_case(Case::Pascal);
        for (cap, upper) in &self.acronyms {
            if base == *cap {
                return upper.to_string();
            }
        }
        // Longest suffix wins; the table is sorted so the first hit is it.
        for (cap, upper) in &self.acronyms {
            if let Some(stem) = base.strip_suffix(cap.as_str()) {
                return format!("{stem}{upper}");
            }
        }
        base
    }

    /// `user_id` → `userID`, `ids` → `ids`.
    pub fn lower_camel(&self, raw: &str) -> String {
        self.lower_first(&self.word_case(raw))
    }

    /// `UserID` → `user_id`. Digits stay attached to their word (`utf8_name`).
    pub fn snake(&self, raw: &str) -> String {
        raw.remove_boundaries(&Boundary::digits())
            .to_case(Case::Snake)
            .trim_matches('_')
            .to_string()
    }

    pub fn plural(&self, word: &str) -> String {
        self.inflector.pluralize(word)
    }

    /// Word case plural. Only the suffix the pluraliser added is lower-cased,
    /// and a word whose plural is itself gets a literal `s`.
    pub fn word_case_plural(&self, raw: &str) -> String {
        let singular = self.word_case(raw);
        let plural = self.inflector.pluralize(&singular);
        if plural == singular {
            return format!("{singular}s");
        }
        match plural.strip_prefix(singular.as_str()) {
            Some(added) => format!("{singular}{}", added.to_lowercase()),
            None => plural,
        }
    }

    pub fn lower_camel_plural(&self, raw: &str) -> String {
        self.lower_first(&self.word_case_plural(raw))
    }

    /// Lower-case a word-cased identifier's first word. A leading acronym is
    /// lowered whole (`IDs` → `ids`, `URLPath` → `urlPath`).
    fn lower_first(&self, word: &str) -> String {
        for (_, upper) in &self.acronyms {
            if let Some(rest) = word.strip_prefix(upper) {
                if self.starts_word(rest) {
                    return format!("{}{rest}", upper.to_lowercase());
                }
            }
        }
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl Naming {
    /// Whether `rest` begins right after a word boundary: at the end, on a
    /// lower-case tail (`s` of `IDs`), a capitalised word or another acronym.
    fn starts_word(&self, rest: &str) -> bool {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (None, _) => true,
            (Some(c), _) if !c.is_uppercase() => true,
            (Some(_), Some(next)) if next.is_lowercase() => true,
            _ => self.acronyms.iter().any(|(_, upper)| {
                rest.strip_prefix(upper)
                    .is_some_and(|tail| tail.chars().next().is_none_or(|c| !c.is_lowercase()))
            }),
        }
    }
}

fn capitalized(upper: &str) -> String {
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn to_word_case(raw: &str) -> String {
    Naming::shared().word_case(raw)
}

pub fn to_lower_camel(raw: &str) -> String {
    Naming::shared().lower_camel(raw)
}

pub fn to_snake(raw: &str) -> String {
    Naming::shared().snake(raw)
}

pub fn to_word_case_plural(raw: &str) -> String {
    Naming::shared().word_case_plural(raw)
}
