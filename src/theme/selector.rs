//! Dark-mode probe
//!
//! A configured selector is one of:
//! - `attr=value` / `data-theme=dark`: attribute equality (quotes optional)
//! - `class=night` or `.night`: class membership
//! - `[data-dark]`, `[data-theme="dark"]`: bracketed forms of the above
//! - a bare token: class name OR presence-only attribute
//!
//! Without a selector, well-known class and attribute conventions are checked.

use crate::error::ThemeError;
use crate::host::RootSnapshot;

const DARK_CLASSES: &[&str] = &["dark", "theme-dark", "darkmode", "night-mode"];

const DARK_ATTRIBUTES: &[(&str, &str)] = &[
    ("data-theme", "dark"),
    ("data-mode", "dark"),
    ("data-color-scheme", "dark"),
    ("data-dark-mode", "true"),
];

/// Attribute names whose value is compared case-insensitively to `DARK_VALUES`
const COMMON_ATTRIBUTES: &[&str] = &["theme", "mode", "color-scheme", "color-mode", "data-theme"];

const DARK_VALUES: &[&str] = &["dark", "night", "black"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DarkSelector {
    Attribute { name: String, value: String },
    Class(String),
    Token(String),
}

fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '\'' || c == '"')
}

impl DarkSelector {
    /// Parse a configured selector. `Ok(None)` for blank input.
    pub fn parse(raw: &str) -> Result<Option<Self>, ThemeError> {
        let mut s = raw.trim();
        if s.starts_with('[') && s.ends_with(']') && s.len() >= 2 {
            s = s[1..s.len() - 1].trim();
        }
        if s.is_empty() {
            return Ok(None);
        }

        if let Some((name, value)) = s.split_once('=') {
            let name = name.trim();
            let value = strip_quotes(value);
            if name.is_empty() {
                return Err(ThemeError::EmptyAttribute(raw.to_string()));
            }
            if name.eq_ignore_ascii_case("class") {
                return Ok(Some(DarkSelector::Class(value.to_string())));
            }
            return Ok(Some(DarkSelector::Attribute {
                name: name.to_ascii_lowercase(),
                value: value.to_string(),
            }));
        }

        if let Some(class) = s.strip_prefix('.') {
            return Ok(Some(DarkSelector::Class(class.trim().to_string())));
        }

        Ok(Some(DarkSelector::Token(s.to_string())))
    }

    pub fn matches(&self, root: &RootSnapshot) -> bool {
        match self {
            DarkSelector::Attribute { name, value } => root.attribute(name) == Some(value.as_str()),
            DarkSelector::Class(class) => root.has_class(class),
            DarkSelector::Token(token) => root.has_class(token) || root.has_attribute(token),
        }
    }

    /// Attribute the selector depends on, besides `class`
    pub fn watched_attribute(&self) -> Option<&str> {
        match self {
            DarkSelector::Attribute { name, .. } => Some(name),
            DarkSelector::Token(token) => Some(token),
            DarkSelector::Class(_) => None,
        }
    }
}

/// Convention-based detection used when no selector is configured
pub fn heuristic_dark(root: &RootSnapshot) -> bool {
    if DARK_CLASSES.iter().any(|c| root.has_class(c)) {
        return true;
    }
    if DARK_ATTRIBUTES
        .iter()
        .any(|(name, value)| root.attribute(name) == Some(*value))
    {
        return true;
    }
    COMMON_ATTRIBUTES.iter().any(|name| {
        root.attribute(name).is_some_and(|v| {
            let v = v.trim();
            DARK_VALUES.iter().any(|dark| v.eq_ignore_ascii_case(dark))
        })
    })
}

/// Attribute names the heuristic reads
pub fn heuristic_attributes() -> Vec<String> {
    let mut names: Vec<String> = std::iter::once("class")
        .chain(DARK_ATTRIBUTES.iter().map(|(n, _)| *n))
        .chain(COMMON_ATTRIBUTES.iter().copied())
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Is the page dark? A selector that fails to parse reads as not dark.
pub fn is_dark(selector: Option<&str>, root: &RootSnapshot) -> bool {
    match selector.map(DarkSelector::parse) {
        None | Some(Ok(None)) => heuristic_dark(root),
        Some(Ok(Some(sel))) => sel.matches(root),
        Some(Err(err)) => {
            log::warn!("{}; treating page as light", err);
            false
        }
    }
}
