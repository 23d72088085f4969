//! Widget configuration
//!
//! `WidgetConfig` is the fully resolved shape. `PartialWidgetConfig` is one
//! layer (remote, scraped, caller override); every field is optional and
//! parsed on its own, so one malformed value never discards its siblings.

pub mod resolver;
pub mod scrape;

pub use resolver::{resolve, ConfigResolver};
pub use scrape::{scrape_html, scrape_scripts};

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::host::ThemeRoot;
use crate::pattern::DenyMatch;
use crate::theme::ThemeName;

// =============================================================================
// WidgetConfig
// =============================================================================

/// Resolved widget configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub enabled: bool,
    /// Glob-like path patterns; empty shows nowhere
    pub allow_list: Vec<String>,
    /// Exact URLs (or paths, see `deny_match`)
    pub deny_list: Vec<String>,
    pub deny_match: DenyMatch,
    pub icon: String,
    pub title: String,
    /// Source label shown in the header tag
    pub gpt_name: String,
    /// Milliseconds per revealed character
    pub type_speed: u32,
    /// Extra random delay per character, `0..=type_jitter` ms
    pub type_jitter: u32,
    pub dark_selector: Option<String>,
    pub theme_root: ThemeRoot,
    pub theme_name: ThemeName,
    pub custom_theme: BTreeMap<String, String>,
    /// Selector of the mount point
    pub target: String,
    pub typewriter_enabled: bool,
    /// Extra class on the widget root (from a `.class` width setting)
    pub width_class: Option<String>,
    pub summary_text: Option<String>,
    pub content_endpoint: Option<String>,
    pub locale: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_list: vec!["/archives/*".to_string()],
            deny_list: Vec::new(),
            deny_match: DenyMatch::Url,
            icon: "./icon.svg".to_string(),
            title: "文章摘要".to_string(),
            gpt_name: "SummaryGPT".to_string(),
            type_speed: 50,
            type_jitter: 50,
            dark_selector: None,
            theme_root: ThemeRoot::Html,
            theme_name: ThemeName::Default,
            custom_theme: BTreeMap::new(),
            target: "#article".to_string(),
            typewriter_enabled: true,
            width_class: None,
            summary_text: None,
            content_endpoint: None,
            locale: "zh-CN".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Enforce cross-field invariants after merging
    pub fn normalized(mut self) -> Self {
        if self.theme_name == ThemeName::Custom && self.custom_theme.is_empty() {
            log::warn!("themeName `custom` without customTheme tokens; using default theme");
            self.theme_name = ThemeName::Default;
        }
        self
    }
}

// =============================================================================
// PartialWidgetConfig
// =============================================================================

/// One configuration layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialWidgetConfig {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub allow_list: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub deny_list: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub deny_match: Option<DenyMatch>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gpt_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub type_speed: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub type_jitter: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dark_selector: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub theme_root: Option<ThemeRoot>,
    #[serde(default, deserialize_with = "lenient_theme_name")]
    pub theme_name: Option<ThemeName>,
    #[serde(default, deserialize_with = "lenient_tokens")]
    pub custom_theme: Option<BTreeMap<String, String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub typewriter_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_width")]
    pub width_class: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content_endpoint: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub locale: Option<String>,
}

impl PartialWidgetConfig {
    /// Parse a JSON object layer. Only a non-object document is an error.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::Parse("expected a JSON object".to_string()));
        }
        serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write every present field onto `config`
    pub fn apply_to(&self, config: &mut WidgetConfig) {
        if let Some(v) = self.enabled {
            config.enabled = v;
        }
        if let Some(v) = &self.allow_list {
            config.allow_list = v.clone();
        }
        if let Some(v) = &self.deny_list {
            config.deny_list = v.clone();
        }
        if let Some(v) = self.deny_match {
            config.deny_match = v;
        }
        if let Some(v) = &self.icon {
            config.icon = v.clone();
        }
        if let Some(v) = &self.title {
            config.title = v.clone();
        }
        if let Some(v) = &self.gpt_name {
            config.gpt_name = v.clone();
        }
        if let Some(v) = self.type_speed {
            config.type_speed = v;
        }
        if let Some(v) = self.type_jitter {
            config.type_jitter = v;
        }
        if let Some(v) = &self.dark_selector {
            config.dark_selector = Some(v.clone());
        }
        if let Some(v) = self.theme_root {
            config.theme_root = v;
        }
        if let Some(v) = self.theme_name {
            config.theme_name = v;
        }
        if let Some(v) = &self.custom_theme {
            config.custom_theme = v.clone();
        }
        if let Some(v) = &self.target {
            config.target = v.clone();
        }
        if let Some(v) = self.typewriter_enabled {
            config.typewriter_enabled = v;
        }
        if let Some(v) = &self.width_class {
            config.width_class = Some(v.clone());
        }
        if let Some(v) = &self.summary_text {
            config.summary_text = Some(v.clone());
        }
        if let Some(v) = &self.content_endpoint {
            config.content_endpoint = Some(v.clone());
        }
        if let Some(v) = &self.locale {
            config.locale = v.clone();
        }
    }

    /// Overlay `other` on top of this layer (present fields win)
    pub fn overlay(&mut self, other: &PartialWidgetConfig) {
        fn take<T: Clone>(slot: &mut Option<T>, from: &Option<T>) {
            if from.is_some() {
                slot.clone_from(from);
            }
        }
        take(&mut self.enabled, &other.enabled);
        take(&mut self.allow_list, &other.allow_list);
        take(&mut self.deny_list, &other.deny_list);
        take(&mut self.deny_match, &other.deny_match);
        take(&mut self.icon, &other.icon);
        take(&mut self.title, &other.title);
        take(&mut self.gpt_name, &other.gpt_name);
        take(&mut self.type_speed, &other.type_speed);
        take(&mut self.type_jitter, &other.type_jitter);
        take(&mut self.dark_selector, &other.dark_selector);
        take(&mut self.theme_root, &other.theme_root);
        take(&mut self.theme_name, &other.theme_name);
        take(&mut self.custom_theme, &other.custom_theme);
        take(&mut self.target, &other.target);
        take(&mut self.typewriter_enabled, &other.typewriter_enabled);
        take(&mut self.width_class, &other.width_class);
        take(&mut self.summary_text, &other.summary_text);
        take(&mut self.content_endpoint, &other.content_endpoint);
        take(&mut self.locale, &other.locale);
    }
}

// =============================================================================
// Lenient field parsers
// =============================================================================

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "null" {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        _ => None,
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

/// Arrays of strings, or one string split on newlines/commas
fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(s) => Some(
            s.split(['\n', ','])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    })
}

fn lenient_theme_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ThemeName>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(ThemeName::parse))
}

/// Width setting: only a `.class` value survives; numbers and percentages
/// are left to the stylesheet.
fn lenient_width<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .map(|s| s.trim().trim_matches(|c| c == '\'' || c == '"'))
        .and_then(|s| s.strip_prefix('.'))
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}

fn lenient_tokens<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, String>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(parse_custom_theme(&other)),
    })
}

/// Accept a mapping or its JSON-serialized form. Anything unreadable is an
/// empty mapping.
pub fn parse_custom_theme(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((k.clone(), v))
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => match serde_json::from_str::<Value>(s) {
            Ok(inner @ Value::Object(_)) => parse_custom_theme(&inner),
            Ok(_) | Err(_) => {
                log::warn!("customTheme is not a JSON object; ignoring");
                BTreeMap::new()
            }
        },
        _ => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_parses_known_fields() {
        let p = PartialWidgetConfig::from_json(
            r#"{"enabled": false, "title": "Summary", "typeSpeed": 30, "themeName": "blue"}"#,
        )
        .unwrap();
        assert_eq!(p.enabled, Some(false));
        assert_eq!(p.title.as_deref(), Some("Summary"));
        assert_eq!(p.type_speed, Some(30));
        assert_eq!(p.theme_name, Some(ThemeName::Blue));
        assert_eq!(p.icon, None);
    }

    #[test]
    fn test_malformed_field_is_skipped_not_fatal() {
        let p = PartialWidgetConfig::from_value(json!({
            "enabled": {"nested": true},
            "typeSpeed": "fast",
            "title": "Kept",
            "denyMatch": "sideways",
            "themeName": "purple"
        }))
        .unwrap();
        assert_eq!(p.enabled, None);
        assert_eq!(p.type_speed, None);
        assert_eq!(p.deny_match, None);
        assert_eq!(p.theme_name, None);
        assert_eq!(p.title.as_deref(), Some("Kept"));
    }

    #[test]
    fn test_string_forms_are_accepted() {
        let p = PartialWidgetConfig::from_value(json!({
            "enabled": "true",
            "typeSpeed": " 25 ",
            "allowList": "/post/*\n/notes/*, /misc",
            "denyList": ["https://a/x", "", 3]
        }))
        .unwrap();
        assert_eq!(p.enabled, Some(true));
        assert_eq!(p.type_speed, Some(25));
        assert_eq!(
            p.allow_list,
            Some(vec!["/post/*".to_string(), "/notes/*".to_string(), "/misc".to_string()])
        );
        assert_eq!(p.deny_list, Some(vec!["https://a/x".to_string()]));
    }

    #[test]
    fn test_blank_theme_name_keeps_lower_layer() {
        let mut layer = PartialWidgetConfig::from_value(json!({ "themeName": "green" })).unwrap();
        let blank = PartialWidgetConfig::from_value(json!({ "themeName": "  " })).unwrap();
        assert_eq!(blank.theme_name, None);
        layer.overlay(&blank);
        assert_eq!(layer.theme_name, Some(ThemeName::Green));
    }

    #[test]
    fn test_custom_theme_as_mapping_or_string() {
        let p = PartialWidgetConfig::from_value(json!({
            "customTheme": {"background": "#000", "fontSize": 14}
        }))
        .unwrap();
        let tokens = p.custom_theme.unwrap();
        assert_eq!(tokens.get("background").map(String::as_str), Some("#000"));
        assert_eq!(tokens.get("fontSize").map(String::as_str), Some("14"));

        let p = PartialWidgetConfig::from_value(json!({
            "customTheme": "{\"accent\": \"red\"}"
        }))
        .unwrap();
        assert_eq!(p.custom_theme.unwrap().get("accent").map(String::as_str), Some("red"));
    }

    #[test]
    fn test_custom_theme_garbage_is_empty_mapping() {
        let p = PartialWidgetConfig::from_value(json!({ "customTheme": "{not json" })).unwrap();
        assert_eq!(p.custom_theme, Some(BTreeMap::new()));
        let p = PartialWidgetConfig::from_value(json!({ "customTheme": [1, 2] })).unwrap();
        assert_eq!(p.custom_theme, Some(BTreeMap::new()));
    }

    #[test]
    fn test_width_only_keeps_class_values() {
        let p = PartialWidgetConfig::from_value(json!({ "widthClass": "'.narrow'" })).unwrap();
        assert_eq!(p.width_class.as_deref(), Some("narrow"));
        let p = PartialWidgetConfig::from_value(json!({ "widthClass": "720" })).unwrap();
        assert_eq!(p.width_class, None);
    }

    #[test]
    fn test_non_object_is_parse_error() {
        assert!(matches!(PartialWidgetConfig::from_json("[1]"), Err(ConfigError::Parse(_))));
        assert!(matches!(PartialWidgetConfig::from_json("{oops"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let p = PartialWidgetConfig::from_value(json!({ "title": "  ", "darkSelector": "" })).unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn test_overlay_prefers_present_fields() {
        let mut base = PartialWidgetConfig {
            title: Some("A".into()),
            type_speed: Some(10),
            ..Default::default()
        };
        let top = PartialWidgetConfig {
            title: Some("B".into()),
            ..Default::default()
        };
        base.overlay(&top);
        assert_eq!(base.title.as_deref(), Some("B"));
        assert_eq!(base.type_speed, Some(10));
    }

    #[test]
    fn test_custom_without_tokens_normalizes_to_default() {
        let cfg = WidgetConfig {
            theme_name: ThemeName::Custom,
            ..WidgetConfig::default()
        }
        .normalized();
        assert_eq!(cfg.theme_name, ThemeName::Default);
    }
}
