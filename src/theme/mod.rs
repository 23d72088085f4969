//! ThemeResolver: picks the widget theme and keeps it in sync with the page
//!
//! Resolution precedence, highest first:
//! 1. dark probe matches → `dark`
//! 2. `custom` with at least one token → `custom`
//! 3. the configured theme
//! 4. `default`

pub mod selector;
pub mod style;
pub mod watcher;

pub use selector::{heuristic_dark, is_dark, DarkSelector};
pub use style::ThemeStyle;
pub use watcher::ThemeWatcher;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::WidgetConfig;
use crate::host::{RootSnapshot, ThemeRoot};

// =============================================================================
// ThemeName
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Default,
    Dark,
    Blue,
    Green,
    Custom,
}

impl ThemeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Default => "default",
            ThemeName::Dark => "dark",
            ThemeName::Blue => "blue",
            ThemeName::Green => "green",
            ThemeName::Custom => "custom",
        }
    }

    /// Lenient parse; unknown names are `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Some(ThemeName::Default),
            "dark" => Some(ThemeName::Dark),
            "blue" => Some(ThemeName::Blue),
            "green" => Some(ThemeName::Green),
            "custom" => Some(ThemeName::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply the precedence rules to an already-probed dark flag
pub fn resolve_theme_name(config: &WidgetConfig, dark: bool) -> ThemeName {
    resolve(config.theme_name, &config.custom_theme, dark)
}

fn resolve(configured: ThemeName, tokens: &BTreeMap<String, String>, dark: bool) -> ThemeName {
    if dark {
        return ThemeName::Dark;
    }
    match configured {
        ThemeName::Custom if tokens.is_empty() => ThemeName::Default,
        other => other,
    }
}

// =============================================================================
// ThemeResolver
// =============================================================================

/// Theme settings of one widget instance, detached from the rest of the config
#[derive(Debug, Clone)]
pub struct ThemeResolver {
    selector: Option<String>,
    root: ThemeRoot,
    configured: ThemeName,
    custom_tokens: BTreeMap<String, String>,
    width_class: Option<String>,
}

impl ThemeResolver {
    pub fn from_config(config: &WidgetConfig) -> Self {
        Self {
            selector: config.dark_selector.clone(),
            root: config.theme_root,
            configured: config.theme_name,
            custom_tokens: config.custom_theme.clone(),
            width_class: config.width_class.clone(),
        }
    }

    pub fn root(&self) -> ThemeRoot {
        self.root
    }

    pub fn is_dark(&self, snapshot: &RootSnapshot) -> bool {
        is_dark(self.selector.as_deref(), snapshot)
    }

    pub fn resolve(&self, snapshot: &RootSnapshot) -> ThemeName {
        resolve(self.configured, &self.custom_tokens, self.is_dark(snapshot))
    }

    pub fn style(&self, theme: ThemeName) -> ThemeStyle {
        ThemeStyle::for_theme(theme, &self.custom_tokens, self.width_class.as_deref())
    }

    /// Attribute names whose mutation can change the resolved theme
    pub fn watched_attributes(&self) -> Vec<String> {
        let parsed = self
            .selector
            .as_deref()
            .map(DarkSelector::parse)
            .and_then(Result::ok)
            .flatten();
        match parsed {
            Some(sel) => {
                let mut attrs = vec!["class".to_string()];
                if let Some(attr) = sel.watched_attribute() {
                    if attr != "class" {
                        attrs.push(attr.to_ascii_lowercase());
                    }
                }
                attrs
            }
            None => selector::heuristic_attributes(),
        }
    }
}
