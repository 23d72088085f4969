//! Theme application: one root class, plus scoped variables for `custom`

use std::collections::BTreeMap;

use super::ThemeName;

/// Class always present on the widget root
pub const ROOT_CLASS: &str = "post-summary";

/// Custom-theme token → CSS variable set on the widget root
pub const CUSTOM_VARIABLES: &[(&str, &str)] = &[
    ("background", "--summary-bg"),
    ("accent", "--summary-accent"),
    ("border", "--summary-border"),
    ("shadow", "--summary-shadow"),
    ("fontSize", "--summary-font-size"),
    ("cursorColor", "--summary-cursor"),
];

/// Visual state to push onto a mounted widget root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeStyle {
    pub theme: ThemeName,
    /// Full `class` attribute value for the root
    pub class_name: String,
    /// Variables to set; every other known variable is cleared
    pub variables: Vec<(String, String)>,
}

impl ThemeStyle {
    pub fn for_theme(
        theme: ThemeName,
        custom_tokens: &BTreeMap<String, String>,
        width_class: Option<&str>,
    ) -> Self {
        let mut class_name = format!("{} summary-theme-{}", ROOT_CLASS, theme.as_str());
        if let Some(extra) = width_class.map(|w| w.trim().trim_start_matches('.')) {
            if !extra.is_empty() {
                class_name.push(' ');
                class_name.push_str(extra);
            }
        }

        let variables = if theme == ThemeName::Custom {
            CUSTOM_VARIABLES
                .iter()
                .filter_map(|(token, var)| {
                    custom_tokens
                        .get(*token)
                        .map(|v| v.trim())
                        .filter(|v| !v.is_empty())
                        .map(|v| (var.to_string(), v.to_string()))
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            theme,
            class_name,
            variables,
        }
    }

    /// All variable names a custom theme may set (for clearing)
    pub fn known_variables() -> impl Iterator<Item = &'static str> {
        CUSTOM_VARIABLES.iter().map(|(_, var)| *var)
    }
}
