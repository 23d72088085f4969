//! Static description of the widget markup handed to the host for insertion

use crate::config::WidgetConfig;
use crate::theme::style::ROOT_CLASS;

pub const TITLE_CLASS: &str = "summary-title";
pub const ICON_CLASS: &str = "summary-title-icon";
pub const TITLE_TEXT_CLASS: &str = "summary-title-text";
pub const TAG_CLASS: &str = "summary-tag";
pub const EXPLANATION_CLASS: &str = "summary-explanation";
pub const TEXT_CLASS: &str = "summary-text";
pub const CURSOR_CLASS: &str = "summary-cursor";

/// ```text
/// div.post-summary
/// ├── div.summary-title
/// │   ├── img.summary-title-icon
/// │   ├── span.summary-title-text   (title)
/// │   └── span.summary-tag          (source label)
/// └── div.summary-explanation
///     └── p.summary-text            (typewriter surface)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFragment {
    pub root_class: String,
    pub icon: String,
    pub title: String,
    pub source_label: String,
}

impl WidgetFragment {
    pub fn from_config(config: &WidgetConfig) -> Self {
        let mut root_class = ROOT_CLASS.to_string();
        if let Some(width) = config.width_class.as_deref() {
            let width = width.trim().trim_start_matches('.');
            if !width.is_empty() {
                root_class.push(' ');
                root_class.push_str(width);
            }
        }
        Self {
            root_class,
            icon: config.icon.clone(),
            title: config.title.clone(),
            source_label: config.gpt_name.clone(),
        }
    }
}
