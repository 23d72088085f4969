//! Visibility gating: enabled flag, deny list, then allow list

use serde::{Deserialize, Serialize};

use super::PatternList;
use crate::config::WidgetConfig;
use crate::host::PageLocation;

/// What a deny-list entry is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DenyMatch {
    /// Exact full URL (`location.href`)
    #[default]
    Url,
    /// Exact path (`location.pathname`)
    Path,
    /// Either of the above
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideReason {
    Disabled,
    Denied,
    NotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden(HideReason),
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

fn clean_entry(entry: &str) -> &str {
    entry.trim().trim_matches(|c| c == '\'' || c == '"')
}

fn is_denied(deny_list: &[String], mode: DenyMatch, location: &PageLocation) -> bool {
    deny_list.iter().map(|e| clean_entry(e)).any(|entry| match mode {
        DenyMatch::Url => entry == location.href,
        DenyMatch::Path => entry == location.pathname,
        DenyMatch::Both => entry == location.href || entry == location.pathname,
    })
}

/// Decide whether a widget may mount at `location`.
///
/// Deny short-circuits before the allow list is consulted. An empty allow
/// list hides everywhere.
pub fn gate(config: &WidgetConfig, location: &PageLocation) -> Visibility {
    if !config.enabled {
        return Visibility::Hidden(HideReason::Disabled);
    }
    if is_denied(&config.deny_list, config.deny_match, location) {
        return Visibility::Hidden(HideReason::Denied);
    }
    if !PatternList::compile(&config.allow_list).matches(&location.pathname) {
        return Visibility::Hidden(HideReason::NotAllowed);
    }
    Visibility::Visible
}
