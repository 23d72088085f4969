//! Tolerant extraction of config fields from inline page scripts
//!
//! Host themes embed something like
//! `const articleConfig = { enableSummary: true, content: { text: '...' } }`.
//! This is not parsed as JavaScript: each field has its own pattern and a
//! field that does not match is simply absent from the layer.

use std::sync::OnceLock;

use regex::Regex;

use super::PartialWidgetConfig;
use crate::theme::ThemeName;

/// Scripts without this marker are ignored
pub const CONFIG_MARKER: &str = "articleConfig";

struct ScrapePatterns {
    enabled: Regex,
    text: Regex,
    title: Regex,
    theme: Regex,
    dark_selector: Regex,
    inline_script: Regex,
}

fn patterns() -> &'static ScrapePatterns {
    static PATTERNS: OnceLock<ScrapePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ScrapePatterns {
        enabled: Regex::new(r"\benableSummary\s*:\s*(true|false)\b").unwrap(),
        text: Regex::new(r#"\btext\s*:\s*['"]([^'"]*)['"]"#).unwrap(),
        title: Regex::new(r#"\btitle\s*:\s*['"]([^'"]*)['"]"#).unwrap(),
        theme: Regex::new(r#"\btheme\s*:\s*['"]([^'"]*)['"]"#).unwrap(),
        dark_selector: Regex::new(r#"\bdarkModeSelector\s*:\s*['"]([^'"]*)['"]"#).unwrap(),
        inline_script: Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").unwrap(),
    })
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Scrape one script body
pub fn scrape_script(text: &str) -> PartialWidgetConfig {
    let p = patterns();
    PartialWidgetConfig {
        enabled: capture(&p.enabled, text).map(|v| v == "true"),
        summary_text: capture(&p.text, text).and_then(non_blank),
        title: capture(&p.title, text).and_then(non_blank),
        theme_name: capture(&p.theme, text).and_then(ThemeName::parse),
        dark_selector: capture(&p.dark_selector, text).and_then(non_blank),
        ..PartialWidgetConfig::default()
    }
}

/// Scrape every marked script; later scripts win field by field
pub fn scrape_scripts<I, S>(scripts: I) -> PartialWidgetConfig
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut layer = PartialWidgetConfig::default();
    for script in scripts {
        let script = script.as_ref();
        if script.contains(CONFIG_MARKER) {
            layer.overlay(&scrape_script(script));
        }
    }
    layer
}

/// Scrape the inline scripts of a full HTML document
pub fn scrape_html(html: &str) -> PartialWidgetConfig {
    let bodies = patterns()
        .inline_script
        .captures_iter(html)
        .filter(|c| {
            let attrs = c.get(1).map(|m| m.as_str().to_ascii_lowercase()).unwrap_or_default();
            !attrs.contains("src=")
        })
        .filter_map(|c| c.get(2).map(|m| m.as_str().to_string()))
        .collect::<Vec<_>>();
    scrape_scripts(bodies)
}
