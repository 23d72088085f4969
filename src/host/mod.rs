//! Host seams
//!
//! Everything the engine needs from the page goes through these traits so
//! the lifecycle, theme and render logic can run (and be tested) without a
//! document. The `browser` submodule implements them over `web-sys`.

pub mod browser;

use std::collections::BTreeMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::theme::ThemeStyle;
use crate::widget::WidgetFragment;

// =============================================================================
// Location
// =============================================================================

/// Current page address, split the way gating needs it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageLocation {
    /// Full URL including query and hash
    pub href: String,
    /// Path component only
    pub pathname: String,
}

impl PageLocation {
    pub fn new(href: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            pathname: pathname.into(),
        }
    }

    /// Derive the path from an absolute or root-relative URL
    pub fn from_href(href: &str) -> Self {
        let after_scheme = match href.find("://") {
            Some(idx) => {
                let rest = &href[idx + 3..];
                let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
                &rest[authority_end..]
            }
            None => href,
        };
        let end = after_scheme.find(['?', '#']).unwrap_or(after_scheme.len());
        let path = &after_scheme[..end];
        Self {
            href: href.to_string(),
            pathname: if path.is_empty() { "/".to_string() } else { path.to_string() },
        }
    }
}

// =============================================================================
// Root snapshots (theme probing)
// =============================================================================

/// Which element the theme probe inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeRoot {
    #[default]
    Html,
    Body,
}

/// Attribute state of a monitored root element
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootSnapshot {
    attributes: BTreeMap<String, String>,
}

impl RootSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_attributes<I, K, V>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            attributes: attrs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        let mut classes: Vec<&str> = self.classes().collect();
        if !classes.contains(&class) {
            classes.push(class);
        }
        let joined = classes.join(" ");
        self.set_attribute("class", &joined);
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(&name.to_ascii_lowercase());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(&name.to_ascii_lowercase())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// One attribute mutation on a monitored root
#[derive(Debug, Clone)]
pub struct AttributeChange {
    pub attribute: String,
    pub previous: RootSnapshot,
    pub current: RootSnapshot,
}

/// Revocable subscription handle. Revokes on drop as well.
pub struct Subscription {
    revoke: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(revoke: impl FnOnce() + 'static) -> Self {
        Self {
            revoke: Some(Box::new(revoke)),
        }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(revoke) = self.revoke.take() {
            revoke();
        }
    }

    pub fn is_active(&self) -> bool {
        self.revoke.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Attribute change notifier (a MutationObserver in the browser)
pub trait AttributeNotifier {
    /// Deliver changes of `attributes` on `root` until the subscription is revoked
    fn subscribe(
        &self,
        root: ThemeRoot,
        attributes: Vec<String>,
        callback: Box<dyn Fn(&AttributeChange)>,
    ) -> Subscription;
}

// =============================================================================
// Rendering surfaces
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Hidden,
    Blinking,
    FadingOut,
}

/// The text paragraph inside a mounted widget
pub trait TextSurface {
    fn set_text(&self, text: &str);
    fn set_cursor(&self, cursor: CursorState);
}

/// A widget fragment that has been inserted into the page
pub trait MountedWidget {
    fn surface(&self) -> Rc<dyn TextSurface>;
    fn apply_theme(&self, style: &ThemeStyle);
    fn remove(&self);
}

/// The host document
pub trait PageHost {
    fn location(&self) -> PageLocation;
    fn snapshot(&self, root: ThemeRoot) -> RootSnapshot;
    /// Insert `fragment` as the first child of the node matching `target`
    fn mount(&self, target: &str, fragment: &WidgetFragment) -> Option<Rc<dyn MountedWidget>>;
    fn meta_description(&self) -> Option<String>;
    /// Text of inline (`src`-less) scripts
    fn inline_scripts(&self) -> Vec<String>;
}

// =============================================================================
// I/O and scheduling
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type HttpFuture = LocalBoxFuture<'static, Result<HttpResponse, TransportError>>;

pub trait HttpClient {
    fn get(&self, url: &str) -> HttpFuture;
    fn post_json(&self, url: &str, body: String) -> HttpFuture;
}

/// Single-threaded task runtime
pub trait Runtime {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
    /// Uniform random delay in `0..=max_ms`
    fn jitter(&self, max_ms: u32) -> u32;
}

/// Bundle of host seams handed to the controller
#[derive(Clone)]
pub struct Environment {
    pub page: Rc<dyn PageHost>,
    pub notifier: Rc<dyn AttributeNotifier>,
    pub http: Rc<dyn HttpClient>,
    pub runtime: Rc<dyn Runtime>,
}
