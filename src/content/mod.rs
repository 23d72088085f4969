//! ContentSource: where the summary text comes from
//!
//! Static text resolves immediately. Remote text is requested from the
//! summary service with the page path as locator. Requests are single-flight:
//! starting a new fetch, or cancelling, turns every earlier result into `None`.

pub mod messages;

pub use messages::fallback_message;

use std::cell::Cell;
use std::rc::Rc;
use std::sync::OnceLock;

use futures::future::{self, LocalBoxFuture};
use regex::Regex;
use serde::Deserialize;

use crate::config::WidgetConfig;
use crate::error::{ContentError, TransportError};
use crate::host::{HttpClient, HttpResponse};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentResult {
    Pending,
    Ready(String),
    Failed(ContentError),
    /// The service marked this page as excluded; the widget is withdrawn
    Suppressed(String),
}

impl ContentResult {
    pub fn is_pending(&self) -> bool {
        matches!(self, ContentResult::Pending)
    }

    /// Only settled text or failures are rendered
    pub fn is_renderable(&self) -> bool {
        matches!(self, ContentResult::Ready(_) | ContentResult::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentMode {
    Static(String),
    Remote { endpoint: String },
    Unavailable,
}

impl ContentMode {
    /// Configured text, then the summary service, then the page description
    pub fn select(config: &WidgetConfig, meta_description: Option<&str>) -> Self {
        if let Some(text) = config.summary_text.as_deref().map(clean_content).filter(|t| !t.is_empty()) {
            return ContentMode::Static(text);
        }
        if let Some(endpoint) = config.content_endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
            return ContentMode::Remote {
                endpoint: endpoint.trim().to_string(),
            };
        }
        match meta_description.map(clean_content).filter(|t| !t.is_empty()) {
            Some(text) => ContentMode::Static(text),
            None => ContentMode::Unavailable,
        }
    }
}

/// Collapse blank-line runs and trim
pub fn clean_content(text: &str) -> String {
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();
    let re = BLANK_LINES.get_or_init(|| Regex::new(r"\n\s*\n").unwrap());
    re.replace_all(text, "\n").trim().to_string()
}

/// Path → transport-safe locator (`/post/a` → `__post__a`)
pub fn normalize_locator(path: &str) -> String {
    path.trim().replace('/', "__")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "summary")]
    summary_content: Option<String>,
    #[serde(default)]
    black_list: bool,
}

fn default_success() -> bool {
    true
}

/// Interpret a summary-service response
pub fn parse_response(response: &HttpResponse) -> ContentResult {
    if !response.is_success() {
        return ContentResult::Failed(TransportError::Status(response.status).into());
    }
    let parsed: SummaryResponse = match serde_json::from_str(&response.body) {
        Ok(parsed) => parsed,
        Err(err) => return ContentResult::Failed(ContentError::Decode(err.to_string())),
    };
    if parsed.black_list {
        return ContentResult::Suppressed(parsed.message.unwrap_or_default());
    }
    if !parsed.success {
        return ContentResult::Failed(ContentError::Rejected(parsed.message.unwrap_or_default()));
    }
    match parsed.summary_content.as_deref().map(clean_content) {
        Some(text) if !text.is_empty() => ContentResult::Ready(text),
        _ => ContentResult::Failed(ContentError::Empty),
    }
}

// =============================================================================
// ContentSource
// =============================================================================

pub struct ContentSource {
    mode: ContentMode,
    http: Rc<dyn HttpClient>,
    flight: Rc<Cell<u64>>,
}

impl ContentSource {
    pub fn new(mode: ContentMode, http: Rc<dyn HttpClient>) -> Self {
        Self {
            mode,
            http,
            flight: Rc::new(Cell::new(0)),
        }
    }

    /// Start a fetch for the page at `path`.
    ///
    /// Resolves to `None` if another fetch started or `cancel` ran before the
    /// response arrived.
    pub fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Option<ContentResult>> {
        let ticket = self.flight.get() + 1;
        self.flight.set(ticket);
        let flight = self.flight.clone();

        let settled: LocalBoxFuture<'static, ContentResult> = match &self.mode {
            ContentMode::Static(text) => Box::pin(future::ready(ContentResult::Ready(text.clone()))),
            ContentMode::Unavailable => Box::pin(future::ready(ContentResult::Failed(ContentError::NoSource))),
            ContentMode::Remote { endpoint } => {
                let locator = normalize_locator(path);
                let url = format!("{}/{}", endpoint.trim_end_matches('/'), locator);
                let body = serde_json::json!({ "permalink": locator }).to_string();
                let request = self.http.post_json(&url, body);
                Box::pin(async move {
                    match request.await {
                        Ok(response) => parse_response(&response),
                        Err(err) => ContentResult::Failed(err.into()),
                    }
                })
            }
        };

        Box::pin(async move {
            let result = settled.await;
            (flight.get() == ticket).then_some(result)
        })
    }

    /// Invalidate every outstanding fetch
    pub fn cancel(&self) {
        self.flight.set(self.flight.get() + 1);
    }
}
