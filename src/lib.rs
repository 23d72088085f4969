//! Summary Widget: adaptive AI summary box for blog pages
//!
//! A Rust/WASM engine that injects a small "AI summary" widget into a host
//! page and keeps it consistent while the page soft-navigates.
//!
//! # Architecture
//!
//! ## Engine (host-independent)
//! - `pattern/` - PatternMatcher: glob-like allow/deny lists and the visibility gate
//! - `theme/` - ThemeResolver: dark-selector probe, theme precedence, live watcher
//! - `config/` - ConfigResolver: remote < scraped < override layering
//! - `content/` - ContentSource: single-flight summary fetch and fallback text
//! - `render/` - TypewriterRenderer: cancellable grapheme-by-grapheme reveal
//! - `widget/` - WidgetController + NavigationBridge: lifecycle and debounce
//!
//! ## Host
//! - `host/` - seams the engine talks through (page, notifier, HTTP, runtime)
//! - `host/browser.rs` - the same seams over `web-sys`
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { SummaryWidget } from 'summary-widget';
//!
//! await init();
//!
//! const widget = new SummaryWidget({
//!   configEndpoint: '/apis/api.summary.widget/v1alpha1/summaryConfig',
//!   debounceMs: 100,
//!   overrides: { title: 'AI Summary', target: '#article' }
//! });
//!
//! widget.start();    // listens for navigation, evaluates once
//! widget.refresh();  // debounced re-evaluation
//! widget.destroy();  // removes the widget and all listeners
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod host;
pub mod logging;
pub mod pattern;
pub mod render;
pub mod theme;
pub mod widget;

#[cfg(test)]
mod testing;

pub use config::{PartialWidgetConfig, WidgetConfig};
pub use error::WidgetError;
pub use widget::wasm::SummaryWidget;
pub use widget::{WidgetController, WidgetState};

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Install the panic hook and console logger
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    logging::init(if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("summary-widget v{}", env!("CARGO_PKG_VERSION"))
}
