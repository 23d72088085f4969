use std::rc::Rc;

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::config::PartialWidgetConfig;
use crate::error::{ConfigError, WidgetError};
use crate::host::browser::{self, EventListener};

use super::navigation::{EventSource, DOM_EVENTS};
use super::{NavigationBridge, NavigationEvent, WidgetController, DEFAULT_DEBOUNCE_MS};

fn to_js(err: impl Into<WidgetError>) -> JsValue {
    JsValue::from_str(&err.into().to_string())
}

/// Options accepted by `new SummaryWidget(options)`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WidgetOptions {
    config_endpoint: Option<String>,
    debounce_ms: Option<u32>,
    overrides: PartialWidgetConfig,
}

/// AI summary widget bound to the current page
#[wasm_bindgen]
pub struct SummaryWidget {
    bridge: Rc<NavigationBridge>,
    listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl SummaryWidget {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<SummaryWidget, JsValue> {
        let options: WidgetOptions = if options.is_undefined() || options.is_null() {
            WidgetOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(|e| to_js(ConfigError::Options(e.to_string())))?
        };

        let env = browser::environment()?;
        let runtime = env.runtime.clone();
        let controller = WidgetController::new(env, options.config_endpoint, options.overrides);
        let bridge = NavigationBridge::new(
            controller,
            runtime,
            options.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
        );

        Ok(SummaryWidget {
            bridge: Rc::new(bridge),
            listeners: Vec::new(),
        })
    }

    /// Attach navigation listeners and schedule the first evaluation
    #[wasm_bindgen]
    pub fn start(&mut self) -> Result<(), JsValue> {
        if !self.listeners.is_empty() {
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document available"))?;

        for &(source, name) in DOM_EVENTS {
            let target: &web_sys::EventTarget = match source {
                EventSource::Document => &document,
                EventSource::Window => &window,
            };
            let bridge = Rc::downgrade(&self.bridge);
            let listener = EventListener::listen(target, name, move |_| {
                if let Some(bridge) = bridge.upgrade() {
                    bridge.handle_dom_event(name);
                }
            })?;
            self.listeners.push(listener);
        }

        self.bridge.handle(NavigationEvent::Load);
        Ok(())
    }

    /// Debounced re-evaluation for the current page
    #[wasm_bindgen]
    pub fn refresh(&self) {
        self.bridge.handle(NavigationEvent::Load);
    }

    /// Remove the widget and every listener
    #[wasm_bindgen]
    pub fn destroy(&mut self) {
        self.listeners.clear();
        self.bridge.cancel_pending();
        self.bridge.controller().destroy();
    }

    #[wasm_bindgen]
    pub fn state(&self) -> String {
        self.bridge.controller().state().to_string()
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.bridge.controller().is_mounted()
    }
}

impl Drop for SummaryWidget {
    fn drop(&mut self) {
        self.destroy();
    }
}
