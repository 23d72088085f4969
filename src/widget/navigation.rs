//! NavigationBridge: host navigation events → controller lifecycle
//!
//! Events that show a new view schedule a trailing-edge debounced
//! evaluation. A burst collapses into one evaluation that runs after the
//! last event of the burst. Events that start leaving a view destroy at once.

use std::cell::Cell;
use std::rc::Rc;

use crate::host::Runtime;

use super::controller::WidgetController;

pub const DEFAULT_DEBOUNCE_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    /// `DOMContentLoaded`, or the initial `start()`
    Load,
    /// `pjax:start`
    SoftNavigationStart,
    /// `pjax:complete`
    SoftNavigationComplete,
    /// `pjax:error`
    SoftNavigationError,
    /// `page:load` / `turbolinks:load`
    ViewLoad,
    HashChange,
    PopState,
}

/// Listener target for a DOM event name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Document,
    Window,
}

/// Every DOM event the bridge listens to
pub const DOM_EVENTS: &[(EventSource, &str)] = &[
    (EventSource::Document, "DOMContentLoaded"),
    (EventSource::Document, "pjax:start"),
    (EventSource::Document, "pjax:complete"),
    (EventSource::Document, "pjax:error"),
    (EventSource::Document, "page:load"),
    (EventSource::Document, "turbolinks:load"),
    (EventSource::Window, "hashchange"),
    (EventSource::Window, "popstate"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    Evaluate,
    RefreshAndEvaluate,
    Destroy,
}

impl NavigationEvent {
    pub fn from_dom_event(name: &str) -> Option<Self> {
        match name {
            "DOMContentLoaded" => Some(NavigationEvent::Load),
            "pjax:start" => Some(NavigationEvent::SoftNavigationStart),
            "pjax:complete" => Some(NavigationEvent::SoftNavigationComplete),
            "pjax:error" => Some(NavigationEvent::SoftNavigationError),
            "page:load" | "turbolinks:load" => Some(NavigationEvent::ViewLoad),
            "hashchange" => Some(NavigationEvent::HashChange),
            "popstate" => Some(NavigationEvent::PopState),
            _ => None,
        }
    }

    pub fn action(self) -> NavigationAction {
        match self {
            NavigationEvent::SoftNavigationStart | NavigationEvent::SoftNavigationError => NavigationAction::Destroy,
            NavigationEvent::SoftNavigationComplete | NavigationEvent::PopState => {
                NavigationAction::RefreshAndEvaluate
            }
            NavigationEvent::Load | NavigationEvent::ViewLoad | NavigationEvent::HashChange => {
                NavigationAction::Evaluate
            }
        }
    }
}

pub struct NavigationBridge {
    controller: Rc<WidgetController>,
    runtime: Rc<dyn Runtime>,
    debounce_ms: u32,
    generation: Rc<Cell<u64>>,
    /// Set when any event of the pending burst asked for a page refresh
    refresh_pending: Rc<Cell<bool>>,
}

impl NavigationBridge {
    pub fn new(controller: Rc<WidgetController>, runtime: Rc<dyn Runtime>, debounce_ms: u32) -> Self {
        Self {
            controller,
            runtime,
            debounce_ms,
            generation: Rc::new(Cell::new(0)),
            refresh_pending: Rc::new(Cell::new(false)),
        }
    }

    pub fn controller(&self) -> &Rc<WidgetController> {
        &self.controller
    }

    pub fn handle(&self, event: NavigationEvent) {
        log::trace!("navigation event {:?}", event);
        match event.action() {
            NavigationAction::Destroy => {
                self.cancel_pending();
                self.controller.destroy();
            }
            NavigationAction::Evaluate => self.schedule(false),
            NavigationAction::RefreshAndEvaluate => self.schedule(true),
        }
    }

    /// Handle a raw DOM event name; unknown names are ignored
    pub fn handle_dom_event(&self, name: &str) {
        if let Some(event) = NavigationEvent::from_dom_event(name) {
            self.handle(event);
        }
    }

    /// Drop any scheduled evaluation
    pub fn cancel_pending(&self) {
        self.generation.set(self.generation.get() + 1);
        self.refresh_pending.set(false);
    }

    fn schedule(&self, refresh: bool) {
        let ticket = self.generation.get() + 1;
        self.generation.set(ticket);
        if refresh {
            self.refresh_pending.set(true);
        }

        let generation = self.generation.clone();
        let refresh_pending = self.refresh_pending.clone();
        let controller = Rc::downgrade(&self.controller);
        let delay = self.runtime.sleep(self.debounce_ms);

        self.runtime.spawn(Box::pin(async move {
            delay.await;
            if generation.get() != ticket {
                return;
            }
            let Some(controller) = controller.upgrade() else {
                return;
            };
            if refresh_pending.replace(false) {
                controller.refresh_page_layer().await;
                if generation.get() != ticket {
                    return;
                }
            }
            controller.evaluate().await;
        }));
    }
}
