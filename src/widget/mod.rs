//! Widget lifecycle: controller, navigation bridge and the JavaScript API

pub mod controller;
pub mod fragment;
pub mod instance;
pub mod navigation;
pub mod wasm;


pub use controller::WidgetController;
pub use fragment::WidgetFragment;
pub use instance::WidgetInstance;
pub use navigation::{NavigationBridge, NavigationEvent, DEFAULT_DEBOUNCE_MS};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Idle,
    Evaluating,
    Mounted,
    Destroyed,
}

impl WidgetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetState::Idle => "idle",
            WidgetState::Evaluating => "evaluating",
            WidgetState::Mounted => "mounted",
            WidgetState::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
