//! Incremental text rendering

pub mod typewriter;

pub use typewriter::{RenderHandle, Typewriter, FADE_DELAY_MS, FADE_DURATION_MS};
