//! TypewriterRenderer: incremental reveal with a blinking cursor
//!
//! Each run is a spawned task holding a cancellation token. The token is
//! checked after every suspension point, before any write, so a cancelled
//! run never touches the surface again. `cancel()` hides the cursor
//! synchronously.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use unicode_segmentation::UnicodeSegmentation;

use crate::host::{CursorState, Runtime, TextSurface};

/// Pause after the last character before the cursor fades
pub const FADE_DELAY_MS: u32 = 500;
/// Length of the cursor fade-out
pub const FADE_DURATION_MS: u32 = 500;

// =============================================================================
// RenderHandle
// =============================================================================

#[derive(Clone)]
pub struct RenderHandle {
    cancelled: Rc<Cell<bool>>,
    finished: Rc<Cell<bool>>,
    surface: Rc<dyn TextSurface>,
}

impl RenderHandle {
    fn new(surface: Rc<dyn TextSurface>) -> Self {
        Self {
            cancelled: Rc::new(Cell::new(false)),
            finished: Rc::new(Cell::new(false)),
            surface,
        }
    }

    /// Stop the run and clear the cursor. No-op once finished or cancelled.
    pub fn cancel(&self) {
        if self.cancelled.get() || self.finished.get() {
            return;
        }
        self.cancelled.set(true);
        self.surface.set_cursor(CursorState::Hidden);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }

    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.is_finished()
    }
}

impl std::fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHandle")
            .field("cancelled", &self.cancelled.get())
            .field("finished", &self.finished.get())
            .finish()
    }
}

// =============================================================================
// Typewriter
// =============================================================================

/// Renders into surfaces one run at a time
pub struct Typewriter {
    runtime: Rc<dyn Runtime>,
    jitter_ms: u32,
    current: RefCell<Option<RenderHandle>>,
}

impl Typewriter {
    pub fn new(runtime: Rc<dyn Runtime>, jitter_ms: u32) -> Self {
        Self {
            runtime,
            jitter_ms,
            current: RefCell::new(None),
        }
    }

    /// Start revealing `text`. Any run still in progress is cancelled first.
    pub fn render(&self, surface: Rc<dyn TextSurface>, text: &str, speed_ms: u32) -> RenderHandle {
        self.cancel();

        let handle = RenderHandle::new(surface.clone());
        let units: Vec<String> = text.graphemes(true).map(str::to_string).collect();
        let task = run(
            self.runtime.clone(),
            surface,
            units,
            speed_ms,
            self.jitter_ms,
            handle.clone(),
        );
        self.runtime.spawn(Box::pin(task));

        *self.current.borrow_mut() = Some(handle.clone());
        handle
    }

    /// Write `text` at once, without animation
    pub fn show(&self, surface: Rc<dyn TextSurface>, text: &str) {
        self.cancel();
        surface.set_cursor(CursorState::Hidden);
        surface.set_text(text);
    }

    pub fn cancel(&self) {
        if let Some(handle) = self.current.borrow_mut().take() {
            handle.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.borrow().as_ref().is_some_and(RenderHandle::is_active)
    }
}

async fn run(
    runtime: Rc<dyn Runtime>,
    surface: Rc<dyn TextSurface>,
    units: Vec<String>,
    speed_ms: u32,
    jitter_ms: u32,
    handle: RenderHandle,
) {
    if handle.is_cancelled() {
        return;
    }
    let mut shown = String::new();
    surface.set_text(&shown);
    surface.set_cursor(CursorState::Blinking);

    for unit in units {
        let delay = speed_ms.saturating_add(runtime.jitter(jitter_ms));
        runtime.sleep(delay).await;
        if handle.is_cancelled() {
            return;
        }
        shown.push_str(&unit);
        surface.set_text(&shown);
    }

    runtime.sleep(FADE_DELAY_MS).await;
    if handle.is_cancelled() {
        return;
    }
    surface.set_cursor(CursorState::FadingOut);

    runtime.sleep(FADE_DURATION_MS).await;
    if handle.is_cancelled() {
        return;
    }
    surface.set_cursor(CursorState::Hidden);
    handle.finished.set(true);
}
