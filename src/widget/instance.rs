use std::rc::Rc;

use crate::config::WidgetConfig;
use crate::content::{fallback_message, ContentResult, ContentSource};
use crate::host::MountedWidget;
use crate::render::Typewriter;
use crate::theme::{ThemeName, ThemeWatcher};

/// One mounted widget and every resource it holds
pub struct WidgetInstance {
    pub(crate) id: u64,
    pub(crate) config: WidgetConfig,
    pub(crate) node: Rc<dyn MountedWidget>,
    pub(crate) watcher: ThemeWatcher,
    pub(crate) content: ContentSource,
    pub(crate) typewriter: Typewriter,
    pub(crate) result: ContentResult,
}

impl WidgetInstance {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn theme(&self) -> ThemeName {
        self.watcher.current()
    }

    pub fn result(&self) -> &ContentResult {
        &self.result
    }

    /// Render a settled content result. Returns `true` when the result asks
    /// for the widget to be withdrawn.
    pub(crate) fn present(&mut self, result: ContentResult) -> bool {
        let surface = self.node.surface();
        match &result {
            ContentResult::Ready(text) if self.config.typewriter_enabled => {
                self.typewriter.render(surface, text, self.config.type_speed);
            }
            ContentResult::Ready(text) => self.typewriter.show(surface, text),
            ContentResult::Failed(err) => {
                log::warn!("summary unavailable: {}", err);
                self.typewriter.show(surface, fallback_message(&self.config.locale, err));
            }
            ContentResult::Suppressed(reason) => {
                log::info!("summary suppressed for this page: {}", reason);
            }
            ContentResult::Pending => {}
        }
        let suppressed = matches!(result, ContentResult::Suppressed(_));
        self.result = result;
        suppressed
    }

    /// Release the observer, pending fetch, render task and DOM node
    pub(crate) fn retire(&mut self) {
        self.watcher.unsubscribe();
        self.content.cancel();
        self.typewriter.cancel();
        self.node.remove();
    }
}
