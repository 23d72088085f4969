//! Live theme tracking for a mounted widget

use std::cell::Cell;
use std::rc::Rc;

use super::{ThemeName, ThemeResolver};
use crate::host::{AttributeChange, AttributeNotifier, Subscription};

/// Re-resolves the theme whenever a watched root attribute changes and
/// reports only transitions to a different theme.
pub struct ThemeWatcher {
    current: Rc<Cell<ThemeName>>,
    subscription: Subscription,
}

impl ThemeWatcher {
    pub fn observe(
        notifier: &dyn AttributeNotifier,
        resolver: ThemeResolver,
        initial: ThemeName,
        on_change: impl Fn(ThemeName) + 'static,
    ) -> Self {
        let current = Rc::new(Cell::new(initial));
        let attributes = resolver.watched_attributes();
        let root = resolver.root();

        let last = current.clone();
        let callback = move |change: &AttributeChange| {
            let next = resolver.resolve(&change.current);
            if next == last.get() {
                return;
            }
            log::debug!("theme {} -> {} ({} changed)", last.get(), next, change.attribute);
            last.set(next);
            on_change(next);
        };

        let subscription = notifier.subscribe(root, attributes, Box::new(callback));
        Self { current, subscription }
    }

    /// Last theme reported (or the initial one)
    pub fn current(&self) -> ThemeName {
        self.current.get()
    }

    pub fn unsubscribe(&mut self) {
        self.subscription.unsubscribe();
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }
}
