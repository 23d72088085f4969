//! WidgetController: owns the single current widget instance
//!
//! ```text
//! Idle ──evaluate──▶ Evaluating ──gate ok + target──▶ Mounted
//!  ▲                    │                               │
//!  └──hidden/no target──┘                               │ theme change (in place)
//!                                                       ▼
//!                      Destroyed ◀──destroy / next evaluate / suppressed
//! ```
//!
//! Every evaluation takes an epoch. `destroy()` and newer evaluations bump
//! it, so an evaluation still waiting on the remote config never mounts.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::{scrape_html, scrape_scripts, ConfigResolver, PartialWidgetConfig, WidgetConfig};
use crate::content::{ContentMode, ContentResult, ContentSource};
use crate::host::{Environment, PageLocation};
use crate::pattern::{gate, Visibility};
use crate::render::Typewriter;
use crate::theme::{ThemeName, ThemeResolver, ThemeWatcher};

use super::fragment::WidgetFragment;
use super::instance::WidgetInstance;
use super::WidgetState;

pub struct WidgetController {
    env: Environment,
    overrides: PartialWidgetConfig,
    resolver: ConfigResolver,
    /// Layer scraped from a re-fetched page after soft navigation
    page_layer: RefCell<Option<PartialWidgetConfig>>,
    /// Bumped by every page re-fetch; only the latest may write `page_layer`
    page_ticket: Cell<u64>,
    current: RefCell<Option<WidgetInstance>>,
    state: Cell<WidgetState>,
    epoch: Cell<u64>,
    next_id: Cell<u64>,
    announced: Cell<bool>,
}

impl WidgetController {
    pub fn new(env: Environment, config_endpoint: Option<String>, overrides: PartialWidgetConfig) -> Rc<Self> {
        let resolver = ConfigResolver::new(config_endpoint, env.http.clone());
        Rc::new(Self {
            env,
            overrides,
            resolver,
            page_layer: RefCell::new(None),
            page_ticket: Cell::new(0),
            current: RefCell::new(None),
            state: Cell::new(WidgetState::Idle),
            epoch: Cell::new(0),
            next_id: Cell::new(1),
            announced: Cell::new(false),
        })
    }

    pub fn state(&self) -> WidgetState {
        self.state.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn current_id(&self) -> Option<u64> {
        self.current.borrow().as_ref().map(WidgetInstance::id)
    }

    pub fn current_theme(&self) -> Option<ThemeName> {
        self.current.borrow().as_ref().map(WidgetInstance::theme)
    }

    pub fn current_result(&self) -> Option<ContentResult> {
        self.current.borrow().as_ref().map(|i| i.result().clone())
    }

    pub fn current_config(&self) -> Option<WidgetConfig> {
        self.current.borrow().as_ref().map(|i| i.config().clone())
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Retire any current instance, then resolve, gate and mount for the
    /// page as it is now.
    pub async fn evaluate(self: Rc<Self>) {
        let epoch = self.begin_evaluation();

        let scraped = self.scraped_layer();
        let config = self.resolver.resolve(Some(&scraped), Some(&self.overrides)).await;
        if self.epoch.get() != epoch {
            log::debug!("evaluation {} superseded", epoch);
            return;
        }

        let location = self.env.page.location();
        match gate(&config, &location) {
            Visibility::Visible => self.mount(config, location),
            Visibility::Hidden(reason) => {
                log::debug!("widget hidden on {}: {:?}", location.pathname, reason);
                self.state.set(WidgetState::Idle);
            }
        }
    }

    fn begin_evaluation(&self) -> u64 {
        self.retire_current();
        let epoch = self.epoch.get() + 1;
        self.epoch.set(epoch);
        self.state.set(WidgetState::Evaluating);
        epoch
    }

    /// Inline-script layer of the live document, overlaid by the layer from
    /// the last re-fetched page
    fn scraped_layer(&self) -> PartialWidgetConfig {
        let mut layer = scrape_scripts(self.env.page.inline_scripts());
        if let Some(page) = self.page_layer.borrow().as_ref() {
            layer.overlay(page);
        }
        layer
    }

    fn mount(self: &Rc<Self>, config: WidgetConfig, location: PageLocation) {
        let fragment = WidgetFragment::from_config(&config);
        let Some(node) = self.env.page.mount(&config.target, &fragment) else {
            log::debug!("mount target `{}` not found", config.target);
            self.state.set(WidgetState::Idle);
            return;
        };

        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let theme = ThemeResolver::from_config(&config);
        let initial = theme.resolve(&self.env.page.snapshot(theme.root()));
        node.apply_theme(&theme.style(initial));

        let watcher = {
            let styler = theme.clone();
            let target = Rc::downgrade(&node);
            ThemeWatcher::observe(&*self.env.notifier, theme, initial, move |name| {
                if let Some(node) = target.upgrade() {
                    node.apply_theme(&styler.style(name));
                }
            })
        };

        let meta = self.env.page.meta_description();
        let content = ContentSource::new(ContentMode::select(&config, meta.as_deref()), self.env.http.clone());
        let request = content.fetch(&location.pathname);
        let typewriter = Typewriter::new(self.env.runtime.clone(), config.type_jitter);

        log::debug!("mounted widget {} into `{}` ({})", id, config.target, initial);
        *self.current.borrow_mut() = Some(WidgetInstance {
            id,
            config,
            node,
            watcher,
            content,
            typewriter,
            result: ContentResult::Pending,
        });
        self.state.set(WidgetState::Mounted);
        self.announce();

        let controller = Rc::downgrade(self);
        self.env.runtime.spawn(Box::pin(async move {
            let Some(result) = request.await else {
                return;
            };
            if let Some(controller) = controller.upgrade() {
                controller.deliver(id, result);
            }
        }));
    }

    /// Hand a settled result to instance `id`; dropped if it has been retired
    fn deliver(&self, id: u64, result: ContentResult) {
        let suppressed = {
            let mut current = self.current.borrow_mut();
            match current.as_mut().filter(|instance| instance.id == id) {
                Some(instance) => instance.present(result),
                None => {
                    log::debug!("dropping content for retired widget {}", id);
                    return;
                }
            }
        };
        if suppressed {
            self.destroy();
        }
    }

    fn announce(&self) {
        if !self.announced.replace(true) {
            log::info!("summary widget v{} active", env!("CARGO_PKG_VERSION"));
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Tear down the current instance and abort any evaluation in progress.
    /// Safe to call any number of times.
    pub fn destroy(&self) {
        self.epoch.set(self.epoch.get() + 1);
        let retired = self.retire_current();
        if retired || self.state.get() == WidgetState::Evaluating {
            self.state.set(WidgetState::Destroyed);
        }
    }

    fn retire_current(&self) -> bool {
        let taken = self.current.borrow_mut().take();
        match taken {
            Some(mut instance) => {
                log::debug!("retiring widget {}", instance.id);
                instance.retire();
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Soft-navigation support
    // =========================================================================

    /// Re-fetch the current page and replace the page-scraped layer. A failed
    /// fetch keeps the previous layer. A response that arrives after a newer
    /// re-fetch started, or after the page moved on, is discarded.
    pub async fn refresh_page_layer(&self) {
        let ticket = self.page_ticket.get() + 1;
        self.page_ticket.set(ticket);
        let href = self.env.page.location().href;
        let response = self.env.http.get(&href).await;

        if self.page_ticket.get() != ticket || self.env.page.location().href != href {
            log::debug!("discarding superseded page refresh for {}", href);
            return;
        }
        match response {
            Ok(response) if response.is_success() => {
                *self.page_layer.borrow_mut() = Some(scrape_html(&response.body));
            }
            Ok(response) => log::warn!("page refresh for {} returned HTTP {}", href, response.status),
            Err(err) => log::warn!("page refresh for {} failed: {}", href, err),
        }
    }
}

impl Drop for WidgetController {
    fn drop(&mut self) {
        self.retire_current();
    }
}
