//! In-crate fakes for the host seams
//!
//! `Harness` drives everything on a `LocalPool` with a manual millisecond
//! clock: `advance(ms)` moves time forward one millisecond at a time and
//! runs every task that became ready.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{self, LocalBoxFuture};
use futures::task::LocalSpawnExt;

use crate::error::TransportError;
use crate::host::{
    AttributeChange, AttributeNotifier, CursorState, Environment, HttpClient, HttpFuture, HttpResponse,
    MountedWidget, PageHost, PageLocation, RootSnapshot, Runtime, Subscription, TextSurface, ThemeRoot,
};
use crate::theme::ThemeStyle;
use crate::widget::WidgetFragment;

// =============================================================================
// Surfaces and widgets
// =============================================================================

pub struct FakeSurface {
    text: RefCell<String>,
    cursor: Cell<CursorState>,
    writes: Cell<usize>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            text: RefCell::new(String::new()),
            cursor: Cell::new(CursorState::Hidden),
            writes: Cell::new(0),
        }
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor.get()
    }

    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl TextSurface for FakeSurface {
    fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
        self.writes.set(self.writes.get() + 1);
    }

    fn set_cursor(&self, cursor: CursorState) {
        self.cursor.set(cursor);
    }
}

pub struct FakeWidget {
    pub target: String,
    pub fragment: WidgetFragment,
    attached: Cell<bool>,
    surface: Rc<FakeSurface>,
    styles: RefCell<Vec<ThemeStyle>>,
}

impl FakeWidget {
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    pub fn text(&self) -> String {
        self.surface.text()
    }

    pub fn fake_surface(&self) -> Rc<FakeSurface> {
        self.surface.clone()
    }

    pub fn last_style(&self) -> Option<ThemeStyle> {
        self.styles.borrow().last().cloned()
    }

    pub fn style_count(&self) -> usize {
        self.styles.borrow().len()
    }
}

impl MountedWidget for FakeWidget {
    fn surface(&self) -> Rc<dyn TextSurface> {
        self.surface.clone()
    }

    fn apply_theme(&self, style: &ThemeStyle) {
        self.styles.borrow_mut().push(style.clone());
    }

    fn remove(&self) {
        self.attached.set(false);
    }
}

// =============================================================================
// Page + notifier
// =============================================================================

struct Listener {
    id: u64,
    root: ThemeRoot,
    attributes: Vec<String>,
    callback: Rc<dyn Fn(&AttributeChange)>,
}

pub struct FakePage {
    location: RefCell<PageLocation>,
    roots: RefCell<HashMap<ThemeRoot, RootSnapshot>>,
    targets: RefCell<Vec<String>>,
    widgets: RefCell<Vec<Rc<FakeWidget>>>,
    meta: RefCell<Option<String>>,
    scripts: RefCell<Vec<String>>,
    listeners: Rc<RefCell<Vec<Listener>>>,
    next_listener: Cell<u64>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            location: RefCell::new(PageLocation::from_href("https://blog.example/archives/hello")),
            roots: RefCell::new(HashMap::new()),
            targets: RefCell::new(vec!["#article".to_string()]),
            widgets: RefCell::new(Vec::new()),
            meta: RefCell::new(None),
            scripts: RefCell::new(Vec::new()),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener: Cell::new(0),
        }
    }

    pub fn navigate(&self, href: &str) {
        *self.location.borrow_mut() = PageLocation::from_href(href);
    }

    pub fn set_targets(&self, targets: &[&str]) {
        *self.targets.borrow_mut() = targets.iter().map(|t| t.to_string()).collect();
    }

    pub fn set_meta_description(&self, text: Option<&str>) {
        *self.meta.borrow_mut() = text.map(str::to_string);
    }

    pub fn set_scripts(&self, scripts: &[&str]) {
        *self.scripts.borrow_mut() = scripts.iter().map(|s| s.to_string()).collect();
    }

    /// Mutate a root attribute and notify matching subscribers
    pub fn set_root_attribute(&self, root: ThemeRoot, name: &str, value: Option<&str>) {
        let (previous, current) = {
            let mut roots = self.roots.borrow_mut();
            let snapshot = roots.entry(root).or_default();
            let previous = snapshot.clone();
            match value {
                Some(v) => snapshot.set_attribute(name, v),
                None => snapshot.remove_attribute(name),
            }
            (previous, snapshot.clone())
        };
        let name = name.to_ascii_lowercase();
        let callbacks: Vec<Rc<dyn Fn(&AttributeChange)>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.root == root && l.attributes.iter().any(|a| *a == name))
            .map(|l| l.callback.clone())
            .collect();
        let change = AttributeChange {
            attribute: name,
            previous,
            current,
        };
        for callback in callbacks {
            callback(&change);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn widgets(&self) -> Vec<Rc<FakeWidget>> {
        self.widgets.borrow().clone()
    }

    pub fn attached_widgets(&self) -> Vec<Rc<FakeWidget>> {
        self.widgets.borrow().iter().filter(|w| w.is_attached()).cloned().collect()
    }
}

impl PageHost for FakePage {
    fn location(&self) -> PageLocation {
        self.location.borrow().clone()
    }

    fn snapshot(&self, root: ThemeRoot) -> RootSnapshot {
        self.roots.borrow().get(&root).cloned().unwrap_or_default()
    }

    fn mount(&self, target: &str, fragment: &WidgetFragment) -> Option<Rc<dyn MountedWidget>> {
        if !self.targets.borrow().iter().any(|t| t == target) {
            return None;
        }
        let widget = Rc::new(FakeWidget {
            target: target.to_string(),
            fragment: fragment.clone(),
            attached: Cell::new(true),
            surface: Rc::new(FakeSurface::new()),
            styles: RefCell::new(Vec::new()),
        });
        self.widgets.borrow_mut().push(widget.clone());
        Some(widget)
    }

    fn meta_description(&self) -> Option<String> {
        self.meta.borrow().clone()
    }

    fn inline_scripts(&self) -> Vec<String> {
        self.scripts.borrow().clone()
    }
}

impl AttributeNotifier for FakePage {
    fn subscribe(
        &self,
        root: ThemeRoot,
        attributes: Vec<String>,
        callback: Box<dyn Fn(&AttributeChange)>,
    ) -> Subscription {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            root,
            attributes: attributes.into_iter().map(|a| a.to_ascii_lowercase()).collect(),
            callback: Rc::from(callback),
        });
        let listeners = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|l| l.id != id);
            }
        })
    }
}

// =============================================================================
// HTTP
// =============================================================================

type HttpResult = Result<HttpResponse, TransportError>;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
}

pub struct FakeHttp {
    routes: RefCell<HashMap<String, HttpResult>>,
    requests: RefCell<Vec<RecordedRequest>>,
    hold: Cell<bool>,
    held: RefCell<Vec<(String, Option<oneshot::Sender<HttpResult>>)>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self {
            routes: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
            hold: Cell::new(false),
            held: RefCell::new(Vec::new()),
        }
    }

    pub fn respond(&self, url: &str, response: HttpResponse) {
        self.routes.borrow_mut().insert(url.to_string(), Ok(response));
    }

    pub fn fail(&self, url: &str, error: TransportError) {
        self.routes.borrow_mut().insert(url.to_string(), Err(error));
    }

    /// Park every following request until `release` is called
    pub fn hold_requests(&self, hold: bool) {
        self.hold.set(hold);
    }

    pub fn held_urls(&self) -> Vec<String> {
        self.held.borrow().iter().map(|(url, _)| url.clone()).collect()
    }

    /// Complete the `index`-th held request
    pub fn release(&self, index: usize, result: HttpResult) {
        let sender = self.held.borrow_mut().get_mut(index).and_then(|(_, tx)| tx.take());
        if let Some(tx) = sender {
            let _ = tx.send(result);
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.borrow().last().cloned()
    }

    fn handle(&self, method: &'static str, url: &str, body: Option<String>) -> HttpFuture {
        self.requests.borrow_mut().push(RecordedRequest {
            method,
            url: url.to_string(),
            body,
        });
        if self.hold.get() {
            let (tx, rx) = oneshot::channel();
            self.held.borrow_mut().push((url.to_string(), Some(tx)));
            return Box::pin(async move {
                rx.await
                    .unwrap_or_else(|_| Err(TransportError::Network("request dropped".to_string())))
            });
        }
        let result = self
            .routes
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Network(format!("no route for {}", url))));
        Box::pin(future::ready(result))
    }
}

impl HttpClient for FakeHttp {
    fn get(&self, url: &str) -> HttpFuture {
        self.handle("GET", url, None)
    }

    fn post_json(&self, url: &str, body: String) -> HttpFuture {
        self.handle("POST", url, Some(body))
    }
}

// =============================================================================
// Runtime with a manual clock
// =============================================================================

struct SleepState {
    done: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

struct Sleep {
    state: Rc<SleepState>,
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.state.done.get() {
            Poll::Ready(())
        } else {
            *self.state.waker.borrow_mut() = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

pub struct FakeRuntime {
    spawner: LocalSpawner,
    now: Cell<u64>,
    jitter: Cell<u32>,
    sleepers: RefCell<Vec<(u64, Rc<SleepState>)>>,
}

impl FakeRuntime {
    pub fn new(spawner: LocalSpawner) -> Self {
        Self {
            spawner,
            now: Cell::new(0),
            jitter: Cell::new(0),
            sleepers: RefCell::new(Vec::new()),
        }
    }

    /// Fixed jitter returned for every call, capped at the caller's max
    pub fn set_jitter(&self, ms: u32) {
        self.jitter.set(ms);
    }

    pub fn spawn_task(&self, task: impl Future<Output = ()> + 'static) {
        self.spawn(Box::pin(task));
    }

    /// Move the clock one millisecond and wake due sleepers
    fn tick(&self) {
        let now = self.now.get() + 1;
        self.now.set(now);
        let due: Vec<Rc<SleepState>> = {
            let mut sleepers = self.sleepers.borrow_mut();
            let (due, pending): (Vec<_>, Vec<_>) = sleepers.drain(..).partition(|(deadline, _)| *deadline <= now);
            *sleepers = pending;
            due.into_iter().map(|(_, state)| state).collect()
        };
        for state in due {
            state.done.set(true);
            if let Some(waker) = state.waker.borrow_mut().take() {
                waker.wake();
            }
        }
    }
}

impl Runtime for FakeRuntime {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.spawner.spawn_local(task).expect("local pool is alive");
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        let state = Rc::new(SleepState {
            done: Cell::new(ms == 0),
            waker: RefCell::new(None),
        });
        if ms > 0 {
            self.sleepers
                .borrow_mut()
                .push((self.now.get() + u64::from(ms), state.clone()));
        }
        Box::pin(Sleep { state })
    }

    fn jitter(&self, max_ms: u32) -> u32 {
        self.jitter.get().min(max_ms)
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pool: LocalPool,
    pub runtime: Rc<FakeRuntime>,
    pub page: Rc<FakePage>,
    pub http: Rc<FakeHttp>,
}

impl Harness {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let runtime = Rc::new(FakeRuntime::new(pool.spawner()));
        Self {
            pool,
            runtime,
            page: Rc::new(FakePage::new()),
            http: Rc::new(FakeHttp::new()),
        }
    }

    pub fn env(&self) -> Environment {
        Environment {
            page: self.page.clone(),
            notifier: self.page.clone(),
            http: self.http.clone(),
            runtime: self.runtime.clone(),
        }
    }

    /// Run every ready task without moving the clock
    pub fn run(&mut self) {
        self.pool.run_until_stalled();
    }

    pub fn advance(&mut self, ms: u32) {
        self.run();
        for _ in 0..ms {
            self.runtime.tick();
            self.run();
        }
    }
}
