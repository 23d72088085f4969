//! Host seams over `web-sys`
//!
//! Only this module touches the DOM. Every fallible DOM call is logged and
//! degraded: a failed mount leaves the page untouched, a failed observer
//! means the theme stays as it was at mount.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, MutationObserver, MutationObserverInit, MutationRecord,
    Request, RequestInit, Response, Window,
};

use super::{
    AttributeChange, AttributeNotifier, CursorState, Environment, HttpClient, HttpFuture, HttpResponse,
    MountedWidget, PageHost, PageLocation, RootSnapshot, Runtime, Subscription, TextSurface, ThemeRoot,
};
use crate::error::TransportError;
use crate::theme::ThemeStyle;
use crate::widget::fragment::{
    WidgetFragment, CURSOR_CLASS, EXPLANATION_CLASS, ICON_CLASS, TAG_CLASS, TEXT_CLASS, TITLE_CLASS,
    TITLE_TEXT_CLASS,
};

const STYLE_ID: &str = "summary-widget-style";
const CONTENT_CLASS: &str = "summary-content";
const CURSOR_FADE_CLASS: &str = "summary-cursor summary-cursor-fade";

const WIDGET_CSS: &str = "\
.summary-cursor{display:inline-block;width:1px;height:1em;margin-left:2px;vertical-align:text-bottom;\
background:var(--summary-cursor,currentColor);animation:summary-blink 1s step-end infinite}\
.summary-cursor-fade{animation:summary-fade-out .5s ease-out forwards}\
@keyframes summary-blink{50%{opacity:0}}\
@keyframes summary-fade-out{from{opacity:1}to{opacity:0}}";

/// Build the browser environment for the current window
pub fn environment() -> Result<Environment, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document available"))?;
    inject_styles(&document);

    let page = Rc::new(BrowserPage { window, document });
    Ok(Environment {
        page: page.clone(),
        notifier: page,
        http: Rc::new(FetchClient),
        runtime: Rc::new(BrowserRuntime),
    })
}

fn inject_styles(document: &Document) {
    if document.get_element_by_id(STYLE_ID).is_some() {
        return;
    }
    let Some(head) = document.head() else {
        return;
    };
    let result = document.create_element("style").and_then(|style| {
        style.set_id(STYLE_ID);
        style.set_text_content(Some(WIDGET_CSS));
        head.append_child(&style).map(|_| ())
    });
    if let Err(err) = result {
        log::warn!("could not inject widget styles: {:?}", err);
    }
}

// =============================================================================
// Page
// =============================================================================

pub struct BrowserPage {
    window: Window,
    document: Document,
}

impl BrowserPage {
    fn root_element(&self, root: ThemeRoot) -> Option<Element> {
        match root {
            ThemeRoot::Html => self.document.document_element(),
            ThemeRoot::Body => self.document.body().map(Element::from),
        }
    }
}

fn snapshot_of(element: &Element) -> RootSnapshot {
    let names = element.get_attribute_names();
    RootSnapshot::from_attributes(
        names
            .iter()
            .filter_map(|name| name.as_string())
            .filter_map(|name| element.get_attribute(&name).map(|value| (name, value))),
    )
}

fn create(document: &Document, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
    let element = document.create_element(tag)?.dyn_into::<HtmlElement>()?;
    element.set_class_name(class);
    Ok(element)
}

fn build_widget(document: &Document, fragment: &WidgetFragment) -> Result<BrowserWidget, JsValue> {
    let root = create(document, "div", &fragment.root_class)?;

    let title = create(document, "div", TITLE_CLASS)?;
    let icon = create(document, "img", ICON_CLASS)?;
    icon.set_attribute("src", &fragment.icon)?;
    icon.set_attribute("alt", "")?;
    let title_text = create(document, "span", TITLE_TEXT_CLASS)?;
    title_text.set_text_content(Some(&fragment.title));
    let tag = create(document, "span", TAG_CLASS)?;
    tag.set_text_content(Some(&fragment.source_label));
    title.append_child(&icon)?;
    title.append_child(&title_text)?;
    title.append_child(&tag)?;

    let explanation = create(document, "div", EXPLANATION_CLASS)?;
    let paragraph = create(document, "p", TEXT_CLASS)?;
    let content = create(document, "span", CONTENT_CLASS)?;
    let cursor = create(document, "span", CURSOR_CLASS)?;
    paragraph.append_child(&content)?;
    explanation.append_child(&paragraph)?;

    root.append_child(&title)?;
    root.append_child(&explanation)?;

    Ok(BrowserWidget {
        root,
        surface: Rc::new(BrowserSurface {
            paragraph,
            content,
            cursor,
        }),
    })
}

impl PageHost for BrowserPage {
    fn location(&self) -> PageLocation {
        let location = self.window.location();
        let href = location.href().unwrap_or_default();
        match location.pathname() {
            Ok(pathname) => PageLocation::new(href, pathname),
            Err(_) => PageLocation::from_href(&href),
        }
    }

    fn snapshot(&self, root: ThemeRoot) -> RootSnapshot {
        self.root_element(root).map(|el| snapshot_of(&el)).unwrap_or_default()
    }

    fn mount(&self, target: &str, fragment: &WidgetFragment) -> Option<Rc<dyn MountedWidget>> {
        let host = match self.document.query_selector(target) {
            Ok(Some(host)) => host,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("invalid mount target `{}`: {:?}", target, err);
                return None;
            }
        };
        let widget = match build_widget(&self.document, fragment) {
            Ok(widget) => widget,
            Err(err) => {
                log::warn!("could not build widget: {:?}", err);
                return None;
            }
        };
        if let Err(err) = host.insert_before(&widget.root, host.first_child().as_ref()) {
            log::warn!("could not insert widget into `{}`: {:?}", target, err);
            return None;
        }
        Some(Rc::new(widget))
    }

    fn meta_description(&self) -> Option<String> {
        self.document
            .query_selector("meta[name=\"description\"]")
            .ok()
            .flatten()
            .and_then(|meta| meta.get_attribute("content"))
    }

    fn inline_scripts(&self) -> Vec<String> {
        let Ok(scripts) = self.document.query_selector_all("script:not([src])") else {
            return Vec::new();
        };
        (0..scripts.length())
            .filter_map(|i| scripts.item(i))
            .filter_map(|node| node.text_content())
            .collect()
    }
}

impl AttributeNotifier for BrowserPage {
    fn subscribe(
        &self,
        root: ThemeRoot,
        attributes: Vec<String>,
        callback: Box<dyn Fn(&AttributeChange)>,
    ) -> Subscription {
        let Some(element) = self.root_element(root) else {
            return Subscription::new(|| {});
        };
        match observe(element, &attributes, callback) {
            Ok(subscription) => subscription,
            Err(err) => {
                log::warn!("attribute observer unavailable: {:?}", err);
                Subscription::new(|| {})
            }
        }
    }
}

fn observe(
    element: Element,
    attributes: &[String],
    callback: Box<dyn Fn(&AttributeChange)>,
) -> Result<Subscription, JsValue> {
    let target = element.clone();
    let handler = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
        move |records: js_sys::Array, _: MutationObserver| {
            let current = snapshot_of(&target);
            for record in records.iter() {
                let Ok(record) = record.dyn_into::<MutationRecord>() else {
                    continue;
                };
                let Some(attribute) = record.attribute_name() else {
                    continue;
                };
                let mut previous = current.clone();
                match record.old_value() {
                    Some(old) => previous.set_attribute(&attribute, &old),
                    None => previous.remove_attribute(&attribute),
                }
                callback(&AttributeChange {
                    attribute: attribute.to_ascii_lowercase(),
                    previous,
                    current: current.clone(),
                });
            }
        },
    );

    let observer = MutationObserver::new(handler.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_attributes(true);
    init.set_attribute_old_value(true);
    let filter: js_sys::Array = attributes.iter().map(|a| JsValue::from_str(a)).collect();
    init.set_attribute_filter(&filter);
    observer.observe_with_options(&element, &init)?;

    Ok(Subscription::new(move || {
        observer.disconnect();
        drop(handler);
    }))
}

// =============================================================================
// Mounted widget
// =============================================================================

pub struct BrowserWidget {
    root: HtmlElement,
    surface: Rc<BrowserSurface>,
}

impl MountedWidget for BrowserWidget {
    fn surface(&self) -> Rc<dyn TextSurface> {
        self.surface.clone()
    }

    fn apply_theme(&self, style: &ThemeStyle) {
        self.root.set_class_name(&style.class_name);
        let css = self.root.style();
        for variable in ThemeStyle::known_variables() {
            let _ = css.remove_property(variable);
        }
        for (name, value) in &style.variables {
            if let Err(err) = css.set_property(name, value) {
                log::debug!("could not set {}: {:?}", name, err);
            }
        }
    }

    fn remove(&self) {
        self.root.remove();
    }
}

pub struct BrowserSurface {
    paragraph: HtmlElement,
    content: HtmlElement,
    cursor: HtmlElement,
}

impl TextSurface for BrowserSurface {
    fn set_text(&self, text: &str) {
        self.content.set_text_content(Some(text));
    }

    fn set_cursor(&self, cursor: CursorState) {
        match cursor {
            CursorState::Hidden => self.cursor.remove(),
            CursorState::Blinking => {
                self.cursor.set_class_name(CURSOR_CLASS);
                let _ = self.paragraph.append_child(&self.cursor);
            }
            CursorState::FadingOut => self.cursor.set_class_name(CURSOR_FADE_CLASS),
        }
    }
}

// =============================================================================
// Fetch
// =============================================================================

pub struct FetchClient;

fn network_error(err: JsValue) -> TransportError {
    TransportError::Network(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

async fn send(method: &'static str, url: String, body: Option<String>) -> Result<HttpResponse, TransportError> {
    let window = web_sys::window().ok_or_else(|| TransportError::Network("no window available".to_string()))?;

    let init = RequestInit::new();
    init.set_method(method);
    if let Some(body) = &body {
        init.set_body(&JsValue::from_str(body));
    }
    let request = Request::new_with_str_and_init(&url, &init).map_err(network_error)?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(network_error)?;
    }

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(network_error)?
        .dyn_into()
        .map_err(network_error)?;
    let status = response.status();
    let text = response
        .text()
        .map_err(|err| TransportError::Body(format!("{:?}", err)))?;
    let body = JsFuture::from(text)
        .await
        .map_err(|err| TransportError::Body(format!("{:?}", err)))?;

    Ok(HttpResponse {
        status,
        body: body.as_string().unwrap_or_default(),
    })
}

impl HttpClient for FetchClient {
    fn get(&self, url: &str) -> HttpFuture {
        Box::pin(send("GET", url.to_string(), None))
    }

    fn post_json(&self, url: &str, body: String) -> HttpFuture {
        Box::pin(send("POST", url.to_string(), Some(body)))
    }
}

// =============================================================================
// Runtime
// =============================================================================

pub struct BrowserRuntime;

impl Runtime for BrowserRuntime {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().map(|window| {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms.min(i32::MAX as u32) as i32)
            });
            if !matches!(scheduled, Some(Ok(_))) {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        Box::pin(async move {
            let _ = JsFuture::from(promise).await;
        })
    }

    fn jitter(&self, max_ms: u32) -> u32 {
        if max_ms == 0 {
            return 0;
        }
        let roll = (js_sys::Math::random() * (f64::from(max_ms) + 1.0)).floor() as u32;
        roll.min(max_ms)
    }
}

// =============================================================================
// Event listeners
// =============================================================================

/// DOM event listener that is removed when dropped
pub struct EventListener {
    target: EventTarget,
    name: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    pub fn listen(target: &EventTarget, name: &'static str, handler: impl FnMut(Event) + 'static) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            name,
            closure,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.name, self.closure.as_ref().unchecked_ref());
    }
}
