use std::time::Duration;

use leptos::prelude::{set_timeout_with_handle, TimeoutHandle};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, DomParser, Element, EventTarget, SupportedType, Window};

use infinite_scroll::dom::{BoxMetrics, CompatMode, Dom, ListenerCallback, ListenerKind, Rect, Scheduler, ScrollContainer, ScrollPosition, TimerCallback, ViewportMetrics};
use scroll_utils::errors::ScrollError;

/// Converts a javascript exception into a [`ScrollError::Platform`].
pub fn platform_error(value: JsValue) -> ScrollError {
    ScrollError::Platform(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// Listener attached to a window or an element, detached by [`WebDom::remove_listener`].
pub struct WebListener {
    target: EventTarget,
    kind: ListenerKind,
    closure: Closure<dyn FnMut()>,
}

/// Browser document, event loop and clock.
#[derive(Clone, Debug)]
pub struct WebDom {
    window: Window,
    document: Document,
}

impl WebDom {
    pub fn new() -> Result<Self, ScrollError> {
        let window = web_sys::window().ok_or_else(|| ScrollError::new("No global window"))?;
        let document = window.document().ok_or_else(|| ScrollError::new("Window has no document"))?;
        Ok(WebDom { window, document })
    }

    fn event_target(&self, target: &ScrollContainer<Element>) -> EventTarget {
        match target {
            ScrollContainer::Viewport => self.window.clone().into(),
            ScrollContainer::Element(element) => element.clone().into(),
        }
    }
}

fn box_metrics(element: &Element) -> BoxMetrics {
    BoxMetrics {
        scroll_left: element.scroll_left() as f64,
        scroll_top: element.scroll_top() as f64,
        client_width: element.client_width() as f64,
        client_height: element.client_height() as f64,
    }
}

fn select_all(node_list: web_sys::NodeList) -> Vec<Element> {
    (0..node_list.length())
        .filter_map(|index| node_list.get(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl Dom for WebDom {
    type Element = Element;
    type ListenerHandle = WebListener;

    fn query_all(&self, selector: &str, root: Option<&Element>) -> Result<Vec<Element>, ScrollError> {
        let node_list = match root {
            Some(root) => root.query_selector_all(selector),
            None => self.document.query_selector_all(selector),
        };
        node_list
            .map(select_all)
            .map_err(|_| ScrollError::InvalidSelector(selector.to_string()))
    }

    fn scroll_offsets(&self, element: &Element) -> ScrollPosition {
        ScrollPosition {
            x: element.scroll_left() as f64,
            y: element.scroll_top() as f64,
        }
    }

    fn bounding_client_rect(&self, element: &Element) -> Rect {
        let rect = element.get_bounding_client_rect();
        Rect {
            top: rect.top(),
            left: rect.left(),
            right: rect.right(),
            bottom: rect.bottom(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    fn viewport_metrics(&self) -> ViewportMetrics {
        let page_offset = match (self.window.page_x_offset(), self.window.page_y_offset()) {
            (Ok(x), Ok(y)) => Some(ScrollPosition { x, y }),
            _ => None,
        };
        ViewportMetrics {
            page_offset,
            compat_mode: CompatMode::from_document_mode(&self.document.compat_mode()),
            document_element: self.document.document_element().as_ref().map(box_metrics),
            body: self.document.body().as_deref().map(box_metrics),
        }
    }

    fn parse_document(&self, markup: &str) -> Result<Element, ScrollError> {
        let parser = DomParser::new().map_err(platform_error)?;
        let document = parser
            .parse_from_string(markup, SupportedType::TextHtml)
            .map_err(|e| ScrollError::ResponseParse(platform_error(e).to_string()))?;
        document
            .document_element()
            .ok_or_else(|| ScrollError::ResponseParse(String::from("Empty document")))
    }

    fn add_listener(
        &self,
        target: &ScrollContainer<Element>,
        kind: ListenerKind,
        callback: ListenerCallback,
    ) -> Result<WebListener, ScrollError> {
        let closure = Closure::wrap(Box::new(move || {
            if let Err(e) = callback() {
                log::error!("Error in {kind} listener: {e}");
                wasm_bindgen::throw_str(&e.to_string());
            }
        }) as Box<dyn FnMut()>);
        let target = self.event_target(target);
        target
            .add_event_listener_with_callback(kind.as_ref(), closure.as_ref().unchecked_ref())
            .map_err(platform_error)?;
        Ok(WebListener { target, kind, closure })
    }

    fn remove_listener(&self, handle: WebListener) {
        let WebListener { target, kind, closure } = handle;
        if let Err(e) = target.remove_event_listener_with_callback(kind.as_ref(), closure.as_ref().unchecked_ref()) {
            log::warn!("Failed to remove {kind} listener: {}", platform_error(e));
        }
    }
}

impl Scheduler for WebDom {
    type TimerHandle = TimeoutHandle;

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> Result<TimeoutHandle, ScrollError> {
        let delay = Duration::from_secs_f64(delay_ms.max(0.0) / 1000.0);
        set_timeout_with_handle(
            move || {
                if let Err(e) = callback() {
                    log::error!("Error in deferred listener: {e}");
                }
            },
            delay,
        ).map_err(platform_error)
    }

    fn clear_timeout(&self, handle: TimeoutHandle) {
        handle.clear();
    }
}
