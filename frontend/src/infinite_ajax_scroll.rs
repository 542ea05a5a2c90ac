use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::str::FromStr;

use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Element, Window};

use infinite_scroll::dom::ScrollContainer;
use infinite_scroll::{EventName, InfiniteScroll, Items, ListenerId, Loaded, RequestHandle, ScrollEvent, ScrollOptions, Target, WeakInfiniteScroll};
use scroll_utils::errors::ScrollError;

use crate::transport::GlooTransport;
use crate::web_dom::{platform_error, WebDom};

const SCROLL_CONTAINER_KEY: &str = "scrollContainer";

type WebScroll = InfiniteScroll<WebDom, GlooTransport>;

fn js_error(error: ScrollError) -> JsError {
    JsError::new(&error.to_string())
}

fn set_property(object: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(object, &JsValue::from_str(key), value).map(|_| ())
}

fn items_to_js(items: &Items<Element>) -> Result<JsValue, JsValue> {
    match items {
        Items::Elements(elements) => Ok(elements.iter().collect::<Array>().into()),
        Items::Text(text) => Ok(JsValue::from_str(text)),
        Items::Json(value) => value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(JsValue::from),
    }
}

fn loaded_to_js(items: &Items<Element>, url: &str, request: &RequestHandle) -> Result<JsValue, JsValue> {
    let payload = Object::new();
    set_property(&payload, "items", &items_to_js(items)?)?;
    set_property(&payload, "url", &JsValue::from_str(url))?;
    set_property(&payload, "xhr", &PendingRequest::from(request.clone()).into())?;
    Ok(payload.into())
}

/// Arguments handed to javascript listeners: `({distance})` for `hit`, `(url, xhr)` for `load`,
/// `(items, url, xhr)` for `loaded` and none for the other events.
fn event_arguments(event: &ScrollEvent<Element>) -> Result<Array, JsValue> {
    let arguments = Array::new();
    match event {
        ScrollEvent::Hit { distance } => {
            let payload = Object::new();
            set_property(&payload, "distance", &JsValue::from_f64(*distance))?;
            arguments.push(&payload);
        },
        ScrollEvent::Load { url, request } => {
            arguments.push(&JsValue::from_str(url));
            arguments.push(&PendingRequest::from(request.clone()).into());
        },
        ScrollEvent::Loaded { items, url, request } => {
            arguments.push(&items_to_js(items)?);
            arguments.push(&JsValue::from_str(url));
            arguments.push(&PendingRequest::from(request.clone()).into());
        },
        _ => (),
    }
    Ok(arguments)
}

fn parse_event_name(event: &str) -> Result<EventName, JsError> {
    EventName::from_str(event).map_err(|_| JsError::new(&format!("Unknown event \"{event}\"")))
}

/// Splits a `window` or element `scrollContainer` off `options` and deserializes the rest.
fn parse_options(options: JsValue) -> Result<(Option<ScrollContainer<Element>>, ScrollOptions), JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok((None, ScrollOptions::default()));
    }

    let key = JsValue::from_str(SCROLL_CONTAINER_KEY);
    let value = Reflect::get(&options, &key).map_err(|e| js_error(platform_error(e)))?;
    let scroll_container = if value.is_instance_of::<Window>() {
        Some(ScrollContainer::Viewport)
    } else {
        value.dyn_ref::<Element>().map(|element| ScrollContainer::Element(element.clone()))
    };

    let options = match scroll_container.is_some() {
        true => {
            let remaining_options = Object::assign(&Object::new(), options.unchecked_ref());
            Reflect::delete_property(&remaining_options, &key).map_err(|e| js_error(platform_error(e)))?;
            remaining_options.into()
        },
        false => options,
    };
    let options = serde_wasm_bindgen::from_value(options)
        .map_err(|e| js_error(ScrollError::InvalidOptions(e.to_string())))?;
    Ok((scroll_container, options))
}

/// Request of a `load`, as seen by javascript listeners and rejections.
#[wasm_bindgen]
pub struct PendingRequest {
    handle: RequestHandle,
}

impl From<RequestHandle> for PendingRequest {
    fn from(handle: RequestHandle) -> Self {
        PendingRequest { handle }
    }
}

#[wasm_bindgen]
impl PendingRequest {
    #[wasm_bindgen(getter)]
    pub fn url(&self) -> String {
        self.handle.url()
    }

    /// Http status, `undefined` until a response arrived.
    #[wasm_bindgen(getter)]
    pub fn status(&self) -> Option<u16> {
        self.handle.status().map(|status| status.as_u16())
    }

    #[wasm_bindgen(getter, js_name = responseText)]
    pub fn response_text(&self) -> Option<String> {
        self.handle.response_text()
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.handle.error().map(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = setRequestHeader)]
    pub fn set_request_header(&self, name: &str, value: &str) -> Result<(), JsError> {
        self.handle.set_header(name, value).map_err(js_error)
    }
}

struct Subscription {
    event: EventName,
    callback: Function,
    id: ListenerId,
}

enum ScrollHandle {
    Owned(WebScroll),
    /// Handle given to listeners as `this`, it does not keep the controller alive.
    Context(WeakInfiniteScroll<WebDom, GlooTransport>),
}

/// Javascript handle on an infinite scroll bound to the browser document.
#[wasm_bindgen]
pub struct InfiniteAjaxScroll {
    handle: ScrollHandle,
    subscriptions: Rc<RefCell<Vec<Subscription>>>,
    context: Rc<RefCell<JsValue>>,
}

impl Drop for InfiniteAjaxScroll {
    fn drop(&mut self) {
        if let ScrollHandle::Owned(_) = self.handle {
            self.context.replace(JsValue::UNDEFINED);
            self.subscriptions.borrow_mut().clear();
        }
    }
}

impl InfiniteAjaxScroll {
    fn scroll(&self) -> Result<WebScroll, JsError> {
        match &self.handle {
            ScrollHandle::Owned(scroll) => Ok(scroll.clone()),
            ScrollHandle::Context(scroll) => scroll.upgrade().ok_or_else(|| JsError::new("Infinite scroll was dropped")),
        }
    }

    fn subscribe(&self, event: &str, callback: Function, once: bool) -> Result<(), JsError> {
        let event = parse_event_name(event)?;
        let scroll = self.scroll()?;
        let registered_id: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let listener = {
            let callback = callback.clone();
            let context = self.context.clone();
            let subscriptions = Rc::downgrade(&self.subscriptions);
            let registered_id = registered_id.clone();
            move |scroll_event: &ScrollEvent<Element>| {
                let this = context.borrow().clone();
                let result = event_arguments(scroll_event).and_then(|arguments| callback.apply(&this, &arguments));
                if let Err(e) = result {
                    log::error!("Error in {} listener: {}", scroll_event.name(), platform_error(e));
                }
                // The immediate `binded` run happens before the id is known and keeps the subscription.
                if let (true, Some(id), Some(subscriptions)) = (once, registered_id.get(), subscriptions.upgrade()) {
                    subscriptions.borrow_mut().retain(|subscription| subscription.id != id);
                }
            }
        };

        let id = match once {
            true => scroll.once(event, listener),
            false => scroll.on(event, listener),
        };
        registered_id.set(Some(id));
        self.subscriptions.borrow_mut().push(Subscription { event, callback, id });
        Ok(())
    }
}

#[wasm_bindgen]
impl InfiniteAjaxScroll {
    /// `container` is a selector or an element. `options` is a plain object using the camelCase
    /// keys, its `scrollContainer` may be `window`, an element or a selector.
    #[wasm_bindgen(constructor)]
    pub fn new(container: JsValue, options: JsValue) -> Result<InfiniteAjaxScroll, JsError> {
        let (scroll_container, options) = parse_options(options)?;
        let container = match container.dyn_into::<Element>() {
            Ok(element) => Target::Element(element),
            Err(value) => match value.as_string() {
                Some(selector) => Target::Selector(selector),
                None => return Err(JsError::new("Container must be a selector or an element")),
            },
        };

        let dom = Rc::new(WebDom::new().map_err(js_error)?);
        let scroll = match scroll_container {
            Some(scroll_container) => InfiniteScroll::with_scroll_container(dom, GlooTransport, container, scroll_container, options),
            None => InfiniteScroll::new(dom, GlooTransport, container, options),
        }.map_err(js_error)?;

        let subscriptions = Rc::new(RefCell::new(Vec::new()));
        let context = Rc::new(RefCell::new(JsValue::UNDEFINED));
        let context_handle = InfiniteAjaxScroll {
            handle: ScrollHandle::Context(scroll.downgrade()),
            subscriptions: subscriptions.clone(),
            context: context.clone(),
        };
        context.replace(context_handle.into());

        Ok(InfiniteAjaxScroll {
            handle: ScrollHandle::Owned(scroll),
            subscriptions,
            context,
        })
    }

    pub fn bind(&self) -> Result<(), JsError> {
        self.scroll()?.bind().map_err(js_error)
    }

    pub fn unbind(&self) -> Result<(), JsError> {
        self.scroll()?.unbind();
        Ok(())
    }

    #[wasm_bindgen(js_name = isBound)]
    pub fn is_bound(&self) -> bool {
        self.scroll().is_ok_and(|scroll| scroll.is_bound())
    }

    pub fn sentinel(&self) -> Result<Element, JsError> {
        self.scroll()?.sentinel().map_err(js_error)
    }

    /// Resolves with `{items, url, xhr}`, rejects with the [`PendingRequest`].
    pub fn load(&self, url: String) -> Promise {
        let scroll = match self.scroll() {
            Ok(scroll) => scroll,
            Err(e) => return Promise::reject(&e.into()),
        };
        future_to_promise(async move {
            match scroll.load(&url).await {
                Ok(Loaded { items, url, request }) => loaded_to_js(&items, &url, &request),
                Err(request) => Err(PendingRequest::from(request).into()),
            }
        })
    }

    pub fn on(&self, event: &str, callback: Function) -> Result<(), JsError> {
        self.subscribe(event, callback, false)
    }

    pub fn once(&self, event: &str, callback: Function) -> Result<(), JsError> {
        self.subscribe(event, callback, true)
    }

    /// Removes every subscription of `callback` to `event`.
    pub fn off(&self, event: &str, callback: Function) -> Result<(), JsError> {
        let event = parse_event_name(event)?;
        let scroll = self.scroll()?;
        self.subscriptions.borrow_mut().retain(|subscription| {
            match subscription.event == event && subscription.callback == callback {
                true => {
                    scroll.off(event, subscription.id);
                    false
                },
                false => true,
            }
        });
        Ok(())
    }
}
