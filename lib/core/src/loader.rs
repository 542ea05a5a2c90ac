use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};

use scroll_utils::constants::{REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE, REQUEST_FAILED_MESSAGE};
use scroll_utils::errors::ScrollError;

use crate::controller::InfiniteScroll;
use crate::dom::{Dom, Scheduler};
use crate::event::ScrollEvent;
use crate::options::ResponseType;

/// Outgoing request, as handed to a [`Transport`].
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub response_type: ResponseType,
}

impl Request {
    pub fn get(url: impl Into<String>, response_type: ResponseType) -> Self {
        Request {
            method: Method::GET,
            url: url.into(),
            headers: HeaderMap::new(),
            response_type,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: String,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Response {
            status,
            body: body.into(),
        }
    }
}

/// Network access used by [`InfiniteScroll::load`].
#[async_trait(?Send)]
pub trait Transport {
    /// Sends `request` and returns the response whatever its status.
    /// Errors are reserved to requests that did not complete.
    async fn send(&self, request: Request) -> Result<Response, ScrollError>;
}

#[async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for Rc<T> {
    async fn send(&self, request: Request) -> Result<Response, ScrollError> {
        (**self).send(request).await
    }
}

#[derive(Debug)]
struct RequestState {
    request: Request,
    status: Option<StatusCode>,
    body: Option<String>,
    error: Option<ScrollError>,
}

/// Shared handle on one request cycle.
///
/// Listeners of the `load` event can still change the request through it, once the request
/// completed it exposes the status, the body and the cause of a failure.
#[derive(Clone, Debug)]
pub struct RequestHandle(Rc<RefCell<RequestState>>);

impl RequestHandle {
    pub fn new(request: Request) -> Self {
        RequestHandle(Rc::new(RefCell::new(RequestState {
            request,
            status: None,
            body: None,
            error: None,
        })))
    }

    pub fn url(&self) -> String {
        self.0.borrow().request.url.clone()
    }

    pub fn method(&self) -> Method {
        self.0.borrow().request.method.clone()
    }

    pub fn response_type(&self) -> ResponseType {
        self.0.borrow().request.response_type
    }

    pub fn headers(&self) -> HeaderMap {
        self.0.borrow().request.headers.clone()
    }

    pub fn set_header(&self, name: &str, value: &str) -> Result<(), ScrollError> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        self.0.borrow_mut().request.headers.insert(name, value);
        Ok(())
    }

    /// Status of the response, `None` until a response arrived.
    pub fn status(&self) -> Option<StatusCode> {
        self.0.borrow().status
    }

    pub fn response_text(&self) -> Option<String> {
        self.0.borrow().body.clone()
    }

    pub fn error(&self) -> Option<ScrollError> {
        self.0.borrow().error.clone()
    }

    pub fn same_request(&self, other: &RequestHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn request(&self) -> Request {
        self.0.borrow().request.clone()
    }

    fn complete(&self, response: Response) {
        let mut state = self.0.borrow_mut();
        state.status = Some(response.status);
        state.body = Some(response.body);
    }

    fn fail(&self, error: ScrollError) {
        self.0.borrow_mut().error = Some(error);
    }
}

/// Content extracted from a fetched page.
#[derive(Clone, Debug, PartialEq)]
pub enum Items<E> {
    Elements(Vec<E>),
    Text(String),
    Json(serde_json::Value),
}

impl<E> Items<E> {
    pub fn elements(&self) -> Option<&[E]> {
        match self {
            Items::Elements(elements) => Some(elements),
            _ => None,
        }
    }
}

/// Result of a successful [`InfiniteScroll::load`].
#[derive(Clone, Debug)]
pub struct Loaded<E> {
    pub items: Items<E>,
    pub url: String,
    pub request: RequestHandle,
}

/// Appends `timestamp` as query so that the browser cache is bypassed.
pub fn cache_busted_url(url: &str, timestamp: u64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{timestamp}")
}

impl<D, T> InfiniteScroll<D, T>
where
    D: Dom + Scheduler + 'static,
    T: Transport + 'static,
{
    /// Fetches `url` and extracts its items.
    ///
    /// Emits `load` before the request is sent and `loaded` once it succeeded. Any status other
    /// than 200 rejects with the request handle, no retry is made.
    pub async fn load(&self, url: &str) -> Result<Loaded<D::Element>, RequestHandle> {
        let inner = &self.inner;
        let url = cache_busted_url(url, inner.dom.now_ms() as u64);
        let request = RequestHandle::new(Request::get(url.clone(), inner.options.response_type));
        if let Err(e) = request.set_header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE) {
            return Err(self.reject(request, e));
        }

        inner.emitter.emit(&ScrollEvent::Load { url: url.clone(), request: request.clone() });

        log::debug!("Load next page: {url}");
        match inner.transport.send(request.request()).await {
            Ok(response) => request.complete(response),
            Err(e) => return Err(self.reject(request, e)),
        }

        if request.status() != Some(StatusCode::OK) {
            let status = request.status().map(|status| status.to_string()).unwrap_or_default();
            return Err(self.reject(request, ScrollError::RequestFailed(status)));
        }

        let items = match self.extract_items(&request) {
            Ok(items) => items,
            Err(e) => return Err(self.reject(request, e)),
        };

        inner.emitter.emit(&ScrollEvent::Loaded {
            items: items.clone(),
            url: url.clone(),
            request: request.clone(),
        });

        Ok(Loaded { items, url, request })
    }

    fn extract_items(&self, request: &RequestHandle) -> Result<Items<D::Element>, ScrollError> {
        let body = request.response_text().unwrap_or_default();
        match self.inner.options.response_type {
            ResponseType::Document => {
                let document = self.inner.dom.parse_document(&body)?;
                let elements = self.inner.dom.query_all(&self.inner.options.item, Some(&document))?;
                Ok(Items::Elements(elements))
            },
            ResponseType::Text => Ok(Items::Text(body)),
            ResponseType::Json => serde_json::from_str(&body)
                .map(Items::Json)
                .map_err(|e| ScrollError::ResponseParse(e.to_string())),
        }
    }

    fn reject(&self, request: RequestHandle, error: ScrollError) -> RequestHandle {
        log::error!("{REQUEST_FAILED_MESSAGE}: {} ({error})", request.url());
        request.fail(error);
        request
    }
}
