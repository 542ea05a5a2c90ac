#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use http::StatusCode;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use infinite_scroll::dom::{BoxMetrics, Dom, ListenerCallback, ListenerKind, Rect, Scheduler, ScrollContainer, ScrollPosition, TimerCallback, ViewportMetrics};
use infinite_scroll::loader::{Request, Response, Transport};
use infinite_scroll::{EventName, InfiniteScroll, ScrollEvent, ScrollOptions};
use scroll_utils::errors::ScrollError;

pub const START_TIME_MS: f64 = 1_700_000_000_000.0;
pub const VIEWPORT_WIDTH: f64 = 1024.0;
pub const VIEWPORT_HEIGHT: f64 = 768.0;
pub const ITEM_HEIGHT: f64 = 100.0;

pub type TestScroll = InfiniteScroll<FakeDom, Rc<FakeTransport>>;

pub struct FakeNode {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    children: RefCell<Vec<FakeElement>>,
    rect: Cell<Rect>,
    scroll: Cell<ScrollPosition>,
}

/// Element of the in-memory document, compared by identity.
#[derive(Clone)]
pub struct FakeElement(Rc<FakeNode>);

impl PartialEq for FakeElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.tag)?;
        if let Some(id) = &self.0.id {
            write!(f, "#{id}")?;
        }
        for class in &self.0.classes {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

impl FakeElement {
    pub fn new(tag: &str, id: Option<&str>, classes: &[&str]) -> Self {
        FakeElement(Rc::new(FakeNode {
            tag: tag.to_string(),
            id: id.map(String::from),
            classes: classes.iter().map(|class| class.to_string()).collect(),
            children: RefCell::new(Vec::new()),
            rect: Cell::new(Rect::default()),
            scroll: Cell::new(ScrollPosition::default()),
        }))
    }

    /// Appends `child` and returns it.
    pub fn append(&self, child: FakeElement) -> FakeElement {
        self.0.children.borrow_mut().push(child.clone());
        child
    }

    pub fn children(&self) -> Vec<FakeElement> {
        self.0.children.borrow().clone()
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.0.id.as_deref()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.0.classes.iter().any(|own_class| own_class == class)
    }

    pub fn set_rect(&self, rect: Rect) {
        self.0.rect.set(rect);
    }

    pub fn set_scroll(&self, x: f64, y: f64) {
        self.0.scroll.set(ScrollPosition { x, y });
    }

    fn matches(&self, selector: &SimpleSelector) -> bool {
        selector.tag.as_ref().is_none_or(|tag| *tag == self.0.tag) &&
            selector.id.as_ref().is_none_or(|id| self.0.id.as_ref() == Some(id)) &&
            selector.classes.iter().all(|class| self.has_class(class))
    }

    fn collect_matches(&self, selector: &SimpleSelector, matches: &mut Vec<FakeElement>) {
        for child in self.0.children.borrow().iter() {
            if child.matches(selector) {
                matches.push(child.clone());
            }
            child.collect_matches(selector, matches);
        }
    }
}

/// Compound selector made of an optional tag, an optional id and classes, e.g. `li#first.item`.
#[derive(Debug, Default)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

fn parse_selector(selector: &str) -> Result<SimpleSelector, ScrollError> {
    let invalid = || ScrollError::InvalidSelector(selector.to_string());
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut parsed = SimpleSelector::default();
    let mut prefix: Option<char> = None;
    let mut token = String::new();
    let flush = |prefix: Option<char>, token: &mut String, parsed: &mut SimpleSelector| -> Result<(), ScrollError> {
        if token.is_empty() {
            return match prefix {
                None => Ok(()),
                Some(_) => Err(invalid()),
            };
        }
        let value = std::mem::take(token);
        match prefix {
            None => parsed.tag = Some(value),
            Some('#') => parsed.id = Some(value),
            Some(_) => parsed.classes.push(value),
        }
        Ok(())
    };

    for character in trimmed.chars() {
        match character {
            '#' | '.' => {
                flush(prefix, &mut token, &mut parsed)?;
                prefix = Some(character);
            },
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => token.push(c),
            _ => return Err(invalid()),
        }
    }
    flush(prefix, &mut token, &mut parsed)?;
    Ok(parsed)
}

/// Parses well-formed markup into a detached document.
pub fn parse_markup(markup: &str) -> Result<FakeElement, ScrollError> {
    let document = FakeElement::new("#document", None, &[]);
    let mut open_elements = vec![document.clone()];
    let mut reader = Reader::from_str(markup);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let element = element_from_tag(&start)?;
                if let Some(parent) = open_elements.last() {
                    parent.append(element.clone());
                }
                open_elements.push(element);
            },
            Ok(Event::Empty(start)) => {
                let element = element_from_tag(&start)?;
                if let Some(parent) = open_elements.last() {
                    parent.append(element);
                }
            },
            Ok(Event::End(_)) => {
                if open_elements.len() > 1 {
                    open_elements.pop();
                }
            },
            Ok(Event::Eof) => break,
            Ok(_) => (),
            Err(e) => return Err(ScrollError::ResponseParse(e.to_string())),
        }
    }
    Ok(document)
}

fn element_from_tag(start: &BytesStart) -> Result<FakeElement, ScrollError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut id = None;
    let mut classes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ScrollError::ResponseParse(e.to_string()))?;
        let value = attribute.unescape_value().map_err(|e| ScrollError::ResponseParse(e.to_string()))?.to_string();
        match attribute.key.as_ref() {
            b"id" => id = Some(value),
            b"class" => classes = value.split_whitespace().map(String::from).collect(),
            _ => (),
        }
    }
    let classes: Vec<&str> = classes.iter().map(String::as_str).collect();
    Ok(FakeElement::new(&tag, id.as_deref(), &classes))
}

struct FakeListener {
    id: usize,
    target: ScrollContainer<FakeElement>,
    kind: ListenerKind,
    callback: ListenerCallback,
}

struct FakeTimer {
    id: usize,
    due: f64,
    callback: TimerCallback,
}

/// In-memory document with a manual clock.
pub struct FakeDom {
    pub document: FakeElement,
    viewport: Cell<ViewportMetrics>,
    now: Cell<f64>,
    next_id: Cell<usize>,
    listeners: RefCell<Vec<FakeListener>>,
    timers: RefCell<Vec<FakeTimer>>,
}

impl FakeDom {
    pub fn new() -> Rc<Self> {
        let html_box = BoxMetrics {
            client_width: VIEWPORT_WIDTH,
            client_height: VIEWPORT_HEIGHT,
            ..Default::default()
        };
        Rc::new(FakeDom {
            document: FakeElement::new("#document", None, &[]),
            viewport: Cell::new(ViewportMetrics {
                page_offset: Some(ScrollPosition::default()),
                document_element: Some(html_box),
                body: Some(BoxMetrics::default()),
                ..Default::default()
            }),
            now: Cell::new(START_TIME_MS),
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
            timers: RefCell::new(Vec::new()),
        })
    }

    pub fn set_viewport(&self, viewport: ViewportMetrics) {
        self.viewport.set(viewport);
    }

    pub fn set_page_offset(&self, y: f64) {
        let mut viewport = self.viewport.get();
        viewport.page_offset = Some(ScrollPosition { x: 0.0, y });
        self.viewport.set(viewport);
    }

    /// Runs the listeners of `kind` attached to `target`, as the browser would on a raw event.
    pub fn dispatch(&self, target: &ScrollContainer<FakeElement>, kind: ListenerKind) -> Result<(), ScrollError> {
        let callbacks: Vec<ListenerCallback> = self.listeners.borrow().iter()
            .filter(|listener| listener.target == *target && listener.kind == kind)
            .map(|listener| listener.callback.clone())
            .collect();
        for callback in callbacks {
            callback()?;
        }
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn pending_timer_count(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn now(&self) -> f64 {
        self.now.get()
    }

    /// Moves the clock forward, running due timers in order. Stops at the first failing timer.
    pub fn advance(&self, delay_ms: f64) -> Result<(), ScrollError> {
        let target = self.now.get() + delay_ms;
        loop {
            let next_timer = {
                let mut timers = self.timers.borrow_mut();
                let next_index = timers.iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by(|(_, l), (_, r)| l.due.total_cmp(&r.due))
                    .map(|(index, _)| index);
                next_index.map(|index| timers.remove(index))
            };
            match next_timer {
                Some(timer) => {
                    self.now.set(timer.due);
                    (timer.callback)()?;
                },
                None => break,
            }
        }
        self.now.set(target);
        Ok(())
    }

    fn next_id(&self) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl Dom for FakeDom {
    type Element = FakeElement;
    type ListenerHandle = usize;

    fn query_all(&self, selector: &str, root: Option<&FakeElement>) -> Result<Vec<FakeElement>, ScrollError> {
        let selector = parse_selector(selector)?;
        let mut matches = Vec::new();
        root.unwrap_or(&self.document).collect_matches(&selector, &mut matches);
        Ok(matches)
    }

    fn scroll_offsets(&self, element: &FakeElement) -> ScrollPosition {
        element.0.scroll.get()
    }

    fn bounding_client_rect(&self, element: &FakeElement) -> Rect {
        element.0.rect.get()
    }

    fn viewport_metrics(&self) -> ViewportMetrics {
        self.viewport.get()
    }

    fn parse_document(&self, markup: &str) -> Result<FakeElement, ScrollError> {
        parse_markup(markup)
    }

    fn add_listener(
        &self,
        target: &ScrollContainer<FakeElement>,
        kind: ListenerKind,
        callback: ListenerCallback,
    ) -> Result<usize, ScrollError> {
        let id = self.next_id();
        self.listeners.borrow_mut().push(FakeListener { id, target: target.clone(), kind, callback });
        Ok(id)
    }

    fn remove_listener(&self, handle: usize) {
        self.listeners.borrow_mut().retain(|listener| listener.id != handle);
    }
}

impl Scheduler for FakeDom {
    type TimerHandle = usize;

    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> Result<usize, ScrollError> {
        let id = self.next_id();
        self.timers.borrow_mut().push(FakeTimer { id, due: self.now.get() + delay_ms, callback });
        Ok(id)
    }

    fn clear_timeout(&self, handle: usize) {
        self.timers.borrow_mut().retain(|timer| timer.id != handle);
    }
}

/// Transport answering with scripted responses and keeping every request it was given.
#[derive(Default)]
pub struct FakeTransport {
    responses: RefCell<VecDeque<Result<Response, ScrollError>>>,
    requests: RefCell<Vec<Request>>,
}

impl FakeTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn push_response(&self, status: StatusCode, body: &str) {
        self.responses.borrow_mut().push_back(Ok(Response::new(status, body)));
    }

    pub fn push_error(&self, error: ScrollError) {
        self.responses.borrow_mut().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Transport for FakeTransport {
    async fn send(&self, request: Request) -> Result<Response, ScrollError> {
        self.requests.borrow_mut().push(request);
        self.responses.borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ScrollError::RequestFailed(String::from("no scripted response"))))
    }
}

/// Document with `<body><div id="feed">` holding `item_count` `div.item` laid out from the top of the page.
pub struct TestPage {
    pub dom: Rc<FakeDom>,
    pub transport: Rc<FakeTransport>,
    pub body: FakeElement,
    pub feed: FakeElement,
}

impl TestPage {
    pub fn new(item_count: usize) -> Self {
        let dom = FakeDom::new();
        let html = dom.document.append(FakeElement::new("html", None, &[]));
        let body = html.append(FakeElement::new("body", None, &[]));
        let feed = body.append(FakeElement::new("div", Some("feed"), &[]));
        let page = TestPage {
            dom,
            transport: FakeTransport::new(),
            body,
            feed,
        };
        for _ in 0..item_count {
            page.append_item();
        }
        page.layout();
        page
    }

    pub fn items(&self) -> Vec<FakeElement> {
        self.feed.children()
    }

    pub fn append_item(&self) -> FakeElement {
        let item = self.feed.append(FakeElement::new("div", None, &["item"]));
        self.layout();
        item
    }

    /// Scrolls the window to `y` and moves the items accordingly.
    pub fn scroll_window_to(&self, y: f64) {
        self.dom.set_page_offset(y);
        self.layout();
    }

    /// Window offset at which the bottom of the last item meets the bottom of the viewport.
    pub fn fold_offset(&self) -> f64 {
        self.items().len() as f64 * ITEM_HEIGHT - VIEWPORT_HEIGHT
    }

    pub fn scroll(&self, options: ScrollOptions) -> Result<TestScroll, ScrollError> {
        InfiniteScroll::new(self.dom.clone(), self.transport.clone(), "#feed", options)
    }

    fn layout(&self) {
        let scroll_y = self.dom.viewport_metrics().page_offset.unwrap_or_default().y;
        for (index, item) in self.items().iter().enumerate() {
            item.set_rect(Rect::new(index as f64 * ITEM_HEIGHT - scroll_y, 0.0, VIEWPORT_WIDTH, ITEM_HEIGHT));
        }
    }
}

/// Records the events of `names` as strings, `hit` with its distance.
pub fn record_events(scroll: &TestScroll, names: &[EventName]) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for name in names {
        let event_log = log.clone();
        scroll.on(*name, move |event| {
            let entry = match event {
                ScrollEvent::Hit { distance } => format!("hit:{distance}"),
                ScrollEvent::Load { url, .. } => format!("load:{url}"),
                ScrollEvent::Loaded { url, .. } => format!("loaded:{url}"),
                other => other.name().to_string(),
            };
            event_log.borrow_mut().push(entry);
        });
    }
    log
}
