use std::fmt::Debug;
use std::rc::Rc;

use scroll_utils::constants::CSS1_COMPAT_MODE;
use scroll_utils::errors::ScrollError;
use strum_macros::{AsRefStr, Display, EnumString};

/// Function attached to a scroll or resize event. An error is handed back to the dispatcher.
pub type ListenerCallback = Rc<dyn Fn() -> Result<(), ScrollError>>;

/// Function run once when a timer elapses. An error is handed back to the timer loop.
pub type TimerCallback = Box<dyn FnOnce() -> Result<(), ScrollError>>;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Builds a rect from its top left corner and its size.
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Rect {
            top,
            left,
            right: left + width,
            bottom: top + height,
            width,
            height,
        }
    }
}

/// Rendering mode of the document, drives where the viewport scroll offsets are read from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompatMode {
    #[default]
    Css1Compat,
    BackCompat,
}

impl CompatMode {
    pub fn from_document_mode(mode: &str) -> Self {
        match mode {
            CSS1_COMPAT_MODE => CompatMode::Css1Compat,
            _ => CompatMode::BackCompat,
        }
    }
}

/// Scroll offsets and client size of the `<html>` or `<body>` box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxMetrics {
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub client_width: f64,
    pub client_height: f64,
}

/// Everything the geometry needs to know about the global viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportMetrics {
    /// `pageXOffset`/`pageYOffset`, when the host exposes them.
    pub page_offset: Option<ScrollPosition>,
    pub compat_mode: CompatMode,
    pub document_element: Option<BoxMetrics>,
    pub body: Option<BoxMetrics>,
}

/// Scrolling context: either one element or the global viewport.
#[derive(Clone, Debug, PartialEq)]
pub enum ScrollContainer<E> {
    Viewport,
    Element(E),
}

impl<E> ScrollContainer<E> {
    pub fn is_viewport(&self) -> bool {
        matches!(self, ScrollContainer::Viewport)
    }
}

/// Raw event a listener is attached to.
#[derive(Clone, Copy, Debug, Display, EnumString, AsRefStr, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum ListenerKind {
    Scroll,
    Resize,
}

/// Access to the document the controller works on.
///
/// The browser implementation lives in the `frontend` crate, tests use an in-memory tree.
pub trait Dom {
    type Element: Clone + Debug + PartialEq + 'static;
    type ListenerHandle;

    /// Every element matching `selector` below `root` (the whole document when `None`), in document order.
    fn query_all(&self, selector: &str, root: Option<&Self::Element>) -> Result<Vec<Self::Element>, ScrollError>;

    fn scroll_offsets(&self, element: &Self::Element) -> ScrollPosition;

    fn bounding_client_rect(&self, element: &Self::Element) -> Rect;

    fn viewport_metrics(&self) -> ViewportMetrics;

    /// Parses `markup` as an html document and returns its root, ready for [`Dom::query_all`].
    fn parse_document(&self, markup: &str) -> Result<Self::Element, ScrollError>;

    fn add_listener(
        &self,
        target: &ScrollContainer<Self::Element>,
        kind: ListenerKind,
        callback: ListenerCallback,
    ) -> Result<Self::ListenerHandle, ScrollError>;

    fn remove_listener(&self, handle: Self::ListenerHandle);
}

/// Clock and timers of the event loop.
pub trait Scheduler {
    type TimerHandle;

    /// Milliseconds since the unix epoch.
    fn now_ms(&self) -> f64;

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> Result<Self::TimerHandle, ScrollError>;

    fn clear_timeout(&self, handle: Self::TimerHandle);
}
