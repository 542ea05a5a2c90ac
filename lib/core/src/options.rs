use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use scroll_utils::constants::WINDOW_TARGET;
use scroll_utils::errors::ScrollError;

/// How the body of a fetched page is handed to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Parse the body as html and extract the elements matching the item selector.
    #[default]
    Document,
    Text,
    Json,
}

/// Scroll context given in the options: the global viewport or a selector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ScrollTarget {
    #[default]
    Window,
    Selector(String),
}

impl From<&str> for ScrollTarget {
    fn from(value: &str) -> Self {
        match value {
            WINDOW_TARGET => ScrollTarget::Window,
            selector => ScrollTarget::Selector(selector.to_string()),
        }
    }
}

impl Serialize for ScrollTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScrollTarget::Window => serializer.serialize_str(WINDOW_TARGET),
            ScrollTarget::Selector(selector) => serializer.serialize_str(selector),
        }
    }
}

impl<'de> Deserialize<'de> for ScrollTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(ScrollTarget::from(value.as_str()))
    }
}

/// Option handed back to the caller as given: a flag, one selector, several selectors or an
/// object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorOption {
    Flag(bool),
    Selector(String),
    Selectors(Vec<String>),
    Object(Map<String, Value>),
}

impl From<&str> for SelectorOption {
    fn from(selector: &str) -> Self {
        SelectorOption::Selector(selector.to_string())
    }
}

impl From<bool> for SelectorOption {
    fn from(flag: bool) -> Self {
        SelectorOption::Flag(flag)
    }
}

/// Options of an [`InfiniteScroll`](crate::controller::InfiniteScroll).
///
/// Missing keys keep their default value, which is how options given by a caller are merged
/// over the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollOptions {
    /// Selector of the page items, the last one is the sentinel.
    pub item: String,
    /// Pagination controls, left to the caller.
    pub pagination: SelectorOption,
    /// Next page link, left to the caller.
    pub next: SelectorOption,
    pub response_type: ResponseType,
    /// Bind the scroll and resize listeners when the controller is built.
    pub bind: bool,
    pub scroll_container: ScrollTarget,
    /// Whether the caller shows a spinner while loading.
    pub spinner: bool,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        ScrollOptions {
            item: String::new(),
            pagination: SelectorOption::Object(Map::new()),
            next: SelectorOption::Selector(String::new()),
            response_type: ResponseType::Document,
            bind: true,
            scroll_container: ScrollTarget::Window,
            spinner: false,
        }
    }
}

impl ScrollOptions {
    pub fn new(item: impl Into<String>) -> Self {
        ScrollOptions {
            item: item.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ScrollError> {
        serde_json::from_str(json).map_err(|e| ScrollError::InvalidOptions(e.to_string()))
    }

    pub fn with_pagination(mut self, pagination: impl Into<SelectorOption>) -> Self {
        self.pagination = pagination.into();
        self
    }

    pub fn with_next(mut self, next: impl Into<SelectorOption>) -> Self {
        self.next = next.into();
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_bind(mut self, bind: bool) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_scroll_container(mut self, scroll_container: impl Into<ScrollTarget>) -> Self {
        self.scroll_container = scroll_container.into();
        self
    }

    pub fn with_spinner(mut self, spinner: bool) -> Self {
        self.spinner = spinner;
        self
    }
}
