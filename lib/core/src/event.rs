use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::loader::{Items, RequestHandle};

#[derive(Clone, Copy, Debug, Display, EnumString, EnumIter, AsRefStr, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum EventName {
    Binded,
    Unbinded,
    Scrolled,
    Resized,
    Hit,
    Load,
    Loaded,
}

/// Lifecycle event emitted by an [`InfiniteScroll`](crate::controller::InfiniteScroll).
#[derive(Clone, Debug)]
pub enum ScrollEvent<E> {
    Binded,
    Unbinded,
    Scrolled,
    Resized,
    /// The sentinel reached the fold, `distance` is zero or negative.
    Hit {
        distance: f64,
    },
    /// A request is about to be sent, listeners may still change it.
    Load {
        url: String,
        request: RequestHandle,
    },
    Loaded {
        items: Items<E>,
        url: String,
        request: RequestHandle,
    },
}

impl<E> ScrollEvent<E> {
    pub fn name(&self) -> EventName {
        match self {
            ScrollEvent::Binded => EventName::Binded,
            ScrollEvent::Unbinded => EventName::Unbinded,
            ScrollEvent::Scrolled => EventName::Scrolled,
            ScrollEvent::Resized => EventName::Resized,
            ScrollEvent::Hit { .. } => EventName::Hit,
            ScrollEvent::Load { .. } => EventName::Load,
            ScrollEvent::Loaded { .. } => EventName::Loaded,
        }
    }
}
