//! Infinite scrolling: detects when the last item of a container comes near the fold and
//! loads the next page, reporting every step through events.
//!
//! The document, the event loop and the network are reached through the [`dom::Dom`],
//! [`dom::Scheduler`] and [`loader::Transport`] traits.

pub mod binding;
pub mod controller;
pub mod dom;
pub mod emitter;
pub mod event;
pub mod geometry;
pub mod loader;
pub mod options;
pub mod throttle;
#[cfg(feature = "reqwest")]
pub mod transport;

pub use binding::BindState;
pub use controller::{InfiniteScroll, Target, WeakInfiniteScroll};
pub use emitter::ListenerId;
pub use event::{EventName, ScrollEvent};
pub use loader::{Items, Loaded, RequestHandle, Transport};
pub use options::{ResponseType, ScrollOptions, ScrollTarget, SelectorOption};
