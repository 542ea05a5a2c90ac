use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use scroll_utils::constants::{CONTAINER_PROPERTY, SCROLL_CONTAINER_PROPERTY};
use scroll_utils::errors::ScrollError;

use crate::binding::{BindState, Binding};
use crate::dom::{Dom, Scheduler, ScrollContainer};
use crate::emitter::{Emitter, EventCallback, ListenerId};
use crate::event::{EventName, ScrollEvent};
use crate::loader::Transport;
use crate::options::{ScrollOptions, ScrollTarget};

/// Element given to the controller, either directly or through a selector.
#[derive(Clone, Debug, PartialEq)]
pub enum Target<E> {
    Selector(String),
    Element(E),
}

impl<E> From<&str> for Target<E> {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl<E> From<String> for Target<E> {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

pub(crate) struct Inner<D: Dom + Scheduler + 'static, T> {
    pub(crate) dom: Rc<D>,
    pub(crate) transport: T,
    pub(crate) options: ScrollOptions,
    pub(crate) container: D::Element,
    pub(crate) scroll_container: ScrollContainer<D::Element>,
    pub(crate) state: Cell<BindState>,
    pub(crate) bindings: RefCell<Vec<Binding<D>>>,
    pub(crate) emitter: Emitter<D::Element>,
}

impl<D: Dom + Scheduler + 'static, T> Drop for Inner<D, T> {
    fn drop(&mut self) {
        // Listeners reference the host, release them so the host does not outlive its controllers.
        for binding in self.bindings.get_mut().drain(..) {
            binding.release(&self.dom);
        }
    }
}

/// Watches a scroll container and loads the next page when the last item comes into view.
///
/// Cloning gives another handle on the same controller.
pub struct InfiniteScroll<D: Dom + Scheduler + 'static, T> {
    pub(crate) inner: Rc<Inner<D, T>>,
}

impl<D: Dom + Scheduler + 'static, T> Clone for InfiniteScroll<D, T> {
    fn clone(&self) -> Self {
        InfiniteScroll { inner: self.inner.clone() }
    }
}

/// Handle that does not keep the controller alive, meant to be captured by event callbacks.
pub struct WeakInfiniteScroll<D: Dom + Scheduler + 'static, T> {
    inner: Weak<Inner<D, T>>,
}

impl<D: Dom + Scheduler + 'static, T> Clone for WeakInfiniteScroll<D, T> {
    fn clone(&self) -> Self {
        WeakInfiniteScroll { inner: self.inner.clone() }
    }
}

impl<D: Dom + Scheduler + 'static, T> WeakInfiniteScroll<D, T> {
    pub fn upgrade(&self) -> Option<InfiniteScroll<D, T>> {
        self.inner.upgrade().map(|inner| InfiniteScroll { inner })
    }
}

fn resolve_single_element<D: Dom>(
    dom: &D,
    target: Target<D::Element>,
    property: &str,
) -> Result<D::Element, ScrollError> {
    match target {
        Target::Element(element) => Ok(element),
        Target::Selector(selector) => {
            let mut elements = dom.query_all(&selector, None)?;
            if elements.len() > 1 {
                return Err(ScrollError::AmbiguousElement { property: property.to_string() });
            }
            elements.pop().ok_or_else(|| ScrollError::ElementNotFound {
                selector,
                property: property.to_string(),
            })
        }
    }
}

impl<D, T> InfiniteScroll<D, T>
where
    D: Dom + Scheduler + 'static,
    T: Transport + 'static,
{
    /// Builds a controller on `container`.
    ///
    /// `container` and the scroll container of `options`, unless it is the window, must each
    /// resolve to exactly one element. Listeners are bound right away when `options.bind` is set.
    pub fn new(
        dom: Rc<D>,
        transport: T,
        container: impl Into<Target<D::Element>>,
        options: ScrollOptions,
    ) -> Result<Self, ScrollError> {
        let container = resolve_single_element(&*dom, container.into(), CONTAINER_PROPERTY)?;
        let scroll_container = match &options.scroll_container {
            ScrollTarget::Window => ScrollContainer::Viewport,
            ScrollTarget::Selector(selector) => ScrollContainer::Element(
                resolve_single_element(&*dom, Target::Selector(selector.clone()), SCROLL_CONTAINER_PROPERTY)?
            ),
        };
        Self::build(dom, transport, container, scroll_container, options)
    }

    /// Same as [`InfiniteScroll::new`] with the scroll container given directly, the
    /// `scroll_container` of `options` is then ignored.
    pub fn with_scroll_container(
        dom: Rc<D>,
        transport: T,
        container: impl Into<Target<D::Element>>,
        scroll_container: ScrollContainer<D::Element>,
        options: ScrollOptions,
    ) -> Result<Self, ScrollError> {
        let container = resolve_single_element(&*dom, container.into(), CONTAINER_PROPERTY)?;
        Self::build(dom, transport, container, scroll_container, options)
    }

    fn build(
        dom: Rc<D>,
        transport: T,
        container: D::Element,
        scroll_container: ScrollContainer<D::Element>,
        options: ScrollOptions,
    ) -> Result<Self, ScrollError> {
        let infinite_scroll = InfiniteScroll {
            inner: Rc::new(Inner {
                dom,
                transport,
                options,
                container,
                scroll_container,
                state: Cell::new(BindState::Unbound),
                bindings: RefCell::new(Vec::new()),
                emitter: Emitter::new(),
            }),
        };

        if infinite_scroll.inner.options.bind {
            infinite_scroll.bind()?;
        }

        Ok(infinite_scroll)
    }

    /// Last item of the container, recomputed on every call.
    pub fn sentinel(&self) -> Result<D::Element, ScrollError> {
        let item = &self.inner.options.item;
        let mut items = self.inner.dom.query_all(item, Some(&self.inner.container))?;
        items.pop().ok_or_else(|| ScrollError::ItemNotFound(item.clone()))
    }

    /// Subscribes `callback` to `event`.
    ///
    /// Subscribing to [`EventName::Binded`] while bound also runs `callback` right away, so a late
    /// subscriber still learns that listeners are in place.
    pub fn on(&self, event: EventName, callback: impl Fn(&ScrollEvent<D::Element>) + 'static) -> ListenerId {
        let callback: EventCallback<D::Element> = Rc::new(callback);
        let id = self.inner.emitter.on(event, callback.clone());
        self.replay_binded(event, &callback);
        id
    }

    /// Same as [`InfiniteScroll::on`] but the subscription is dropped after its first emission.
    /// The immediate run for [`EventName::Binded`] does not count as that emission.
    pub fn once(&self, event: EventName, callback: impl Fn(&ScrollEvent<D::Element>) + 'static) -> ListenerId {
        let callback: EventCallback<D::Element> = Rc::new(callback);
        let id = self.inner.emitter.once(event, callback.clone());
        self.replay_binded(event, &callback);
        id
    }

    pub fn off(&self, event: EventName, id: ListenerId) -> bool {
        self.inner.emitter.off(event, id)
    }

    pub fn is_bound(&self) -> bool {
        self.inner.state.get() == BindState::Bound
    }

    pub fn bind_state(&self) -> BindState {
        self.inner.state.get()
    }

    pub fn options(&self) -> &ScrollOptions {
        &self.inner.options
    }

    pub fn container(&self) -> &D::Element {
        &self.inner.container
    }

    pub fn scroll_container(&self) -> &ScrollContainer<D::Element> {
        &self.inner.scroll_container
    }

    pub fn downgrade(&self) -> WeakInfiniteScroll<D, T> {
        WeakInfiniteScroll { inner: Rc::downgrade(&self.inner) }
    }

    fn replay_binded(&self, event: EventName, callback: &EventCallback<D::Element>) {
        if event == EventName::Binded && self.is_bound() {
            callback(&ScrollEvent::Binded);
        }
    }
}
