use std::rc::Rc;

use scroll_utils::constants::SCROLL_THROTTLE_DELAY_MS;
use scroll_utils::errors::ScrollError;

use crate::controller::InfiniteScroll;
use crate::dom::{Dom, ListenerKind, Scheduler};
use crate::event::ScrollEvent;
use crate::geometry::get_distance_to_fold;
use crate::loader::Transport;
use crate::throttle::Throttle;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BindState {
    #[default]
    Unbound,
    Bound,
}

/// Listener registered by one controller, owned by that controller.
pub(crate) struct Binding<D: Dom + Scheduler + 'static> {
    kind: ListenerKind,
    listener: D::ListenerHandle,
    throttle: Throttle<D>,
}

impl<D: Dom + Scheduler + 'static> Binding<D> {
    pub(crate) fn release(self, dom: &D) {
        self.throttle.cancel();
        dom.remove_listener(self.listener);
    }
}

impl<D, T> InfiniteScroll<D, T>
where
    D: Dom + Scheduler + 'static,
    T: Transport + 'static,
{
    /// Attaches throttled scroll and resize listeners to the scroll container and emits `binded`.
    ///
    /// Binding is not idempotent: binding again without unbinding registers another pair of
    /// listeners and every scroll is then reported once per pair. Unbinding releases all of them.
    pub fn bind(&self) -> Result<(), ScrollError> {
        let inner = &self.inner;
        if self.is_bound() {
            log::warn!("Infinite scroll is already bound, its listeners will be registered twice.");
        }

        let scroll_binding = self.bind_listener(ListenerKind::Scroll)?;
        let resize_binding = match self.bind_listener(ListenerKind::Resize) {
            Ok(binding) => binding,
            Err(e) => {
                scroll_binding.release(&inner.dom);
                return Err(e);
            }
        };
        inner.bindings.borrow_mut().extend([scroll_binding, resize_binding]);
        inner.state.set(BindState::Bound);

        log::debug!("Bound infinite scroll listeners, scroll container is viewport: {}", inner.scroll_container.is_viewport());
        inner.emitter.emit(&ScrollEvent::Binded);
        Ok(())
    }

    /// Detaches every listener this controller registered, drops their pending trailing calls
    /// and emits `unbinded`.
    pub fn unbind(&self) {
        let inner = &self.inner;
        let bindings: Vec<Binding<D>> = inner.bindings.borrow_mut().drain(..).collect();
        for binding in bindings.into_iter().rev() {
            log::trace!("Remove {} listener", binding.kind);
            binding.release(&inner.dom);
        }
        inner.state.set(BindState::Unbound);

        log::debug!("Unbound infinite scroll listeners");
        inner.emitter.emit(&ScrollEvent::Unbinded);
    }

    fn bind_listener(&self, kind: ListenerKind) -> Result<Binding<D>, ScrollError> {
        let weak_scroll = self.downgrade();
        let throttle = Throttle::new(SCROLL_THROTTLE_DELAY_MS, self.inner.dom.clone(), Rc::new(move || {
            match weak_scroll.upgrade() {
                Some(infinite_scroll) => infinite_scroll.handle_layout_change(kind),
                None => Ok(()),
            }
        }));
        let listener_throttle = throttle.clone();
        let listener = self.inner.dom.add_listener(
            &self.inner.scroll_container,
            kind,
            Rc::new(move || listener_throttle.call()),
        )?;
        Ok(Binding { kind, listener, throttle })
    }

    /// Runs after a throttled scroll or resize: reports the event, then `hit` if the sentinel
    /// reached the fold.
    fn handle_layout_change(&self, kind: ListenerKind) -> Result<(), ScrollError> {
        let inner = &self.inner;
        let sentinel = self.sentinel()?;
        let distance = get_distance_to_fold(&*inner.dom, &sentinel, &inner.scroll_container);

        inner.emitter.emit(&match kind {
            ListenerKind::Scroll => ScrollEvent::Scrolled,
            ListenerKind::Resize => ScrollEvent::Resized,
        });

        if distance <= 0.0 {
            log::trace!("Sentinel hit the fold, distance: {distance}");
            inner.emitter.emit(&ScrollEvent::Hit { distance });
        }
        Ok(())
    }
}
