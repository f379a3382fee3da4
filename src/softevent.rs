//! C6: soft events — listeners multiplexed onto a single `VoidEvent`.
//!
//! A `SoftEventService` holds two lists of listeners: "pending" ones
//! waiting to be promoted, and "active" ones eligible for notification.
//! `add_listener` queues a listener as pending and posts the backing
//! `VoidEvent` unless a notification pass is already underway (the
//! `notifying` reentrancy guard) — that pass will pick the new listener up
//! itself via `add_pending_listeners` before it returns. This is the
//! substrate `timer::DeadlineTimer` builds its drain loop on.

use core::cell::UnsafeCell;
use core::ptr::NonNull;

use crate::event::{IrqBaton, VoidEvent};
use crate::list::{IntrusiveList, Linked};
use crate::sync::AtomicFlag;

/// Implemented by listener types that can be queued on a `SoftEventList`.
pub trait SoftEvent: Linked {
    /// Called when this listener is notified by
    /// `SoftEventService::notify_active_listeners`.
    fn notify(&self);
}

/// A list of soft-event listeners supporting push/pop and "take everything
/// out at once", the only operations `SoftEventService` needs.
pub struct SoftEventList<EventT: SoftEvent> {
    inner: IntrusiveList<EventT>,
}

impl<EventT: SoftEvent> SoftEventList<EventT> {
    pub const fn new() -> Self {
        Self {
            inner: IntrusiveList::new(),
        }
    }

    /// Pushes `listener` to the back of this list, first unlinking it from
    /// wherever it currently lives (a listener can only ever sit in one
    /// list at a time).
    ///
    /// # Safety
    /// `listener` must point to storage that outlives this list's hold on
    /// it.
    pub unsafe fn push(&mut self, listener: NonNull<EventT>) {
        if listener.as_ref().link().is_linked() {
            self.inner.unlink(listener);
        }
        self.inner.push_back(listener);
    }

    pub fn pop(&mut self) -> Option<NonNull<EventT>> {
        self.inner.pop_front()
    }

    /// Takes every listener out of this list, leaving it empty, and
    /// returns them as a freshly-built list — the "swap with an empty
    /// local list" pattern used by both notification passes below.
    pub fn take_all(&mut self) -> Self {
        Self {
            inner: core::mem::replace(&mut self.inner, IntrusiveList::new()),
        }
    }
}

impl<EventT: SoftEvent> Default for SoftEventList<EventT> {
    fn default() -> Self {
        Self::new()
    }
}

/// Multiplexes `EventT` listeners onto a single backing `VoidEvent`.
pub struct SoftEventService<EventT: SoftEvent> {
    notifying: AtomicFlag,
    active: UnsafeCell<SoftEventList<EventT>>,
    pending: UnsafeCell<SoftEventList<EventT>>,
    irq: &'static VoidEvent,
}

// SAFETY: this service is built for the same single-core, cooperative
// execution model as the rest of the runtime — `add_listener` may run from
// interrupt context while `notify_active_listeners`/`add_pending_listeners`
// run from the one foreground drain callback, but the two never execute
// truly concurrently (the foreground drain isn't preempted by a second
// foreground drain, and interrupts driving `add_listener` don't re-enter
// the lists mid-splice). No internal locking is applied beyond that.
unsafe impl<EventT: SoftEvent> Sync for SoftEventService<EventT> {}

impl<EventT: SoftEvent> SoftEventService<EventT> {
    pub const fn new(irq: &'static VoidEvent) -> Self {
        Self {
            notifying: AtomicFlag::new(false),
            active: UnsafeCell::new(SoftEventList::new()),
            pending: UnsafeCell::new(SoftEventList::new()),
            irq,
        }
    }

    /// Queues `event` as a pending listener, posting the backing event
    /// unless a notification pass is already in progress (in which case
    /// `add_pending_listeners`, called at the end of that very pass, will
    /// pick this listener up without needing a fresh post).
    ///
    /// # Safety
    /// `event` must point to storage that outlives this service's hold on
    /// it.
    pub unsafe fn add_listener(&self, event: NonNull<EventT>) {
        (*self.pending.get()).push(event);
        if !self.notifying.get() {
            self.irq.post(IrqBaton);
        }
    }

    /// Notifies every active listener for which `predicate` returns true;
    /// listeners for which it returns false are returned to the active
    /// list untouched.
    pub fn notify_active_listeners<P>(&self, mut predicate: P)
    where
        P: FnMut(&EventT) -> bool,
    {
        // SAFETY: see the impl-level `Sync` note; this runs only from the
        // single foreground drain context.
        let active = unsafe { &mut *self.active.get() };
        let mut local = active.take_all();
        self.notifying.set(true);
        while let Some(listener) = local.pop() {
            // SAFETY: listener came from a list that required 'static,
            // non-aliased storage when it was pushed.
            let listener_ref = unsafe { listener.as_ref() };
            if predicate(listener_ref) {
                listener_ref.notify();
            } else {
                unsafe { active.push(listener) };
            }
        }
        self.notifying.set(false);
    }

    /// Unlinks `event` from whichever of the active/pending lists it
    /// currently sits in, if either. A no-op if `event` isn't currently
    /// queued on this service at all.
    ///
    /// # Safety
    /// `event` must point to storage that, if linked, belongs to this
    /// service's own active/pending lists.
    pub unsafe fn cancel_listener(&self, event: NonNull<EventT>) {
        let active = &mut *self.active.get();
        let pending = &mut *self.pending.get();
        crate::list::unlink_from_one_of(&mut active.inner, &mut pending.inner, event);
    }

    /// Moves every pending listener for which `predicate` returns true
    /// into the active list; the rest stay pending.
    pub fn add_pending_listeners<P>(&self, mut predicate: P)
    where
        P: FnMut(&EventT) -> bool,
    {
        // SAFETY: see the impl-level `Sync` note.
        let pending = unsafe { &mut *self.pending.get() };
        let active = unsafe { &mut *self.active.get() };
        let mut local = pending.take_all();
        while let Some(listener) = local.pop() {
            let listener_ref = unsafe { listener.as_ref() };
            if predicate(listener_ref) {
                unsafe { active.push(listener) };
            } else {
                unsafe { pending.push(listener) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::IrqEventRuntime;
    use crate::list::IntrusiveLink;
    use core::cell::Cell;

    struct Listener {
        link: IntrusiveLink<Listener>,
        id: u32,
        notified: Cell<u32>,
    }

    impl Listener {
        fn new(id: u32) -> Self {
            Self {
                link: IntrusiveLink::new(),
                id,
                notified: Cell::new(0),
            }
        }
    }

    impl Linked for Listener {
        fn link(&self) -> &IntrusiveLink<Self> {
            &self.link
        }
    }

    impl SoftEvent for Listener {
        fn notify(&self) {
            self.notified.set(self.notified.get() + 1);
        }
    }

    static RT: IrqEventRuntime = IrqEventRuntime::new();
    static IRQ: VoidEvent = VoidEvent::new(&RT, no_op);
    unsafe fn no_op() {}

    #[test]
    fn pending_listeners_promote_then_notify() {
        let service: SoftEventService<Listener> = SoftEventService::new(&IRQ);
        let a = Listener::new(1);
        let b = Listener::new(2);

        unsafe {
            service.add_listener(NonNull::from(&a));
            service.add_listener(NonNull::from(&b));
        }

        service.add_pending_listeners(|_| true);
        service.notify_active_listeners(|l| l.id == 1);

        assert_eq!(a.notified.get(), 1);
        assert_eq!(b.notified.get(), 0);
    }

    #[test]
    fn listeners_not_matching_predicate_stay_active() {
        let service: SoftEventService<Listener> = SoftEventService::new(&IRQ);
        let a = Listener::new(1);
        unsafe { service.add_listener(NonNull::from(&a)) };
        service.add_pending_listeners(|_| true);

        service.notify_active_listeners(|_| false);
        service.notify_active_listeners(|_| true);

        assert_eq!(a.notified.get(), 1);
    }
}
