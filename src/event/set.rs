//! C5: fixed-capacity multi-slot event sets (`EventSet<T, N>`).
//!
//! Backed by `N` `IrqEvent` slots plus a free-list (another instance of
//! the same SPSC stack primitive used for posting) of the slots not
//! currently in flight. `post` pops a free slot, stashes the caller's data
//! plus a pointer back to this set into it, and posts it to the runtime
//! like any other single event; the runtime callback pushes the slot back
//! onto the free list once it has handed the data to the user callback.
//!
//! This reproduces one open question from the source design verbatim
//! rather than silently patching it: if `try_set_data` loses its lock race
//! (vanishingly unlikely, since the slot was just popped off the free
//! list and nothing else should hold a reference to it yet, but not
//! provably impossible under this locking scheme), the slot is *not*
//! returned to the free list. That slot leaks for the lifetime of the
//! event set. See the source design note for the original occurrence of
//! this behavior.
//!
//! `new` and the free-list wiring are deliberately split in two, mirroring
//! the source design's `irq_event_set(irq_event_set&&) = delete;` plus
//! `late_init`. The free list stores `NonNull<EventSlot<T, N>>` pointers
//! into `self.slots`; if those pointers were written while the `EventSet`
//! still lived in `new`'s stack frame, returning it by value would move
//! `slots` out from under them, leaving the free list (and the runtime,
//! once a slot is posted) pointing at freed stack memory. So `new` only
//! builds an empty, pointer-free value, safe to move anywhere; `init`
//! wires the free list afterwards, taking `&'static self` to force the
//! caller to have already placed the set in its final, stationary home.

use core::marker::PhantomData;
use core::ptr::NonNull;

use super::runtime::{IrqBaton, IrqEventRuntime};
use crate::error::RuntimeError;
use crate::sync::{SpscNode, SpscStack};

struct SlotPayload<T, const N: usize> {
    event_set: NonNull<EventSet<T, N>>,
    slot: NonNull<EventSlot<T, N>>,
    data: T,
}

// SAFETY: `event_set`/`slot` are raw pointers into `'static` storage that
// outlives any single post; `NonNull` doesn't auto-derive `Send`/`Sync`
// even when `T` does, so this makes explicit what the locking scheme
// already guarantees: only one thread at a time (the one running the
// runtime's callback) ever dereferences them.
unsafe impl<T: Send, const N: usize> Send for SlotPayload<T, N> {}

#[repr(C)]
struct EventSlot<T, const N: usize> {
    event: super::single::IrqEvent<SlotPayload<T, N>>,
    free_next: core::sync::atomic::AtomicPtr<EventSlot<T, N>>,
}

impl<T, const N: usize> SpscNode for EventSlot<T, N> {
    fn next_ptr(&self) -> &core::sync::atomic::AtomicPtr<Self> {
        &self.free_next
    }
}

unsafe fn internal_rt_callback<T, const N: usize>(payload: Option<SlotPayload<T, N>>) {
    if let Some(payload) = payload {
        // SAFETY: `event_set` points to the set that popped this slot and
        // outlives the post, by construction of `EventSet::post`.
        unsafe { payload.event_set.as_ref().run_event_callback(payload) };
    }
}

/// A fixed-capacity set of `N` interchangeable IRQ events, each carrying a
/// payload of type `T`.
pub struct EventSet<T, const N: usize> {
    slots: [EventSlot<T, N>; N],
    free_list: SpscStack<EventSlot<T, N>>,
    callback: unsafe fn(Option<T>),
    _marker: PhantomData<T>,
}

// SAFETY: all shared mutable state lives behind the per-slot `IrqEvent`
// lock and the lock-free free-list; `slots` itself is never mutated after
// construction except through those guarded paths.
unsafe impl<T: Send, const N: usize> Sync for EventSet<T, N> {}

impl<T, const N: usize> EventSet<T, N> {
    /// Builds an event set with an empty free list. `runtime` must be
    /// `'static` (typically itself a `static`), since events posted into
    /// it must outlive any future drain. The result holds no pointers into
    /// itself yet, so it is safe to move — into a `Box`, a `static`
    /// initializer, or wherever its final home is. It is unusable until
    /// `init` is called on it there: every `post` returns `EventSetFull`
    /// in the meantime, since the free list is empty.
    pub fn new(runtime: &'static IrqEventRuntime, callback: unsafe fn(Option<T>)) -> Self
    where
        T: 'static,
    {
        let slots = core::array::from_fn(|_| EventSlot {
            event: super::single::IrqEvent::new(runtime, internal_rt_callback::<T, N>),
            free_next: core::sync::atomic::AtomicPtr::new(core::ptr::null_mut()),
        });
        Self {
            slots,
            free_list: SpscStack::new(),
            callback,
            _marker: PhantomData,
        }
    }

    /// Wires every slot into the free list, making the set usable. Must be
    /// called exactly once, after the set has reached its final, stationary
    /// location — the `&'static self` receiver forces that at the type
    /// level. Later calls would double-link the free list, so this is not
    /// idempotent; callers only ever have one opportunity to call it per
    /// set, immediately after construction.
    pub fn init(&'static self) {
        for slot in &self.slots {
            // SAFETY: `slot` is owned by `self`, `self` is `'static` (so
            // this pointer is valid for the rest of the program), and
            // `init` is documented to run exactly once before any `post`.
            unsafe { self.free_list.push(NonNull::from(slot)) };
        }
    }

    /// Tries to post `data` into one of this set's slots.
    ///
    /// Fails with `EventSetFull` if every slot is currently in flight (or
    /// `init` was never called), or `EventLockFailed` if a freshly-popped
    /// slot's payload lock was (surprisingly) already held — in which case
    /// the slot is leaked, not returned to the free list; see the
    /// module-level note.
    pub fn post(&self, baton: IrqBaton, data: T) -> Result<(), RuntimeError>
    where
        T: 'static,
    {
        let Some(slot) = self.free_list.take_one() else {
            crate::rt_warn!("event set full");
            return Err(RuntimeError::EventSetFull);
        };
        // SAFETY: `slot` was just popped from this set's own free list, so
        // it is one of `self.slots` and outlives `self`.
        let slot_ref = unsafe { slot.as_ref() };
        let payload = SlotPayload {
            event_set: NonNull::from(self),
            slot,
            data,
        };
        if !slot_ref.event.try_set_data(baton, payload) {
            // Slot leaks here: it is not pushed back onto `free_list`.
            crate::rt_error!("event set slot lock held on a freshly popped slot");
            return Err(RuntimeError::EventLockFailed);
        }
        slot_ref.event.post(baton);
        Ok(())
    }

    fn run_event_callback(&self, payload: SlotPayload<T, N>) {
        // SAFETY: `payload.slot` was popped from `self.free_list` and has
        // just finished its one in-flight use; safe to return it.
        unsafe { self.free_list.push(payload.slot) };
        // SAFETY: `callback` was supplied by the caller of `new` and is a
        // plain function pointer valid for the program's lifetime.
        unsafe { (self.callback)(Some(payload.data)) };
    }
}

impl<T, const N: usize> SpscStack<EventSlot<T, N>> {
    /// Pops a single node off the free list. The free list only ever needs
    /// single-node pops (unlike the runtime's drain-everything), so this
    /// reuses the drain-everything primitive and pushes back every node but
    /// the first, rather than a dedicated single-pop operation — O(N) per
    /// call instead of the O(1) a real SPSC queue (as the source design
    /// uses for this free list) would give. Payload order out of the set
    /// is governed by the runtime's own FIFO drain, not by this free list,
    /// so the quadratic worst case (N posts between drains) costs time but
    /// not correctness.
    fn take_one(&self) -> Option<NonNull<EventSlot<T, N>>> {
        let mut drain = self.take_all();
        let first = drain.next()?;
        for rest in drain {
            // SAFETY: `rest` came from this same stack's drain and is
            // immediately relinked into it.
            unsafe { self.push(rest) };
        }
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use core::sync::atomic::{AtomicU32, Ordering};

    // Each test gets its own runtime: `run_available` assumes a single
    // drain-consumer, and the test harness runs tests on separate threads.

    // `Box::leak` gives the set a stationary `'static` home before `init`
    // runs, exactly as `new`/`init` require; a plain local `let` would
    // still be movable out of this function's frame.
    fn leak<T, const N: usize>(set: EventSet<T, N>) -> &'static EventSet<T, N> {
        let set: &'static mut EventSet<T, N> = Box::leak(Box::new(set));
        set.init();
        set
    }

    #[test]
    fn posts_up_to_capacity_then_reports_full() {
        static RT: IrqEventRuntime = IrqEventRuntime::new();
        unsafe fn ignore(_data: Option<u32>) {}
        let set = leak(EventSet::<u32, 2>::new(&RT, ignore));
        assert!(set.post(IrqBaton, 1).is_ok());
        assert!(set.post(IrqBaton, 2).is_ok());
        assert_eq!(set.post(IrqBaton, 3), Err(RuntimeError::EventSetFull));
    }

    #[test]
    fn slots_are_recycled_after_running() {
        static RT: IrqEventRuntime = IrqEventRuntime::new();
        static SEEN_SUM: AtomicU32 = AtomicU32::new(0);
        unsafe fn accumulate(data: Option<u32>) {
            if let Some(v) = data {
                SEEN_SUM.fetch_add(v, Ordering::SeqCst);
            }
        }
        let set = leak(EventSet::<u32, 1>::new(&RT, accumulate));
        assert!(set.post(IrqBaton, 10).is_ok());
        assert_eq!(set.post(IrqBaton, 20), Err(RuntimeError::EventSetFull));

        RT.run_available();

        assert!(set.post(IrqBaton, 20).is_ok());
        RT.run_available();
        assert_eq!(SEEN_SUM.load(Ordering::SeqCst), 30);
    }

    #[test]
    fn post_before_init_always_reports_full() {
        static RT: IrqEventRuntime = IrqEventRuntime::new();
        unsafe fn ignore(_data: Option<u32>) {}
        let set: EventSet<u32, 2> = EventSet::new(&RT, ignore);
        assert_eq!(set.post(IrqBaton, 1), Err(RuntimeError::EventSetFull));
    }
}
