//! C4: single-slot IRQ events (`IrqEvent<D>` and `VoidEvent`).
//!
//! Each event owns exactly one payload slot guarded by a CAS lock
//! (`payload_lock`) and a `posted` flag that is cleared *before* the
//! callback runs, so a callback that re-posts its own event from within
//! itself is observed as a fresh post rather than silently dropped.

use core::cell::UnsafeCell;
use core::ptr::NonNull;

use super::node::EventNodeBase;
use super::runtime::{IrqBaton, IrqEventRuntime};
use crate::sync::AtomicFlag;

/// A single-slot IRQ event carrying a payload of type `D`.
///
/// `D` is moved into the event from interrupt context via `try_set_data`,
/// and handed to the callback (wrapped in `Some`) when the runtime later
/// runs it. If the callback's own re-post races a fresh `try_set_data`
/// before the old payload was taken, `try_set_data` reports failure rather
/// than overwriting a payload the callback hasn't consumed yet.
#[repr(C)]
pub struct IrqEvent<D> {
    base: EventNodeBase,
    payload_lock: AtomicFlag,
    data: UnsafeCell<Option<D>>,
    callback: unsafe fn(Option<D>),
    runtime: *const IrqEventRuntime,
}

// SAFETY: all interior mutability here (`data`) is guarded by
// `payload_lock`'s compare-and-swap; the `*const IrqEventRuntime` is a
// read-only back-reference set once at construction.
unsafe impl<D: Send> Sync for IrqEvent<D> {}

impl<D> IrqEvent<D> {
    pub const fn new(runtime: &'static IrqEventRuntime, callback: unsafe fn(Option<D>)) -> Self {
        Self {
            base: EventNodeBase::new(Self::trampoline),
            payload_lock: AtomicFlag::new(false),
            data: UnsafeCell::new(None),
            callback,
            runtime: runtime as *const IrqEventRuntime,
        }
    }

    unsafe fn trampoline(node: NonNull<EventNodeBase>) {
        let node: NonNull<Self> = node.cast();
        let event = node.as_ref();
        let taken = event.try_take_data();
        (event.callback)(taken);
    }

    /// Takes the current payload, clearing the slot. Returns `None` if the
    /// lock is currently held by a racing `try_set_data`.
    fn try_take_data(&self) -> Option<D> {
        if !self.payload_lock.test_and_set() {
            return None;
        }
        // SAFETY: exclusive access granted by winning the lock above.
        let taken = unsafe { (*self.data.get()).take() };
        self.payload_lock.clear();
        taken
    }

    /// Tries to set the stored payload from interrupt context. Returns
    /// `false` if a racing access currently holds the lock, in which case
    /// the caller's `data` is dropped without being delivered.
    pub fn try_set_data(&self, _baton: IrqBaton, data: D) -> bool {
        if !self.payload_lock.test_and_set() {
            return false;
        }
        // SAFETY: exclusive access granted by winning the lock above.
        unsafe { *self.data.get() = Some(data) };
        self.payload_lock.clear();
        true
    }

    /// Posts this event to its runtime if it isn't already posted.
    /// Re-posting an already-posted event before it has run is a no-op.
    pub fn post(&self, baton: IrqBaton) {
        if !self.base.test_and_mark_posted() {
            return;
        }
        // SAFETY: `self` is required to outlive the runtime's drain of it,
        // which holds for any event stored with `'static` duration.
        unsafe {
            let runtime = &*self.runtime;
            runtime.post(baton, NonNull::from(&self.base));
        }
    }
}

/// A single-slot IRQ event that carries no payload.
#[repr(C)]
pub struct VoidEvent {
    base: EventNodeBase,
    callback: unsafe fn(),
    runtime: *const IrqEventRuntime,
}

unsafe impl Sync for VoidEvent {}

impl VoidEvent {
    pub const fn new(runtime: &'static IrqEventRuntime, callback: unsafe fn()) -> Self {
        Self {
            base: EventNodeBase::new(Self::trampoline),
            callback,
            runtime: runtime as *const IrqEventRuntime,
        }
    }

    unsafe fn trampoline(node: NonNull<EventNodeBase>) {
        let node: NonNull<Self> = node.cast();
        (node.as_ref().callback)();
    }

    pub fn post(&self, baton: IrqBaton) {
        if !self.base.test_and_mark_posted() {
            return;
        }
        // SAFETY: same as `IrqEvent::post`.
        unsafe {
            let runtime = &*self.runtime;
            runtime.post(baton, NonNull::from(&self.base));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    // Each test gets its own runtime: `run_available` assumes a single
    // drain-consumer, and the test harness runs tests on separate threads.

    #[test]
    fn posted_event_with_data_runs_and_clears_slot() {
        static RT: IrqEventRuntime = IrqEventRuntime::new();
        static LAST_SEEN: AtomicU32 = AtomicU32::new(0);
        unsafe fn record_data(data: Option<u32>) {
            LAST_SEEN.store(data.unwrap_or(0), Ordering::SeqCst);
        }
        static EVT: IrqEvent<u32> = IrqEvent::new(&RT, record_data);
        assert!(EVT.try_set_data(IrqBaton, 42));
        EVT.post(IrqBaton);
        RT.run_available();
        assert_eq!(LAST_SEEN.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn double_post_before_run_only_runs_once() {
        static RT: IrqEventRuntime = IrqEventRuntime::new();
        static COUNT: AtomicU32 = AtomicU32::new(0);
        unsafe fn bump(_data: Option<u32>) {
            COUNT.fetch_add(1, Ordering::SeqCst);
        }
        static EVT: IrqEvent<u32> = IrqEvent::new(&RT, bump);
        EVT.try_set_data(IrqBaton, 1);
        EVT.post(IrqBaton);
        EVT.post(IrqBaton);
        RT.run_available();
        assert_eq!(COUNT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn void_event_runs_its_callback() {
        static RT: IrqEventRuntime = IrqEventRuntime::new();
        static RAN: AtomicU32 = AtomicU32::new(0);
        unsafe fn mark() {
            RAN.fetch_add(1, Ordering::SeqCst);
        }
        static EVT: VoidEvent = VoidEvent::new(&RT, mark);
        EVT.post(IrqBaton);
        RT.run_available();
        assert_eq!(RAN.load(Ordering::SeqCst), 1);
    }
}
