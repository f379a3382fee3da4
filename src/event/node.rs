//! Shared base node linked into an `IrqEventRuntime`'s pending-event stack.
//!
//! The original runtime uses a C++ virtual base class (`irq_event_base`)
//! so the runtime can hold a homogeneous intrusive list of heterogeneous
//! event types and dispatch through a vtable. Rust's `dyn Trait` can't be
//! stored behind the plain `AtomicPtr<T: Sized>` the lock-free stack in
//! `crate::sync::spsc` needs, so the vtable is inlined by hand instead: a
//! node carries its own trampoline function pointer, set once at
//! construction, and the stack only ever sees this concrete, `Sized` base
//! type.

use core::ptr::NonNull;
use core::sync::atomic::AtomicPtr;

use crate::sync::{AtomicFlag, SpscNode};

/// Base fields embedded as the first field of every concrete event node
/// (`IrqEvent<D>`, `VoidEvent`, and the event-set slot wrapper). Storing it
/// first lets a `NonNull<EventNodeBase>` be reinterpreted back to
/// `NonNull<ConcreteNode>` since both share the same address.
pub struct EventNodeBase {
    next: AtomicPtr<EventNodeBase>,
    posted: AtomicFlag,
    run: unsafe fn(NonNull<EventNodeBase>),
}

impl EventNodeBase {
    /// `run` receives the same pointer that was pushed onto the runtime's
    /// stack, cast back to the concrete node type inside the trampoline
    /// that the concrete node supplies.
    pub const fn new(run: unsafe fn(NonNull<EventNodeBase>)) -> Self {
        Self {
            next: AtomicPtr::new(core::ptr::null_mut()),
            posted: AtomicFlag::new(false),
            run,
        }
    }

    /// Tries to transition `posted` from clear to set. Returns `true` if
    /// this call won the race, meaning the caller should actually link the
    /// node onto the runtime; `false` means the event is already posted
    /// and waiting to run.
    pub(super) fn test_and_mark_posted(&self) -> bool {
        self.posted.test_and_set()
    }

    /// Invokes this node's callback trampoline. Called only by
    /// `IrqEventRuntime::run_available`.
    ///
    /// `posted` is cleared *before* the trampoline runs, matching the
    /// original callback's own ordering: a callback that re-posts itself
    /// is observed as a fresh post, not silently swallowed by a flag that
    /// was still set from the post being serviced right now.
    ///
    /// # Safety
    /// `node` must point to a live `EventNodeBase` that is the first field
    /// of the concrete node type whose trampoline is stored in `run`.
    pub(super) unsafe fn run_callback(node: NonNull<EventNodeBase>) {
        node.as_ref().posted.clear();
        let run = node.as_ref().run;
        run(node);
    }
}

impl SpscNode for EventNodeBase {
    fn next_ptr(&self) -> &AtomicPtr<Self> {
        &self.next
    }
}
