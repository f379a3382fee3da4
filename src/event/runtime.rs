//! C3: the IRQ event runtime (`IrqEventRuntime`).
//!
//! Events are linked onto a single-linked LIFO stack (`crate::sync::spsc`);
//! new posts always go to the front. `run_available` swaps the whole stack
//! out, reverses it back to post order, and runs every callback in turn —
//! exactly the two-phase "take-then-reverse" algorithm the original
//! runtime uses to turn a FILO post order into FIFO execution order.

use core::ptr::NonNull;

use super::node::EventNodeBase;
use crate::sync::SpscStack;

/// Proof that the caller is running in (or on behalf of) interrupt
/// context. Plain marker type — it carries no data, it just forces a
/// caller to explicitly name the context they're posting from, matching
/// the original runtime's `irq_baton` tag type.
#[derive(Clone, Copy)]
pub struct IrqBaton;

/// Runtime that collects posted events and runs their callbacks from
/// foreground (non-interrupt) context.
pub struct IrqEventRuntime {
    pending: SpscStack<EventNodeBase>,
}

impl IrqEventRuntime {
    pub const fn new() -> Self {
        Self {
            pending: SpscStack::new(),
        }
    }

    /// Links `node` onto the pending-event stack. Called by an event's own
    /// `post`, never directly by user code.
    ///
    /// # Safety
    /// `node` must point to a live `EventNodeBase` embedded in a node that
    /// outlives any future `run_available` call that might drain it, and
    /// must not already be linked into this runtime.
    pub(crate) unsafe fn post(&self, _baton: IrqBaton, node: NonNull<EventNodeBase>) {
        self.pending.push(node);
    }

    /// Runs every event posted so far, including ones posted by callbacks
    /// that run during this very call (a callback may re-post itself or
    /// another event; that post is observed by the `while` below rather
    /// than deferred to the next call).
    pub fn run_available(&self) {
        loop {
            let mut drain = self.pending.take_all();
            let Some(first) = drain.next() else {
                break;
            };
            // SAFETY: every node reachable from `take_all` was linked via
            // `post`, which requires the node to outlive this call.
            unsafe { EventNodeBase::run_callback(first) };
            for node in drain {
                unsafe { EventNodeBase::run_callback(node) };
            }
        }
    }

    /// True if any event is currently posted and waiting to run.
    pub fn events_available(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Default for IrqEventRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[repr(C)]
    struct RecordingNode {
        base: EventNodeBase,
        seen: Cell<bool>,
    }

    unsafe fn recording_trampoline(node: NonNull<EventNodeBase>) {
        let node: NonNull<RecordingNode> = node.cast();
        node.as_ref().seen.set(true);
    }

    impl RecordingNode {
        fn new() -> Self {
            Self {
                base: EventNodeBase::new(recording_trampoline),
                seen: Cell::new(false),
            }
        }
    }

    #[test]
    fn run_available_runs_every_posted_node_once() {
        let rt = IrqEventRuntime::new();
        let a = RecordingNode::new();
        let b = RecordingNode::new();

        assert!(!rt.events_available());
        unsafe {
            rt.post(IrqBaton, NonNull::from(&a.base));
            rt.post(IrqBaton, NonNull::from(&b.base));
        }
        assert!(rt.events_available());

        rt.run_available();

        assert!(a.seen.get());
        assert!(b.seen.get());
        assert!(!rt.events_available());
    }

    #[test]
    fn run_available_on_empty_runtime_is_a_noop() {
        let rt = IrqEventRuntime::new();
        rt.run_available();
        assert!(!rt.events_available());
    }
}
