//! C7: deadline timers multiplexed onto a single hardware one-shot clock.
//!
//! Many software `DeadlineTimer`s are driven by exactly one
//! `HardwareClock`. Each time the clock fires, the timer task stops it
//! (learning how much time actually elapsed), subtracts that from every
//! *active* timer's remaining time, fires the ones that reached zero,
//! promotes any newly-added *pending* timers into the active list, and
//! re-arms the clock for the soonest remaining deadline across both
//! lists. The boxed `FnMut`-style handler here (stored as `dyn Fn`, since
//! notification only ever needs shared access through `Cell`-backed
//! fields) mirrors this crate's own `HrTimer`-style timer abstraction,
//! which already boxes its callback rather than using a raw function
//! pointer — deadline timers are constructed rarely enough that the
//! allocation is immaterial, unlike the ISR-hot `post`/`run_available`
//! path in `event`, which never allocates.
//!
//! `add_pending_listeners` below intentionally does *not* subtract the
//! elapsed drift from a timer that was only just promoted from pending to
//! active in the very same pass: a freshly-queued timer keeps the full
//! duration it was given, even though some number of milliseconds already
//! passed while the hardware clock was running for a previous active
//! timer. This reproduces the upstream design's own promotion behavior
//! rather than silently correcting it.

use alloc::boxed::Box;
use core::cell::{Cell, UnsafeCell};
use core::ptr::NonNull;

use crate::event::{IrqBaton, VoidEvent};
use crate::list::{IntrusiveLink, Linked};
use crate::softevent::{SoftEvent, SoftEventService};

/// A one-shot hardware clock capable of driving the timer task.
///
/// `start` must guarantee `irq_callback` is invoked from interrupt
/// context no sooner than `timeout_ms` milliseconds later, unless `stop`
/// completes first. `stop` must report how many milliseconds actually
/// elapsed since the matching `start`, and guarantee `irq_callback` will
/// not subsequently fire for that arming.
pub trait HardwareClock: Sync {
    fn start(&self, irq_callback: unsafe fn(), timeout_ms: u64);
    fn stop(&self) -> u64;
}

/// A software timer that fires its handler after a requested number of
/// milliseconds, multiplexed onto a single `HardwareClock` by a
/// process-wide `TimerTask`.
#[repr(C)]
pub struct DeadlineTimer {
    link: IntrusiveLink<DeadlineTimer>,
    until_timeout_ms: Cell<u64>,
    handler: UnsafeCell<Option<Box<dyn Fn(&DeadlineTimer) + Send + Sync>>>,
}

unsafe impl Sync for DeadlineTimer {}

impl DeadlineTimer {
    pub const fn new() -> Self {
        Self {
            link: IntrusiveLink::new(),
            until_timeout_ms: Cell::new(0),
            handler: UnsafeCell::new(None),
        }
    }

    /// Changes the handler without starting a wait.
    pub fn set_handler(&self, handler: impl Fn(&DeadlineTimer) + Send + Sync + 'static) {
        // SAFETY: exclusive access is a documented single-writer
        // convention for this cell — handlers are set from foreground
        // code, not concurrently with a notification in progress.
        unsafe { *self.handler.get() = Some(Box::new(handler)) };
    }

    /// Starts (or restarts) waiting for `timeout_ms` milliseconds,
    /// notifying through the currently-set handler when it elapses. A
    /// timeout of zero is promoted to one millisecond, since zero would
    /// otherwise never accumulate a nonzero drain target.
    pub fn async_wait(&'static self, timeout_ms: u64) {
        let timeout_ms = if timeout_ms == 0 { 1 } else { timeout_ms };
        self.until_timeout_ms.set(timeout_ms);
        TimerTask::handle().add_listener(self);
    }

    /// Starts waiting using a freshly-set handler.
    pub fn async_wait_with(
        &'static self,
        handler: impl Fn(&DeadlineTimer) + Send + Sync + 'static,
        timeout_ms: u64,
    ) {
        self.set_handler(handler);
        self.async_wait(timeout_ms);
    }

    /// Cancels the timer; its handler will not run for the pending wait,
    /// if any. A no-op if the timer isn't currently waiting.
    pub fn cancel(&'static self) {
        TimerTask::handle().cancel_listener(self);
    }

    pub fn set_timeout_ms(&self, timeout_ms: u64) {
        self.until_timeout_ms.set(timeout_ms);
    }

    pub fn timeout_ms(&self) -> u64 {
        self.until_timeout_ms.get()
    }
}

impl Default for DeadlineTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Linked for DeadlineTimer {
    fn link(&self) -> &IntrusiveLink<Self> {
        &self.link
    }
}

impl SoftEvent for DeadlineTimer {
    fn notify(&self) {
        // SAFETY: read-only access to a handler that, once set, is never
        // mutated concurrently with a notification pass (see
        // `set_handler`'s note).
        let handler = unsafe { &*self.handler.get() };
        if let Some(handler) = handler {
            handler(self);
        }
    }
}

/// Multiplexes every `DeadlineTimer` onto one `HardwareClock` through a
/// single backing `VoidEvent`/`SoftEventService` pair.
///
/// The service is driven by a dedicated, private `IrqEventRuntime`
/// (`timer::runtime()`) rather than one supplied by the embedder: building
/// the `VoidEvent`/`SoftEventService` pair needs a `'static` runtime
/// reference available before `TimerTask::init` ever runs, and the
/// embedder's own runtime isn't known that early. The embedder must drain
/// `timer::runtime()` from its foreground loop alongside any runtime of
/// its own for deadline timers to ever fire.
pub struct TimerTask {
    clock: &'static dyn HardwareClock,
    service: SoftEventService<DeadlineTimer>,
}

// SAFETY: same single-core, cooperative execution model as
// `SoftEventService` above — `TimerTask` is only ever reached through the
// process-wide `TASK` static, never moved across an actual thread boundary.
unsafe impl Send for TimerTask {}

static TIMER_RT: crate::event::IrqEventRuntime = crate::event::IrqEventRuntime::new();
static TIMER_IRQ: VoidEvent = VoidEvent::new(&TIMER_RT, timer_task_irq_callback);
static TASK: spin::Once<TimerTask> = spin::Once::new();

/// The runtime driving the timer task. The embedder must call
/// `runtime().run_available()` from its foreground loop for deadline
/// timers to fire.
pub fn runtime() -> &'static crate::event::IrqEventRuntime {
    &TIMER_RT
}

unsafe fn timer_task_irq_callback() {
    if let Some(task) = TASK.get() {
        task.drain();
    }
}

impl TimerTask {
    /// Initializes the process-wide timer task. Must be called exactly
    /// once, before any `DeadlineTimer::async_wait`, and must run to
    /// completion before the embedder unmasks whatever interrupt source
    /// drives `clock`. Later calls are silently ignored.
    pub fn init(clock: &'static dyn HardwareClock) {
        TASK.call_once(|| TimerTask {
            clock,
            service: SoftEventService::new(&TIMER_IRQ),
        });
    }

    fn handle() -> &'static TimerTask {
        TASK.get()
            .expect("TimerTask::init must run before any DeadlineTimer is used")
    }

    fn add_listener(&'static self, timer: &'static DeadlineTimer) {
        // SAFETY: `timer` is `'static`.
        unsafe { self.service.add_listener(NonNull::from(timer)) };
    }

    fn cancel_listener(&'static self, timer: &'static DeadlineTimer) {
        // SAFETY: `timer` is `'static` and, if linked, belongs to this
        // task's own service.
        unsafe { self.service.cancel_listener(NonNull::from(timer)) };
    }

    fn drain(&self) {
        let elapsed_ms = self.clock.stop();
        crate::rt_trace!("timer task drain, elapsed ms", elapsed_ms);
        let next_timeout: Cell<Option<u64>> = Cell::new(None);

        let maybe_update_next = |candidate: u64| {
            if candidate == 0 {
                return;
            }
            let updated = match next_timeout.get() {
                Some(current) if candidate < current => candidate,
                Some(current) => current,
                None => candidate,
            };
            next_timeout.set(Some(updated));
        };

        self.service.notify_active_listeners(|timer| {
            let remaining = timer.timeout_ms();
            let new_remaining = remaining.saturating_sub(elapsed_ms);
            timer.set_timeout_ms(new_remaining);
            maybe_update_next(new_remaining);
            new_remaining == 0
        });

        // Pending listeners keep the full duration they were queued with;
        // elapsed drift from the active timers above is not applied here.
        self.service.add_pending_listeners(|timer| {
            maybe_update_next(timer.timeout_ms());
            true
        });

        if let Some(next) = next_timeout.get() {
            crate::rt_debug!("timer task re-arming clock, next ms", next);
            self.clock.start(timer_task_irq_callback_trampoline, next);
        } else {
            crate::rt_debug!("timer task idle, no pending deadlines");
        }
    }
}

unsafe fn timer_task_irq_callback_trampoline() {
    TIMER_IRQ.post(IrqBaton);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU64, Ordering};

    struct FakeClock {
        started_timeout_ms: Cell<Option<u64>>,
        elapsed_on_stop_ms: Cell<u64>,
    }

    // SAFETY: test-only, single-threaded use.
    unsafe impl Sync for FakeClock {}

    impl HardwareClock for FakeClock {
        fn start(&self, _irq_callback: unsafe fn(), timeout_ms: u64) {
            self.started_timeout_ms.set(Some(timeout_ms));
        }

        fn stop(&self) -> u64 {
            self.elapsed_on_stop_ms.get()
        }
    }

    static CLOCK: FakeClock = FakeClock {
        started_timeout_ms: Cell::new(None),
        elapsed_on_stop_ms: Cell::new(0),
    };
    static FIRED: AtomicU64 = AtomicU64::new(0);
    static TIMER_A: DeadlineTimer = DeadlineTimer::new();

    fn mark_fired(_t: &DeadlineTimer) {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn timer_fires_once_elapsed_covers_its_timeout() {
        TimerTask::init(&CLOCK);
        TIMER_A.async_wait_with(mark_fired, 100);

        CLOCK.elapsed_on_stop_ms.set(150);
        TimerTask::handle().drain();

        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
    }
}
