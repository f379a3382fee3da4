//! C3/C4/C5: the IRQ event runtime, single-slot events, and multi-slot
//! event sets.

mod node;
mod runtime;
mod set;
mod single;

pub use runtime::{IrqBaton, IrqEventRuntime};
pub use set::EventSet;
pub use single::{IrqEvent, VoidEvent};
