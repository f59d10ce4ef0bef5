//! Execution engine
//!
//! ## Module Organization
//! - `routine` - resumable block bodies and the [`Flow`] they answer with
//! - `exec_loop` - drives a frame stack of routines without host recursion
//! - `context` - capability object handed to block bodies
//! - `calls` - custom block call stack (warp depth, recursion guard)
//! - `thread` - one scheduled run of a script
//! - `interpreter` - the scheduler
//! - `awaitable`, `timers`, `outbox` - suspension and side-effect plumbing

pub mod awaitable;
pub mod calls;
pub mod context;
pub(crate) mod exec_loop;
pub mod interpreter;
pub mod outbox;
pub mod routine;
pub mod thread;
pub mod timers;

#[cfg(test)]
mod tests;

pub use awaitable::{pending, Awaitable, AwaitableStatus, Resolver};
pub use calls::{CallFrame, CallStack};
pub use context::{Context, Services};
pub use interpreter::{Interpreter, StepReport};
pub use outbox::{Effect, Outbox};
pub use routine::{Args, Flow, Routine};
pub use thread::{Status, Thread, ThreadId};
pub use timers::{Clock, ManualClock, SystemClock, Timers};
