//! Cadence: a cooperative execution engine for block-based programs
//!
//! Sprites carry scripts built from nested blocks. The engine runs many of
//! those scripts concurrently against a shared scene, one bounded slice per
//! host frame.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{Config, Interpreter, Scene, Script, Target};
//!
//! let mut scene = Scene::new()?;
//! let hat = scene.block("event_whenflagclicked")?.build()?;
//! let step = scene.block("motion_movesteps")?.input("STEPS", 10.0).build()?;
//! let cat = scene.add_target(
//!     Target::sprite("Cat").with_script(Script::new(vec![hat, step])?),
//! )?;
//!
//! let mut interpreter = Interpreter::new(&Config::default());
//! interpreter.green_flag(&scene);
//! interpreter.step_threads(&mut scene)?;
//! assert_eq!(scene[cat].x, 10.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod block;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod scene;
pub mod stdlib;
pub mod value;

pub use block::{Block, BlockId, BlockRegistry, Hat, Input, Procedure, ProtoBlock, Shape, Trigger};
pub use config::{Config, ErrorPolicy};
pub use engine::{Context, Flow, Interpreter, Routine, Status, StepReport, ThreadId};
pub use errors::{DefinitionError, ExecError};
pub use scene::{Scene, Script, Target, TargetId};
pub use value::{Value, ValueKind};
