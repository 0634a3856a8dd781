//! Gantry runtime: the pipeline behind the device SDK.
//!
//! This crate assembles and drives the event pipeline: it consumes the
//! configuration tree, instantiates components through registered
//! factories, schedules sessions across the two-stage dispatcher and
//! supervises component lifecycles.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Runtime (THIS CRATE)                    │
//! ├────────────────────────────────────────────────────────────┤
//! │  config/     : TOML tree, validation                       │
//! │  factory     : type name → component constructor           │
//! │  registry    : frozen typed collections, uuid index        │
//! │  dispatcher  : start/end queues, stage workers             │
//! │  deliverer   : input/output deliverer implementations      │
//! │  hooks       : start/stop phase callbacks                  │
//! │  pipeline    : lifecycle supervisor                        │
//! │  components/ : bundled NopDriver / EchoOutput / TimerInput │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use gantry_runtime::{config, FactoryRegistry, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tree = config::load_file("gantry.toml")?;
//!     let factories = FactoryRegistry::with_builtins();
//!
//!     let mut pipeline = Pipeline::init(tree, &factories)?;
//!     pipeline.start().await;
//!     pipeline.await_termination().await;
//!     pipeline.stop().await;
//!     Ok(())
//! }
//! ```

pub mod components;
pub mod config;
mod deliverer;
mod dispatcher;
mod error;
mod factory;
mod hooks;
mod pipeline;
mod registry;

pub use deliverer::{ATTR_INPUT_NAME, ATTR_INPUT_TYPE, ATTR_LOGIC_NAME, ATTR_LOGIC_TYPE};
pub use dispatcher::{ATTR_DRIVER_ELAPSED, ATTR_INTERCEPTOR_ELAPSED};
pub use error::PipelineError;
pub use factory::{ComponentInstance, ComponentKind, FactoryRegistry};
pub use hooks::{HookPoint, HookRegistry, LifecycleHook};
pub use pipeline::Pipeline;
pub use registry::{ComponentMeta, Entry, Registry};
