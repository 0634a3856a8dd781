//! Configuration tree: types, validation and the TOML loader.
//!
//! The pipeline consumes a hierarchical tree with one `[engine]`
//! section, a free-form `[globals]` table and one array-of-tables per
//! component section:
//!
//! ```toml
//! [engine]
//! events_capacity = 8
//! fail_fast = false
//!
//! [globals]
//! site = "plant-2"
//!
//! [[inputs]]
//! type = "TimerInput"
//! uuid = "timer-1"
//! name = "heartbeat"
//! topic = "/heartbeat"
//! interval_ms = 5000
//! ```
//!
//! Keys beyond the routing metadata flow into the entry's option map
//! and reach the component's `on_init` untouched.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{load_file, load_str};
pub use types::{ComponentConfig, PipelineConfig};
