//! Bundled components.
//!
//! Small, transport-free building blocks useful in demos, tests and as
//! templates for real device implementations.

mod echo;
mod noop;
mod timer;

pub use echo::EchoOutput;
pub use noop::NopDriver;
pub use timer::TimerInput;

use crate::factory::{ComponentInstance, FactoryRegistry};

/// Registers the bundled component factories.
///
/// # Panics
///
/// Panics when one of the builtin names is already taken; callers
/// register their own types after the builtins, not before.
pub fn register_builtins(factories: &mut FactoryRegistry) {
    factories
        .register("NopDriver", || {
            ComponentInstance::Driver(Box::new(NopDriver::default()))
        })
        .expect("builtin type name free");
    factories
        .register("EchoOutput", || {
            ComponentInstance::Output(Box::new(EchoOutput::default()))
        })
        .expect("builtin type name free");
    factories
        .register("TimerInput", || {
            ComponentInstance::Input(Box::new(TimerInput::default()))
        })
        .expect("builtin type name free");
}
