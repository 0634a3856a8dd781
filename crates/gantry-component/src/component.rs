//! Base component capability.

use crate::{ComponentError, ComponentOptions, Context};

/// Base trait for everything the pipeline manages.
///
/// The three methods are the capability set: a component overrides
/// exactly the ones it needs, the rest stay no-ops. The supervisor
/// calls them under a strict protocol:
///
/// - `on_init`: exactly once, before the instance is shared and before
///   any `on_start`. Takes `&mut self`; this is the only point where a
///   component can freely mutate itself without interior mutability.
/// - `on_start`: at most once, after every component's `on_init`.
///   Bounded by [`LIFECYCLE_TIMEOUT`](crate::LIFECYCLE_TIMEOUT).
/// - `on_stop`: at most once, during shutdown, same bound. May run
///   concurrently with a still-returning `serve` on input devices.
///
/// `on_start`/`on_stop` take `&self` because the instance is
/// `Arc`-shared by then; components that mutate state there use
/// interior mutability.
pub trait Component: Send + Sync {
    /// Consumes the component's configuration options.
    ///
    /// # Errors
    ///
    /// An error here fails pipeline construction; nothing has started
    /// yet, so failing is cheap and loud.
    fn on_init(&mut self, options: ComponentOptions, ctx: &Context) -> Result<(), ComponentError> {
        let _ = (options, ctx);
        Ok(())
    }

    /// Brings the component up.
    ///
    /// # Errors
    ///
    /// An error is logged (or escalated under fail-fast); the start
    /// phase proceeds.
    fn on_start(&self, ctx: &Context) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }

    /// Takes the component down.
    ///
    /// # Errors
    ///
    /// An error is logged; the stop phase proceeds.
    fn on_stop(&self, ctx: &Context) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }
}
