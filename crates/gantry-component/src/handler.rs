//! Data-path handlers: interceptors and drivers.

use crate::{Component, Context, HandlerError, OutputDeliverer};
use async_trait::async_trait;
use gantry_event::EventSession;

/// Read/mutate stage invoked before drivers.
///
/// Interceptors whose topic patterns match the session run in priority
/// order (lower numeric priority first, ties by registration order).
/// `handle` is synchronous: interceptors inspect and mutate the session
/// but do no I/O.
pub trait Interceptor: Component {
    /// Handles the session.
    ///
    /// # Errors
    ///
    /// - [`HandlerError::Dropped`] terminates the session: no further
    ///   interceptor or driver runs, the reply carries
    ///   `error="InterceptorDropped"`.
    /// - Any other error is logged (or escalated under fail-fast) and
    ///   the chain continues.
    fn handle(&self, session: &mut EventSession, ctx: &Context) -> Result<(), HandlerError>;
}

/// Business-logic handler matched by topic.
///
/// Every driver whose patterns match the session runs, sequentially, in
/// registration order. Drivers mutate the session's outbound buffer and
/// may call output devices through the deliverer.
#[async_trait]
pub trait Driver: Component {
    /// Handles the session.
    ///
    /// # Errors
    ///
    /// Errors are logged (or escalated under fail-fast); remaining
    /// drivers still run and the session still completes.
    async fn handle(
        &self,
        session: &mut EventSession,
        outputs: &dyn OutputDeliverer,
        ctx: &Context,
    ) -> Result<(), HandlerError>;
}
