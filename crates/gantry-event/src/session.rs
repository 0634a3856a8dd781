//! The envelope of one in-flight event.

use crate::packet::{JsonMap, MessagePacket};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Receiving half of a session's reply channel.
///
/// Held by the input deliverer while the session traverses the
/// dispatcher. Resolves with the outbound payload on completion, or
/// with a channel error if the session was lost to a fault; the
/// deliverer maps that case to an internal-error reply so the caller
/// is never orphaned.
pub type ReplyReceiver = oneshot::Receiver<JsonMap>;

/// One in-flight event, end-to-end from input decode to input encode.
///
/// A session is created by the input deliverer, owned by exactly one
/// dispatcher worker at a time (interceptor stage, then driver stage,
/// then output stage) and completed exactly once. Ownership transfers
/// are channel hand-offs, so writes to [`attributes`](Self::attributes)
/// and [`outbound_mut`](Self::outbound_mut) in one stage happen-before
/// reads in the next.
#[derive(Debug)]
pub struct EventSession {
    created_at: Instant,
    session_id: Uuid,
    uuid: String,
    topic: String,
    attributes: JsonMap,
    inbound: MessagePacket,
    outbound: MessagePacket,
    reply: Option<oneshot::Sender<JsonMap>>,
}

impl EventSession {
    /// Creates a session targeting component `uuid` on `topic`, with the
    /// decoded request payload.
    ///
    /// Returns the session plus the reply receiver the creator must hold
    /// on to. The outbound message starts as an empty payload on the
    /// same topic.
    #[must_use]
    pub fn new(
        uuid: impl Into<String>,
        topic: impl Into<String>,
        inbound_data: JsonMap,
    ) -> (Self, ReplyReceiver) {
        let topic = topic.into();
        let (tx, rx) = oneshot::channel();
        let session = Self {
            created_at: Instant::now(),
            session_id: Uuid::new_v4(),
            uuid: uuid.into(),
            topic: topic.clone(),
            attributes: JsonMap::new(),
            inbound: MessagePacket::new(topic.clone(), inbound_data),
            outbound: MessagePacket::empty(topic),
            reply: Some(tx),
        };
        (session, rx)
    }

    /// Random per-session identifier, for log correlation only.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Target component uuid (input device, or logic device after
    /// rerouting).
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Routing topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Time elapsed since the session was created.
    #[must_use]
    pub fn since(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Records an attribute on the session.
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// The attribute bag.
    #[must_use]
    pub fn attributes(&self) -> &JsonMap {
        &self.attributes
    }

    /// The decoded request.
    #[must_use]
    pub fn inbound(&self) -> &MessagePacket {
        &self.inbound
    }

    /// The response buffer.
    #[must_use]
    pub fn outbound(&self) -> &MessagePacket {
        &self.outbound
    }

    /// Mutable access to the response buffer, for interceptors and
    /// drivers.
    pub fn outbound_mut(&mut self) -> &mut MessagePacket {
        &mut self.outbound
    }

    /// Completes the session, sending the outbound payload to the
    /// originating deliverer.
    ///
    /// Consuming `self` makes a second completion unrepresentable.
    /// Returns `false` when the deliverer is no longer listening.
    pub fn complete(mut self) -> bool {
        match self.reply.take() {
            Some(tx) => tx.send(self.outbound.data).is_ok(),
            None => false,
        }
    }
}
