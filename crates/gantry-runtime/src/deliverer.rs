//! Deliverer implementations: the glue between devices and the
//! dispatcher.

use crate::registry::{Entry, Registry};
use async_trait::async_trait;
use gantry_component::{
    Context, DeliverError, InputDeliverer, InputDevice, LogicDevice, OutputDeliverer,
};
use gantry_event::{EventSession, FramePacket, JsonMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Session attribute: input device type.
pub const ATTR_INPUT_TYPE: &str = "@InputDevice.Type";
/// Session attribute: input device name.
pub const ATTR_INPUT_NAME: &str = "@InputDevice.Name";
/// Session attribute: matched logic device type.
pub const ATTR_LOGIC_TYPE: &str = "@InputDevice.Logic.Type";
/// Session attribute: matched logic device name.
pub const ATTR_LOGIC_NAME: &str = "@InputDevice.Logic.Name";

/// Per-input adapter: decodes a raw frame, resolves the routing logic
/// device, admits the session and awaits the encoded reply.
///
/// One instance is bound to one input device for the lifetime of its
/// serve worker. Each `deliver` call is independent; concurrent calls
/// interleave freely through the dispatcher.
pub(crate) struct PipelineInputDeliverer {
    registry: Arc<Registry>,
    input: Entry<dyn InputDevice>,
    start_tx: mpsc::Sender<EventSession>,
    ctx: Context,
}

impl PipelineInputDeliverer {
    pub(crate) fn new(
        registry: Arc<Registry>,
        input: Entry<dyn InputDevice>,
        start_tx: mpsc::Sender<EventSession>,
        ctx: Context,
    ) -> Self {
        Self {
            registry,
            input,
            start_tx,
            ctx,
        }
    }
}

#[async_trait]
impl InputDeliverer for PipelineInputDeliverer {
    async fn deliver(
        &self,
        topic: &str,
        frame: FramePacket,
    ) -> Result<FramePacket, DeliverError> {
        if frame.is_empty() {
            return Err(DeliverError::MissingPayload);
        }

        let input_uuid = self.input.meta.uuid.clone();
        let decoded =
            self.input
                .component
                .decoder()
                .decode(&frame)
                .map_err(|source| DeliverError::Codec {
                    uuid: input_uuid.clone(),
                    source,
                })?;

        // First matching logic device takes over routing and payload.
        let mut target_uuid = input_uuid;
        let mut target_topic = topic.to_string();
        let mut data = decoded;
        let mut matched: Option<&Entry<dyn LogicDevice>> = None;
        for logic in self.registry.logics_for_input(&self.input.meta.uuid) {
            if logic.component.check_if_match(&data) {
                matched = Some(logic);
                break;
            }
        }
        if let Some(logic) = matched {
            target_uuid = logic.meta.uuid.clone();
            if let Some(topic) = &logic.meta.topic {
                target_topic = topic.clone();
            }
            data = logic.component.transform(data);
            self.ctx.on_if_log_verbose(|| {
                debug!(logic = %logic.meta.label(), topic = %target_topic, "logic device rerouted event");
            });
        }

        let (mut session, reply_rx) = EventSession::new(target_uuid, target_topic, data);
        session.add_attribute(ATTR_INPUT_TYPE, self.input.meta.type_name.clone());
        session.add_attribute(ATTR_INPUT_NAME, self.input.meta.name.clone());
        if let Some(logic) = matched {
            session.add_attribute(ATTR_LOGIC_TYPE, logic.meta.type_name.clone());
            session.add_attribute(ATTR_LOGIC_NAME, logic.meta.name.clone());
        }

        // Bounded queue: suspends here when the dispatcher is saturated.
        self.start_tx
            .send(session)
            .await
            .map_err(|_| DeliverError::Shutdown)?;

        let reply = reply_rx
            .await
            .map_err(|_| DeliverError::EmptyResponse)?;

        self.input
            .component
            .encoder()
            .encode(&reply)
            .map_err(|source| DeliverError::Codec {
                uuid: self.input.meta.uuid.clone(),
                source,
            })
    }
}

/// Uuid-addressed resolver drivers use to reach output devices.
pub(crate) struct PipelineOutputDeliverer {
    registry: Arc<Registry>,
    ctx: Context,
}

impl PipelineOutputDeliverer {
    pub(crate) fn new(registry: Arc<Registry>, ctx: Context) -> Self {
        Self { registry, ctx }
    }
}

#[async_trait]
impl OutputDeliverer for PipelineOutputDeliverer {
    async fn deliver(&self, uuid: &str, data: JsonMap) -> Result<JsonMap, DeliverError> {
        let entry = self
            .registry
            .output_by_uuid(uuid)
            .ok_or_else(|| DeliverError::UnknownOutput(uuid.to_string()))?;

        let frame = entry
            .component
            .encoder()
            .encode(&data)
            .map_err(|source| DeliverError::Codec {
                uuid: uuid.to_string(),
                source,
            })?;

        let response = entry
            .component
            .process(frame, &self.ctx)
            .await
            .map_err(|source| DeliverError::Process {
                uuid: uuid.to_string(),
                source,
            })?;

        entry
            .component
            .decoder()
            .decode(&response)
            .map_err(|source| DeliverError::Codec {
                uuid: uuid.to_string(),
                source,
            })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComponentConfig, PipelineConfig};
    use crate::factory::FactoryRegistry;
    use serde_json::json;

    fn registry_with_echo_output() -> (Arc<Registry>, Context) {
        let ctx = Context::builder().build();
        let mut config = PipelineConfig::default();
        config
            .outputs
            .push(ComponentConfig::new("EchoOutput", "relay-1", "relay"));
        let factories = FactoryRegistry::with_builtins();
        let registry = Arc::new(Registry::build(&config, &factories, &ctx).unwrap());
        (registry, ctx)
    }

    #[tokio::test]
    async fn output_deliverer_roundtrips_through_device() {
        let (registry, ctx) = registry_with_echo_output();
        let deliverer = PipelineOutputDeliverer::new(registry, ctx);

        let mut data = JsonMap::new();
        data.insert("relay".into(), json!(3));
        let reply = deliverer.deliver("relay-1", data.clone()).await.unwrap();
        assert_eq!(reply, data);
    }

    #[tokio::test]
    async fn output_deliverer_unknown_uuid() {
        let (registry, ctx) = registry_with_echo_output();
        let deliverer = PipelineOutputDeliverer::new(registry, ctx);

        let err = deliverer
            .deliver("missing-uuid", JsonMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DeliverError::UnknownOutput(uuid) if uuid == "missing-uuid"));
    }
}
