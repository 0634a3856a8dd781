//! Configuration tree types.
//!
//! All types implement [`Default`] so a partial file (or none at all)
//! falls back to compile-time defaults.

use super::ConfigError;
use gantry_component::EngineSettings;
use gantry_event::JsonMap;
use gantry_types::TopicExpr;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The whole configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Engine settings (`events_capacity`, `fail_fast`, `log_verbose`).
    pub engine: EngineSettings,

    /// Free-form values shared across components, readable through the
    /// context.
    pub globals: JsonMap,

    /// Lifecycle-only components.
    pub plugins: Vec<ComponentConfig>,

    /// Output devices, resolvable by uuid.
    pub outputs: Vec<ComponentConfig>,

    /// Interceptors, ordered by `priority`.
    pub interceptors: Vec<ComponentConfig>,

    /// Drivers, matched by topic in declaration order.
    pub drivers: Vec<ComponentConfig>,

    /// Input devices.
    pub inputs: Vec<ComponentConfig>,

    /// Logic devices, each bound to a parent input via `input_uuid`.
    pub logics: Vec<ComponentConfig>,
}

impl PipelineConfig {
    /// Validates the cross-entry invariants the type system cannot
    /// express.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroCapacity`]: `events_capacity == 0`
    /// - [`ConfigError::DuplicateUuid`]: two outputs share a uuid
    /// - [`ConfigError::MissingInputUuid`] / [`ConfigError::UnknownInput`]
    ///   for a logic entry with a missing or dangling parent reference
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.events_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        let mut output_uuids = HashSet::new();
        for output in &self.outputs {
            if !output_uuids.insert(output.uuid.as_str()) {
                return Err(ConfigError::DuplicateUuid(output.uuid.clone()));
            }
        }

        let input_uuids: HashSet<&str> =
            self.inputs.iter().map(|i| i.uuid.as_str()).collect();
        for logic in &self.logics {
            let parent = logic
                .input_uuid
                .as_deref()
                .ok_or_else(|| ConfigError::MissingInputUuid(logic.name.clone()))?;
            if !input_uuids.contains(parent) {
                return Err(ConfigError::UnknownInput {
                    name: logic.name.clone(),
                    input_uuid: parent.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// One component entry in any section.
///
/// `type` selects the factory; `uuid` and `name` identify the instance;
/// the routing fields apply to the roles that use them. Everything else
/// lands in [`options`](Self::options) and is handed to `on_init`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Factory name.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Instance identifier. Unique across output devices.
    pub uuid: String,

    /// Human-readable instance name.
    pub name: String,

    /// Emission topic (inputs, logic devices).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Subscription patterns (interceptors, drivers). Invalid patterns
    /// fail at parse time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_exprs: Vec<TopicExpr>,

    /// Interceptor ordering; lower runs earlier, ties by declaration
    /// order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    /// Parent input device (logic devices only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_uuid: Option<String>,

    /// Component-specific options, passed verbatim to `on_init`.
    #[serde(flatten)]
    pub options: JsonMap,
}

impl ComponentConfig {
    /// Minimal entry for programmatic construction.
    #[must_use]
    pub fn new(
        type_name: impl Into<String>,
        uuid: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            uuid: uuid.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the emission topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Adds a subscription pattern.
    ///
    /// # Panics
    ///
    /// Panics on an invalid pattern; intended for static configuration
    /// in code, where the pattern is a literal.
    #[must_use]
    pub fn with_topic_expr(mut self, pattern: &str) -> Self {
        let expr = TopicExpr::parse(pattern).expect("valid topic pattern");
        self.topic_exprs.push(expr);
        self
    }

    /// Sets the interceptor priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Binds a logic device to its parent input.
    #[must_use]
    pub fn with_input_uuid(mut self, input_uuid: impl Into<String>) -> Self {
        self.input_uuid = Some(input_uuid.into());
        self
    }

    /// Adds a component-specific option.
    #[must_use]
    pub fn with_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}
