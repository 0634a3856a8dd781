//! Component registry.
//!
//! Typed collections of initialized components, frozen before the
//! pipeline starts serving. Every collection preserves declaration
//! order except interceptors, which are re-sorted stably by ascending
//! priority. Output devices are additionally indexed by uuid; logic
//! devices are grouped under their parent input.

use crate::config::ComponentConfig;
use crate::factory::{ComponentInstance, ComponentKind, FactoryRegistry};
use crate::PipelineError;
use gantry_component::{
    Component, ComponentOptions, Context, Driver, InputDevice, Interceptor, LogicDevice,
    OutputDevice, Plugin,
};
use gantry_types::TopicExpr;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routing metadata of one registered component.
///
/// Lives in the registry, not on the component: implementations stay
/// free of identity bookkeeping.
#[derive(Debug, Clone)]
pub struct ComponentMeta {
    /// Factory name the instance was built from.
    pub type_name: String,
    /// Instance identifier.
    pub uuid: String,
    /// Human-readable instance name.
    pub name: String,
    /// Emission topic (inputs, logic devices).
    pub topic: Option<String>,
    /// Subscription patterns (interceptors, drivers).
    pub topic_exprs: Vec<TopicExpr>,
    /// Interceptor ordering, lower first. Defaults to 0.
    pub priority: i32,
    /// Parent input device (logic devices only).
    pub input_uuid: Option<String>,
}

impl ComponentMeta {
    fn from_config(config: &ComponentConfig) -> Self {
        Self {
            type_name: config.type_name.clone(),
            uuid: config.uuid.clone(),
            name: config.name.clone(),
            topic: config.topic.clone(),
            topic_exprs: config.topic_exprs.clone(),
            priority: config.priority.unwrap_or(0),
            input_uuid: config.input_uuid.clone(),
        }
    }

    /// `Type[name]` label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}[{}]", self.type_name, self.name)
    }
}

/// A registered component with its metadata.
pub struct Entry<T: ?Sized> {
    pub meta: ComponentMeta,
    pub component: Arc<T>,
}

impl<T: ?Sized> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta.clone(),
            component: Arc::clone(&self.component),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry").field("meta", &self.meta).finish()
    }
}

/// Frozen collections of the pipeline's components.
#[derive(Default, Debug)]
pub struct Registry {
    plugins: Vec<Entry<dyn Plugin>>,
    outputs: Vec<Entry<dyn OutputDevice>>,
    outputs_by_uuid: HashMap<String, Entry<dyn OutputDevice>>,
    interceptors: Vec<Entry<dyn Interceptor>>,
    drivers: Vec<Entry<dyn Driver>>,
    inputs: Vec<Entry<dyn InputDevice>>,
    logics: Vec<Entry<dyn LogicDevice>>,
    logics_by_input: HashMap<String, Vec<Entry<dyn LogicDevice>>>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from the configuration sections.
    ///
    /// Sections register in startup order (plugins, outputs,
    /// interceptors, drivers, inputs, logics); every component
    /// receives exactly one `on_init` here, before anything starts.
    ///
    /// # Errors
    ///
    /// Factory resolution, role mismatches, duplicate output uuids,
    /// dangling logic parents and `on_init` failures all abort the
    /// build.
    pub fn build(
        config: &crate::config::PipelineConfig,
        factories: &FactoryRegistry,
        ctx: &Context,
    ) -> Result<Self, PipelineError> {
        let mut registry = Self::new();
        registry.register_section(ComponentKind::Plugin, &config.plugins, factories, ctx)?;
        registry.register_section(ComponentKind::Output, &config.outputs, factories, ctx)?;
        registry.register_section(
            ComponentKind::Interceptor,
            &config.interceptors,
            factories,
            ctx,
        )?;
        registry.register_section(ComponentKind::Driver, &config.drivers, factories, ctx)?;
        registry.register_section(ComponentKind::Input, &config.inputs, factories, ctx)?;
        registry.register_section(ComponentKind::Logic, &config.logics, factories, ctx)?;
        registry.freeze();
        Ok(registry)
    }

    /// Instantiates and initializes every entry of one section.
    ///
    /// # Errors
    ///
    /// See [`Registry::build`].
    pub fn register_section(
        &mut self,
        kind: ComponentKind,
        configs: &[ComponentConfig],
        factories: &FactoryRegistry,
        ctx: &Context,
    ) -> Result<(), PipelineError> {
        if configs.is_empty() {
            warn!(section = %kind, "no components configured");
            return Ok(());
        }
        for config in configs {
            self.register_one(kind, config, factories, ctx)?;
        }
        Ok(())
    }

    fn register_one(
        &mut self,
        kind: ComponentKind,
        config: &ComponentConfig,
        factories: &FactoryRegistry,
        ctx: &Context,
    ) -> Result<(), PipelineError> {
        let mut instance = factories.create(&config.type_name)?;
        if instance.kind() != kind {
            return Err(PipelineError::KindMismatch {
                name: config.name.clone(),
                type_name: config.type_name.clone(),
                expected: kind,
                actual: instance.kind(),
            });
        }

        let options = ComponentOptions::new(config.options.clone());
        let init_result = match &mut instance {
            ComponentInstance::Plugin(c) => c.on_init(options, ctx),
            ComponentInstance::Output(c) => c.on_init(options, ctx),
            ComponentInstance::Interceptor(c) => c.on_init(options, ctx),
            ComponentInstance::Driver(c) => c.on_init(options, ctx),
            ComponentInstance::Input(c) => c.on_init(options, ctx),
            ComponentInstance::Logic(c) => c.on_init(options, ctx),
        };
        init_result.map_err(|source| PipelineError::Init {
            name: config.name.clone(),
            source,
        })?;

        let meta = ComponentMeta::from_config(config);
        debug!(component = %meta.label(), section = %kind, "registered");
        match instance {
            ComponentInstance::Plugin(c) => self.plugins.push(Entry {
                meta,
                component: Arc::from(c),
            }),
            ComponentInstance::Output(c) => {
                let entry = Entry {
                    meta,
                    component: Arc::<dyn OutputDevice>::from(c),
                };
                if self
                    .outputs_by_uuid
                    .insert(entry.meta.uuid.clone(), entry.clone())
                    .is_some()
                {
                    return Err(PipelineError::DuplicateUuid(entry.meta.uuid.clone()));
                }
                self.outputs.push(entry);
            }
            ComponentInstance::Interceptor(c) => self.interceptors.push(Entry {
                meta,
                component: Arc::from(c),
            }),
            ComponentInstance::Driver(c) => self.drivers.push(Entry {
                meta,
                component: Arc::from(c),
            }),
            ComponentInstance::Input(c) => self.inputs.push(Entry {
                meta,
                component: Arc::from(c),
            }),
            ComponentInstance::Logic(c) => {
                let entry = Entry {
                    meta,
                    component: Arc::<dyn LogicDevice>::from(c),
                };
                let parent = entry.meta.input_uuid.clone().unwrap_or_default();
                if !self.inputs.iter().any(|input| input.meta.uuid == parent) {
                    return Err(PipelineError::UnknownInput {
                        name: entry.meta.name.clone(),
                        input_uuid: parent,
                    });
                }
                self.logics_by_input
                    .entry(parent)
                    .or_default()
                    .push(entry.clone());
                self.logics.push(entry);
            }
        }
        Ok(())
    }

    /// Orders interceptors by priority. Called once, after the last
    /// section registered.
    pub fn freeze(&mut self) {
        // Stable sort: ties keep declaration order.
        self.interceptors.sort_by_key(|entry| entry.meta.priority);
    }

    /// Interceptors, in execution order.
    #[must_use]
    pub fn interceptors(&self) -> &[Entry<dyn Interceptor>] {
        &self.interceptors
    }

    /// Drivers, in declaration order.
    #[must_use]
    pub fn drivers(&self) -> &[Entry<dyn Driver>] {
        &self.drivers
    }

    /// Input devices, in declaration order.
    #[must_use]
    pub fn inputs(&self) -> &[Entry<dyn InputDevice>] {
        &self.inputs
    }

    /// Output devices, in declaration order.
    #[must_use]
    pub fn outputs(&self) -> &[Entry<dyn OutputDevice>] {
        &self.outputs
    }

    /// Resolves an output device by uuid.
    #[must_use]
    pub fn output_by_uuid(&self, uuid: &str) -> Option<&Entry<dyn OutputDevice>> {
        self.outputs_by_uuid.get(uuid)
    }

    /// Logic devices attached to the given input, in declaration order.
    #[must_use]
    pub fn logics_for_input(&self, input_uuid: &str) -> &[Entry<dyn LogicDevice>] {
        self.logics_by_input
            .get(input_uuid)
            .map_or(&[], Vec::as_slice)
    }

    /// Every component receiving `on_start`, in start order:
    /// plugins → outputs → drivers → inputs → logics.
    ///
    /// Interceptors have no lifecycle; they only receive `on_init`.
    #[must_use]
    pub fn start_chain(&self) -> Vec<(String, Arc<dyn Component>)> {
        let mut chain: Vec<(String, Arc<dyn Component>)> = Vec::new();
        for entry in &self.plugins {
            let component: Arc<dyn Component> = entry.component.clone();
            chain.push((entry.meta.label(), component));
        }
        for entry in &self.outputs {
            let component: Arc<dyn Component> = entry.component.clone();
            chain.push((entry.meta.label(), component));
        }
        for entry in &self.drivers {
            let component: Arc<dyn Component> = entry.component.clone();
            chain.push((entry.meta.label(), component));
        }
        for entry in &self.inputs {
            let component: Arc<dyn Component> = entry.component.clone();
            chain.push((entry.meta.label(), component));
        }
        for entry in &self.logics {
            let component: Arc<dyn Component> = entry.component.clone();
            chain.push((entry.meta.label(), component));
        }
        chain
    }

    /// Every component receiving `on_stop`, in stop order:
    /// inputs → drivers → outputs → plugins.
    ///
    /// Logic devices are not in this chain: they ride on their parent
    /// input and never receive `on_stop`.
    #[must_use]
    pub fn stop_chain(&self) -> Vec<(String, Arc<dyn Component>)> {
        let mut chain: Vec<(String, Arc<dyn Component>)> = Vec::new();
        for entry in &self.inputs {
            let component: Arc<dyn Component> = entry.component.clone();
            chain.push((entry.meta.label(), component));
        }
        for entry in &self.drivers {
            let component: Arc<dyn Component> = entry.component.clone();
            chain.push((entry.meta.label(), component));
        }
        for entry in &self.outputs {
            let component: Arc<dyn Component> = entry.component.clone();
            chain.push((entry.meta.label(), component));
        }
        for entry in &self.plugins {
            let component: Arc<dyn Component> = entry.component.clone();
            chain.push((entry.meta.label(), component));
        }
        chain
    }

    /// Total number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
            + self.outputs.len()
            + self.interceptors.len()
            + self.drivers.len()
            + self.inputs.len()
            + self.logics.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use gantry_component::{ComponentError, HandlerError};
    use gantry_event::EventSession;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Interceptor that counts its `on_init` calls.
    struct CountingInterceptor {
        inits: Arc<AtomicUsize>,
    }

    impl Component for CountingInterceptor {
        fn on_init(
            &mut self,
            _options: ComponentOptions,
            _ctx: &Context,
        ) -> Result<(), ComponentError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Interceptor for CountingInterceptor {
        fn handle(
            &self,
            _session: &mut EventSession,
            _ctx: &Context,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    fn interceptor_factory(inits: Arc<AtomicUsize>) -> FactoryRegistry {
        let mut factories = crate::FactoryRegistry::with_builtins();
        factories
            .register("Counting", move || {
                ComponentInstance::Interceptor(Box::new(CountingInterceptor {
                    inits: inits.clone(),
                }))
            })
            .unwrap();
        factories
    }

    fn ctx() -> Context {
        Context::builder().build()
    }

    #[test]
    fn on_init_runs_exactly_once_per_component() {
        let inits = Arc::new(AtomicUsize::new(0));
        let factories = interceptor_factory(inits.clone());

        let mut config = PipelineConfig::default();
        for i in 0..3 {
            config.interceptors.push(
                ComponentConfig::new("Counting", format!("ic-{i}"), format!("audit-{i}"))
                    .with_topic_expr("#"),
            );
        }

        let registry = Registry::build(&config, &factories, &ctx()).unwrap();
        assert_eq!(registry.interceptors().len(), 3);
        assert_eq!(inits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn interceptors_sorted_by_priority_ties_keep_order() {
        let inits = Arc::new(AtomicUsize::new(0));
        let factories = interceptor_factory(inits);

        let mut config = PipelineConfig::default();
        config.interceptors.push(
            ComponentConfig::new("Counting", "ic-b", "late").with_priority(20),
        );
        config.interceptors.push(
            ComponentConfig::new("Counting", "ic-a", "early").with_priority(10),
        );
        config.interceptors.push(
            ComponentConfig::new("Counting", "ic-c", "tie").with_priority(10),
        );

        let registry = Registry::build(&config, &factories, &ctx()).unwrap();
        let names: Vec<&str> = registry
            .interceptors()
            .iter()
            .map(|e| e.meta.name.as_str())
            .collect();
        assert_eq!(names, ["early", "tie", "late"]);
    }

    #[test]
    fn duplicate_output_uuid_rejected() {
        let factories = crate::FactoryRegistry::with_builtins();
        let mut config = PipelineConfig::default();
        config.outputs.push(ComponentConfig::new("EchoOutput", "o1", "a"));
        config.outputs.push(ComponentConfig::new("EchoOutput", "o1", "b"));

        let err = Registry::build(&config, &factories, &ctx()).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateUuid(uuid) if uuid == "o1"));
    }

    #[test]
    fn kind_mismatch_rejected() {
        let factories = crate::FactoryRegistry::with_builtins();
        let mut config = PipelineConfig::default();
        // A driver type configured in the outputs section.
        config.outputs.push(ComponentConfig::new("NopDriver", "o1", "bad"));

        let err = Registry::build(&config, &factories, &ctx()).unwrap_err();
        assert!(matches!(err, PipelineError::KindMismatch { .. }));
    }

    #[test]
    fn output_resolution_by_uuid() {
        let factories = crate::FactoryRegistry::with_builtins();
        let mut config = PipelineConfig::default();
        config.outputs.push(ComponentConfig::new("EchoOutput", "o1", "relay"));

        let registry = Registry::build(&config, &factories, &ctx()).unwrap();
        assert!(registry.output_by_uuid("o1").is_some());
        assert!(registry.output_by_uuid("o2").is_none());
    }

    #[test]
    fn start_and_stop_chain_order() {
        struct PassLogic;
        impl Component for PassLogic {}
        impl LogicDevice for PassLogic {
            fn check_if_match(&self, _inbound: &gantry_event::JsonMap) -> bool {
                false
            }
            fn transform(&self, inbound: gantry_event::JsonMap) -> gantry_event::JsonMap {
                inbound
            }
        }
        let mut factories = crate::FactoryRegistry::with_builtins();
        factories
            .register("PassLogic", || ComponentInstance::Logic(Box::new(PassLogic)))
            .unwrap();

        let mut config = PipelineConfig::default();
        config.drivers.push(
            ComponentConfig::new("NopDriver", "d1", "sink").with_topic_expr("#"),
        );
        config.outputs.push(ComponentConfig::new("EchoOutput", "o1", "relay"));
        config.inputs.push(
            ComponentConfig::new("TimerInput", "t1", "tick").with_topic("/tick"),
        );
        config.logics.push(
            ComponentConfig::new("PassLogic", "lg1", "route")
                .with_topic("/routed")
                .with_input_uuid("t1"),
        );

        let registry = Registry::build(&config, &factories, &ctx()).unwrap();

        let start: Vec<String> = registry
            .start_chain()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            start,
            [
                "EchoOutput[relay]",
                "NopDriver[sink]",
                "TimerInput[tick]",
                "PassLogic[route]",
            ]
        );

        // Stop order is the device reverse; logic devices are absent.
        let stop: Vec<String> = registry
            .stop_chain()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            stop,
            [
                "TimerInput[tick]",
                "NopDriver[sink]",
                "EchoOutput[relay]",
            ]
        );
    }

    #[test]
    fn logic_bound_to_parent_input() {
        let factories = crate::FactoryRegistry::with_builtins();
        let mut config = PipelineConfig::default();
        config.inputs.push(
            ComponentConfig::new("TimerInput", "in-1", "tick").with_topic("/tick"),
        );

        // A logic device type for the test.
        struct PassLogic;
        impl Component for PassLogic {}
        impl LogicDevice for PassLogic {
            fn check_if_match(&self, _inbound: &gantry_event::JsonMap) -> bool {
                true
            }
            fn transform(&self, inbound: gantry_event::JsonMap) -> gantry_event::JsonMap {
                inbound
            }
        }
        let mut factories = factories;
        factories
            .register("PassLogic", || ComponentInstance::Logic(Box::new(PassLogic)))
            .unwrap();

        config.logics.push(
            ComponentConfig::new("PassLogic", "lg-1", "pass")
                .with_topic("/routed")
                .with_input_uuid("in-1"),
        );

        let registry = Registry::build(&config, &factories, &ctx()).unwrap();
        assert_eq!(registry.logics_for_input("in-1").len(), 1);
        assert!(registry.logics_for_input("in-2").is_empty());
    }

    #[test]
    fn logic_with_dangling_parent_rejected() {
        struct PassLogic;
        impl Component for PassLogic {}
        impl LogicDevice for PassLogic {
            fn check_if_match(&self, _inbound: &gantry_event::JsonMap) -> bool {
                true
            }
            fn transform(&self, inbound: gantry_event::JsonMap) -> gantry_event::JsonMap {
                inbound
            }
        }
        let mut factories = crate::FactoryRegistry::new();
        factories
            .register("PassLogic", || ComponentInstance::Logic(Box::new(PassLogic)))
            .unwrap();

        let mut registry = Registry::new();
        let entry = ComponentConfig::new("PassLogic", "lg-1", "pass").with_input_uuid("in-9");
        let err = registry
            .register_section(ComponentKind::Logic, &[entry], &factories, &ctx())
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownInput { .. }));
    }
}
