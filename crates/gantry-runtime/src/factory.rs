//! Component factories.
//!
//! Configuration entries name their component by a `type` string; the
//! factory registry maps that string to a constructor. The constructor
//! returns a [`ComponentInstance`] (the one place the six roles meet)
//! and the registry checks the role against the section the entry came
//! from.

use crate::PipelineError;
use gantry_component::{Driver, InputDevice, Interceptor, LogicDevice, OutputDevice, Plugin};
use std::collections::HashMap;

/// The role a component plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Plugin,
    Output,
    Interceptor,
    Driver,
    Input,
    Logic,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Plugin => "plugin",
            Self::Output => "output device",
            Self::Interceptor => "interceptor",
            Self::Driver => "driver",
            Self::Input => "input device",
            Self::Logic => "logic device",
        };
        f.write_str(name)
    }
}

/// A freshly constructed, not yet initialized component.
pub enum ComponentInstance {
    Plugin(Box<dyn Plugin>),
    Output(Box<dyn OutputDevice>),
    Interceptor(Box<dyn Interceptor>),
    Driver(Box<dyn Driver>),
    Input(Box<dyn InputDevice>),
    Logic(Box<dyn LogicDevice>),
}

impl ComponentInstance {
    /// The role of this instance.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Plugin(_) => ComponentKind::Plugin,
            Self::Output(_) => ComponentKind::Output,
            Self::Interceptor(_) => ComponentKind::Interceptor,
            Self::Driver(_) => ComponentKind::Driver,
            Self::Input(_) => ComponentKind::Input,
            Self::Logic(_) => ComponentKind::Logic,
        }
    }
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ComponentInstance({})", self.kind())
    }
}

type Constructor = Box<dyn Fn() -> ComponentInstance + Send + Sync>;

/// Maps configuration `type` names to component constructors.
///
/// [`FactoryRegistry::with_builtins`] pre-registers the bundled
/// components; embedders add their own before pipeline init.
#[derive(Default)]
pub struct FactoryRegistry {
    constructors: HashMap<String, Constructor>,
}

impl FactoryRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the bundled components registered
    /// (`NopDriver`, `EchoOutput`, `TimerInput`).
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::components::register_builtins(&mut registry);
        registry
    }

    /// Registers a constructor under `type_name`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DuplicateType`] when the name is taken.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        constructor: impl Fn() -> ComponentInstance + Send + Sync + 'static,
    ) -> Result<(), PipelineError> {
        let type_name = type_name.into();
        if self.constructors.contains_key(&type_name) {
            return Err(PipelineError::DuplicateType(type_name));
        }
        self.constructors.insert(type_name, Box::new(constructor));
        Ok(())
    }

    /// Constructs a fresh instance of `type_name`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::UnknownType`] when no factory has the name.
    pub fn create(&self, type_name: &str) -> Result<ComponentInstance, PipelineError> {
        match self.constructors.get(type_name) {
            Some(constructor) => Ok(constructor()),
            None => Err(PipelineError::UnknownType(type_name.to_string())),
        }
    }

    /// Returns `true` when a factory is registered under `type_name`.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns `true` when no factory is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::NopDriver;

    #[test]
    fn register_and_create() {
        let mut registry = FactoryRegistry::new();
        registry
            .register("NopDriver", || {
                ComponentInstance::Driver(Box::new(NopDriver::default()))
            })
            .unwrap();

        let instance = registry.create("NopDriver").unwrap();
        assert_eq!(instance.kind(), ComponentKind::Driver);
        assert!(registry.contains("NopDriver"));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = FactoryRegistry::new();
        let ctor = || ComponentInstance::Driver(Box::new(NopDriver::default()));
        registry.register("NopDriver", ctor).unwrap();
        let err = registry.register("NopDriver", ctor).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateType(_)));
    }

    #[test]
    fn unknown_type_rejected() {
        let registry = FactoryRegistry::new();
        assert!(matches!(
            registry.create("Nope"),
            Err(PipelineError::UnknownType(_))
        ));
    }

    #[test]
    fn builtins_present() {
        let registry = FactoryRegistry::with_builtins();
        assert!(registry.contains("NopDriver"));
        assert!(registry.contains("EchoOutput"));
        assert!(registry.contains("TimerInput"));
    }

    #[test]
    fn kind_names() {
        assert_eq!(ComponentKind::Output.to_string(), "output device");
        assert_eq!(ComponentKind::Interceptor.to_string(), "interceptor");
    }
}
