//! Component option maps.

use crate::ComponentError;
use gantry_event::JsonMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Options handed to a component's `on_init`.
///
/// Carries the component-specific keys from the configuration entry
/// (everything beyond the routing metadata). A component can poke at
/// individual keys, or decode the whole map into a typed struct:
///
/// ```
/// use gantry_component::ComponentOptions;
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct RelayOptions {
///     channel: u8,
///     #[serde(default)]
///     inverted: bool,
/// }
///
/// let mut map = gantry_event::JsonMap::new();
/// map.insert("channel".into(), json!(3));
/// let opts = ComponentOptions::new(map);
///
/// let relay: RelayOptions = opts.decode().unwrap();
/// assert_eq!(relay.channel, 3);
/// assert!(!relay.inverted);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComponentOptions {
    map: JsonMap,
}

impl ComponentOptions {
    /// Wraps an option map.
    #[must_use]
    pub fn new(map: JsonMap) -> Self {
        Self { map }
    }

    /// Returns `true` when no options were configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The raw option map.
    #[must_use]
    pub fn raw(&self) -> &JsonMap {
        &self.map
    }

    /// Looks up a single option value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// String option, or `None` if absent or not a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(Value::as_str)
    }

    /// Integer option, or `None` if absent or not an integer.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.map.get(key).and_then(Value::as_u64)
    }

    /// Boolean option, or `None` if absent or not a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).and_then(Value::as_bool)
    }

    /// Decodes the whole map into a typed options struct.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidOptions`] when the map does not
    /// match the target shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ComponentError> {
        serde_json::from_value(Value::Object(self.map.clone()))
            .map_err(|e| ComponentError::InvalidOptions(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn opts(pairs: &[(&str, Value)]) -> ComponentOptions {
        let mut map = JsonMap::new();
        for (k, v) in pairs {
            map.insert((*k).into(), v.clone());
        }
        ComponentOptions::new(map)
    }

    #[test]
    fn typed_getters() {
        let o = opts(&[
            ("host", json!("10.0.0.2")),
            ("port", json!(502)),
            ("keepalive", json!(true)),
        ]);
        assert_eq!(o.get_str("host"), Some("10.0.0.2"));
        assert_eq!(o.get_u64("port"), Some(502));
        assert_eq!(o.get_bool("keepalive"), Some(true));
        assert_eq!(o.get_str("port"), None);
        assert!(o.get("missing").is_none());
    }

    #[test]
    fn decode_into_struct() {
        #[derive(Deserialize)]
        struct Target {
            host: String,
            port: u16,
        }

        let o = opts(&[("host", json!("10.0.0.2")), ("port", json!(502))]);
        let t: Target = o.decode().unwrap();
        assert_eq!(t.host, "10.0.0.2");
        assert_eq!(t.port, 502);
    }

    #[test]
    fn decode_failure_is_invalid_options() {
        #[derive(Deserialize, Debug)]
        #[allow(dead_code)]
        struct Target {
            port: u16,
        }

        let o = opts(&[("port", json!("not a number"))]);
        let err = o.decode::<Target>().unwrap_err();
        assert!(matches!(err, ComponentError::InvalidOptions(_)));
    }

    #[test]
    fn empty_options() {
        assert!(ComponentOptions::default().is_empty());
    }
}
