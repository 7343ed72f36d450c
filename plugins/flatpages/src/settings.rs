//! Typed plugin settings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Settings configured for the flatpages plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatpagesSettings {
    /// Base URL the GUI uses to preview a page.
    #[serde(default)]
    pub preview: String,

    /// Channel keys and their values.
    #[serde(default)]
    pub channels: Map<String, Value>,
}

impl FlatpagesSettings {
    /// Convert the host's resolved settings map.
    pub fn from_map(settings: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(settings.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_map_uses_defaults() {
        let settings = FlatpagesSettings::from_map(&Map::new()).unwrap();
        assert_eq!(settings, FlatpagesSettings::default());
        assert!(settings.preview.is_empty());
        assert!(settings.channels.is_empty());
    }

    #[test]
    fn configured_values_are_read() {
        let Value::Object(map) = json!({
            "preview": "https://www.example.com/preview/",
            "channels": { "website": "https://www.example.com" },
        }) else {
            unreachable!()
        };

        let settings = FlatpagesSettings::from_map(&map).unwrap();
        assert_eq!(settings.preview, "https://www.example.com/preview/");
        assert_eq!(settings.channels["website"], json!("https://www.example.com"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let Value::Object(map) = json!({ "preview": 42 }) else {
            unreachable!()
        };
        assert!(FlatpagesSettings::from_map(&map).is_err());
    }
}
