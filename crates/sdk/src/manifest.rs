//! Declarative plugin manifest.
//!
//! A manifest tells the host what a plugin offers: metadata, permission
//! features, a settings schema, entities and their schemas. Routes and GUI
//! modules are built separately from a [`crate::plugin::PluginContext`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::feature::{FeatureDefinition, Requirement, qualify};

/// Plugin metadata and declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Qualified plugin ID, e.g. `vendor/plugin`.
    pub id: String,
    /// Friendly name.
    pub name: String,
    /// Brief description.
    pub purpose: String,
    pub version: String,
    pub author: String,
    pub vendor: String,
    /// Plugins this plugin depends on.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Features with short names, qualified by `id` on registration.
    #[serde(default)]
    pub features: Vec<FeatureDefinition>,
    #[serde(default)]
    pub settings: Vec<SettingDefinition>,
    /// SVG path data.
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

impl PluginManifest {
    /// Qualify a short feature name with the plugin ID.
    pub fn feature(&self, name: &str) -> String {
        qualify(&self.id, name)
    }

    /// Feature definitions with qualified names.
    pub fn qualified_features(&self) -> Vec<FeatureDefinition> {
        self.features.iter().map(|f| f.qualified(&self.id)).collect()
    }

    /// Default value of every declared setting.
    pub fn default_settings(&self) -> Map<String, Value> {
        self.settings
            .iter()
            .map(|s| (s.key.clone(), s.default.clone()))
            .collect()
    }

    /// Overlay configured values onto the declared defaults.
    ///
    /// Keys that are not declared are dropped.
    pub fn resolve_settings(&self, configured: &Map<String, Value>) -> Map<String, Value> {
        let mut settings = self.default_settings();
        for (key, value) in configured {
            if let Some(slot) = settings.get_mut(key) {
                *slot = value.clone();
            } else {
                tracing::warn!(plugin = %self.id, setting = %key, "ignoring undeclared setting");
            }
        }
        settings
    }
}

/// Type of a configurable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    /// Free text.
    String,
    /// Key-value mapping.
    Keys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDefinition {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: SettingKind,
    pub label: String,
    pub default: Value,
}

impl SettingDefinition {
    pub fn new(key: &str, kind: SettingKind, label: &str, default: Value) -> Self {
        Self {
            key: key.into(),
            kind,
            label: label.into(),
            default,
        }
    }
}

/// Entry in the host GUI's navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub cluster: String,
    pub icon: String,
    pub title: String,
}

/// A GUI module shipped by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiModule {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Requirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<MenuEntry>,
}

/// Kind of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Html,
}

/// A single field within an entity schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: FieldKind,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    /// Value is a map of language code to value.
    #[serde(default)]
    pub translatable: bool,
    /// Offered as a search filter.
    #[serde(default)]
    pub filter: bool,
    /// Offered as a list column.
    #[serde(default)]
    pub column: bool,
}

impl FieldDefinition {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: name.into(),
            required: false,
            translatable: false,
            filter: false,
            column: false,
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn translatable(mut self) -> Self {
        self.translatable = true;
        self
    }

    pub fn filter(mut self) -> Self {
        self.filter = true;
        self
    }

    pub fn column(mut self) -> Self {
        self.column = true;
        self
    }
}

/// An entity (content type) and the store holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Qualified entity name, e.g. `vendor/thing`.
    pub name: String,
    /// Store name; the entity name addresses the same store.
    pub store: String,
    /// Feature lifting owner scoping on `find`. Without it every user sees
    /// every document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub see_all: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

impl EntityDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest() -> PluginManifest {
        PluginManifest {
            id: "acme/notes".into(),
            name: "Notes".into(),
            purpose: "Take notes".into(),
            version: "0.1.0".into(),
            author: "A".into(),
            vendor: "Acme".into(),
            requires: vec![],
            features: vec![
                FeatureDefinition::new("read", "Read"),
                FeatureDefinition::new("write", "Write").requires(Requirement::feature("read")),
            ],
            settings: vec![
                SettingDefinition::new("preview", SettingKind::String, "preview url", json!("")),
                SettingDefinition::new("channels", SettingKind::Keys, "channels", json!({})),
            ],
            icon: String::new(),
            entities: vec![],
        }
    }

    #[test]
    fn features_are_qualified() {
        let features = manifest().qualified_features();
        assert_eq!(features[1].name, "acme/notes/write");
        assert_eq!(features[1].requires, vec![Requirement::feature("acme/notes/read")]);
    }

    #[test]
    fn settings_overlay_defaults() {
        let mut configured = Map::new();
        configured.insert("preview".into(), json!("https://example.com/"));
        configured.insert("bogus".into(), json!(1));

        let settings = manifest().resolve_settings(&configured);
        assert_eq!(settings["preview"], json!("https://example.com/"));
        assert_eq!(settings["channels"], json!({}));
        assert!(!settings.contains_key("bogus"));
    }

    #[test]
    fn setting_kind_serializes_as_type() {
        let def = SettingDefinition::new("channels", SettingKind::Keys, "channels", json!({}));
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["type"], json!("keys"));
    }
}
