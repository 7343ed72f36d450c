//! Plugin manifest: metadata, features, settings schema, entities.

use serde_json::json;
use webdesq_sdk::prelude::{
    FeatureDefinition, PluginManifest, Requirement, SettingDefinition, SettingKind,
};

use crate::{PLUGIN_ID, flatpage_entity};

/// SVG path data for the page icon.
pub const PAGE_ICON: &str = r#"<path d="M655.754 280.617H490.34c-38.402 0-62.031-23.633-62.031-62.031V53.168c0-13.293-10.34-23.629-23.633-23.629H159.508c-38.399 0-70.89 32.492-70.89 70.89V667.57c0 38.399 32.491 70.89 70.89 70.89h448.984c38.399 0 70.89-32.491 70.89-70.89V304.246c0-13.293-10.335-23.629-23.628-23.629Zm0 0"/><path d="M674.953 190.523 518.398 33.97c-2.953-2.953-8.859-4.43-13.289-4.43-8.863 0-17.726 7.383-17.726 16.246v125.54c0 26.581 23.633 50.214 50.219 50.214h125.535c8.863 0 16.246-8.863 16.246-17.723 0-4.433-1.477-10.34-4.43-13.293Zm0 0"/>"#;

/// Permission features, with short names.
fn features() -> Vec<FeatureDefinition> {
    vec![
        FeatureDefinition::new("seeMyFlatpages", "See my flatpages"),
        FeatureDefinition::new("seeAllFlatpages", "See all flatpages"),
        FeatureDefinition::new("editFlatpages", "Edit flatpages")
            .requires(Requirement::any_of(["seeMyFlatpages", "seeAllFlatpages"])),
        FeatureDefinition::new("createFlatpages", "Create flatpages")
            .requires(Requirement::feature("editFlatpages")),
        FeatureDefinition::new("deleteFlatpages", "Delete flatpages")
            .requires(Requirement::feature("createFlatpages")),
    ]
}

fn settings() -> Vec<SettingDefinition> {
    vec![
        SettingDefinition::new("preview", SettingKind::String, "preview url", json!("")),
        SettingDefinition::new("channels", SettingKind::Keys, "channels", json!({})),
    ]
}

/// The flatpages plugin manifest.
pub fn manifest() -> PluginManifest {
    PluginManifest {
        id: PLUGIN_ID.into(),
        name: "Flatpages".into(),
        purpose: r#"Create "flatpages" consisting of rich text"#.into(),
        version: "1.0.0".into(),
        author: "Romein van Buren".into(),
        vendor: "Smart Yellow".into(),
        requires: vec!["webdesq/sessions".into(), "webdesq/storage".into()],
        features: features(),
        settings: settings(),
        icon: PAGE_ICON.into(),
        entities: vec![flatpage_entity()],
    }
}
