//! Schema of the flatpage entity.

use webdesq_sdk::prelude::{EntityDefinition, FieldDefinition, FieldKind};

use crate::{ENTITY, STORE, features};

/// The `smartyellow/flatpage` entity definition.
pub fn flatpage_entity() -> EntityDefinition {
    EntityDefinition {
        name: ENTITY.into(),
        store: STORE.into(),
        see_all: Some(features::SEE_ALL.into()),
        fields: vec![
            FieldDefinition::new("title", FieldKind::String)
                .label("title")
                .required()
                .translatable()
                .filter()
                .column(),
            FieldDefinition::new("slug", FieldKind::String)
                .label("slug")
                .filter()
                .column(),
            FieldDefinition::new("body", FieldKind::Html)
                .label("body")
                .translatable(),
        ],
    }
}
