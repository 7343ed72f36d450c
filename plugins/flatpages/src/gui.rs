//! GUI modules shipped with the plugin.

use webdesq_sdk::prelude::{GuiModule, MenuEntry, Requirement};

use crate::features;
use crate::manifest::PAGE_ICON;

/// The flatpages overview, listed under the content cluster.
pub fn gui_modules() -> Vec<GuiModule> {
    vec![GuiModule {
        path: "flatpages.svelte".into(),
        requires: Some(Requirement::any_of([features::SEE_MY, features::SEE_ALL])),
        menu: Some(MenuEntry {
            cluster: "content".into(),
            icon: PAGE_ICON.into(),
            title: "all flatpages".into(),
        }),
    }]
}
