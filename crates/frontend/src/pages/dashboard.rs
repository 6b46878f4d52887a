use dioxus::prelude::*;

use crate::components::filter_bar::FilterBar;
use crate::components::map_view::MapView;
use crate::components::stats_panel::StatsPanel;
use crate::controller;
use crate::state::use_ui_state;

#[component]
pub fn Dashboard() -> Element {
    let ui = use_ui_state();

    // First load: everything unfiltered, municipality control disabled.
    use_effect(move || {
        controller::apply_filters(ui, String::new(), String::new());
    });

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "Laquila" }
                FilterBar { ui }
            }
            StatsPanel { ui }
            MapView { ui }
        }
    }
}
