use dioxus::prelude::*;
use laquila_shared::models::STATES;

use crate::controller;
use crate::state::UiState;

#[component]
pub fn FilterBar(ui: UiState) -> Element {
    let filter = ui.filter.read();
    let selection = filter.selection().clone();
    let municipalities = filter.municipality_options().to_vec();
    let disabled = filter.municipality_disabled();
    drop(filter);

    let state_value = selection.state.clone();
    let municipality_value = selection.municipality.clone();

    rsx! {
        div { class: "filters",
            select {
                id: "uf",
                "aria-label": "Estado",
                value: "{state_value}",
                onchange: move |evt: Event<FormData>| {
                    let municipality = ui.filter.peek().selection().municipality.clone();
                    controller::apply_filters(ui, evt.value(), municipality);
                },
                option { value: "", "Todos os estados" }
                for (uf, name) in STATES {
                    option {
                        value: "{uf}",
                        selected: selection.state == uf,
                        "{name}"
                    }
                }
            }
            select {
                id: "city",
                "aria-label": "Município",
                value: "{municipality_value}",
                disabled,
                onchange: move |evt: Event<FormData>| {
                    let state = ui.filter.peek().selection().state.clone();
                    controller::apply_filters(ui, state, evt.value());
                },
                option { value: "", "Todos os municípios" }
                for municipality in municipalities {
                    option {
                        value: "{municipality}",
                        selected: selection.municipality == municipality,
                        "{municipality}"
                    }
                }
            }
        }
    }
}
