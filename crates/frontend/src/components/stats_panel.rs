use dioxus::prelude::*;

use crate::state::UiState;

#[component]
pub fn StatsPanel(ui: UiState) -> Element {
    let stats = ui.stats.read();
    let clients = stats.client_count_label();
    let market = stats.market_count_label();

    rsx! {
        div { class: "big-numbers",
            div { class: "big-number clients",
                span { class: "label", "Clientes" }
                span { id: "totalClients", class: "value", "{clients}" }
            }
            div { class: "big-number market",
                span { class: "label", "Mercado" }
                span { id: "totalMarket", class: "value", "{market}" }
            }
        }
    }
}
