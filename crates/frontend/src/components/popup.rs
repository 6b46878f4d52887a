use dioxus::prelude::*;
use laquila_shared::popup::{PopupState, POPUP_HEIGHT, POPUP_WIDTH};

use crate::state::UiState;

#[component]
pub fn Popup(ui: UiState) -> Element {
    let mut ui = ui;
    let opened = {
        let popup = ui.popup.read();
        let view = ui.view.read();
        match (popup.state(), popup.box_origin(&view)) {
            (PopupState::Open { content, .. }, Some(origin)) => Some((content.clone(), origin)),
            _ => None,
        }
    };
    let Some((content, (left, top))) = opened else {
        return rsx! {};
    };

    rsx! {
        div {
            class: "ol-popup",
            style: "left:{left}px;top:{top}px;width:{POPUP_WIDTH}px;height:{POPUP_HEIGHT}px;",
            // Interaction inside the popup must not reach the map.
            onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
            onmouseup: move |evt: Event<MouseData>| evt.stop_propagation(),
            ondoubleclick: move |evt: Event<MouseData>| evt.stop_propagation(),
            onwheel: move |evt: Event<WheelData>| evt.stop_propagation(),
            ontouchstart: move |evt: Event<TouchData>| evt.stop_propagation(),
            ontouchend: move |evt: Event<TouchData>| evt.stop_propagation(),

            a {
                class: "ol-popup-closer",
                href: "#",
                onclick: move |evt: Event<MouseData>| {
                    evt.prevent_default();
                    ui.popup.write().close();
                },
            }
            div { class: "popup-content",
                p { strong { "CNPJ:" } " {content.cnpj}" }
                p { strong { "Razão Social:" } " {content.razao_social}" }
                if let Some(nome) = &content.nome_fantasia {
                    p { strong { "Nome Fantasia:" } " {nome}" }
                }
                p { strong { "Município:" } " {content.municipio}" }
                p { strong { "UF:" } " {content.uf}" }
                p { strong { "Situação:" } " {content.situacao}" }
            }
        }
    }
}
