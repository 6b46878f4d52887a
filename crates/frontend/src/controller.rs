//! Wires the filter, stats, layer and popup state machines to the network.
//! Every function here must run inside a Dioxus scope since it spawns tasks.

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use laquila_shared::endpoints::API_BASE;
use laquila_shared::filter::FilterEffect;
use laquila_shared::gesture::{PanAnimation, ANIMATION_FRAME_MS, PAN_ANIMATION_MS};
use laquila_shared::layers::{hit_test_companies, LayerSpec, TileRequest, VectorTileLayer};
use laquila_shared::mercator::MapView;
use laquila_shared::models::FilterSelection;
use laquila_shared::popup::auto_pan_delta;
use laquila_shared::sequence::Ticket;
use laquila_shared::tiles::decode_tile;
use tracing::{debug, error};

use crate::api;
use crate::state::UiState;

/// React to a change on either filter control.
pub fn apply_filters(mut ui: UiState, state: String, municipality: String) {
    let update = ui.filter.write().apply(&state, &municipality);
    if update.municipality_reset {
        debug!(state = %state, "state changed, municipality filter cleared");
    }

    for effect in update.effects() {
        match effect {
            FilterEffect::LoadMunicipalities { state, ticket } => {
                load_municipalities(ui, state, ticket)
            }
            FilterEffect::RefreshStats(selection) => refresh_stats(ui, selection),
            FilterEffect::RebuildLayers(selection) => refresh_layers(ui, &selection),
        }
    }
}

fn load_municipalities(mut ui: UiState, state: String, ticket: Ticket) {
    spawn(async move {
        match api::fetch_municipalities(&state).await {
            Ok(list) => {
                if !ui.filter.write().accept_municipality_list(ticket, list) {
                    debug!(state = %state, "dropping municipality list for an old selection");
                }
            }
            Err(e) => error!("Error fetching municipalities: {e}"),
        }
    });
}

pub fn refresh_stats(mut ui: UiState, selection: FilterSelection) {
    let ticket = ui.stats.write().begin_refresh();
    spawn(async move {
        match api::fetch_stats(&selection).await {
            Ok(stats) => {
                if !ui.stats.write().accept(ticket, stats) {
                    debug!(?selection, "dropping stats for an old selection");
                }
            }
            Err(e) => error!("Error fetching stats: {e}"),
        }
    });
}

/// Replace both overlay layers with instances bound to `selection`.
pub fn refresh_layers(mut ui: UiState, selection: &FilterSelection) {
    let boundary_id = VectorTileLayer::replace(
        &mut ui.boundary_layer.write(),
        LayerSpec::boundary(API_BASE, selection),
    );
    let company_id = VectorTileLayer::replace(
        &mut ui.company_layer.write(),
        LayerSpec::company(API_BASE, selection),
    );
    debug!(boundary_id, company_id, ?selection, "overlay layers rebuilt");
    request_tiles(ui);
}

/// Start fetches for visible tiles that neither layer holds yet.
pub fn request_tiles(ui: UiState) {
    let view = *ui.view.peek();
    request_layer_tiles(ui, ui.boundary_layer, view);
    request_layer_tiles(ui, ui.company_layer, view);
}

/// Evict stale tiles, then start fetches for the ones missing under `view`.
fn request_layer_tiles(ui: UiState, mut slot: Signal<Option<VectorTileLayer>>, view: MapView) {
    if slot.peek().is_none() {
        return;
    }

    let (id, tolerance, requests) = {
        let mut guard = slot.write();
        let Some(layer) = guard.as_mut() else {
            return;
        };
        let evicted = layer.prune(&view);
        if evicted > 0 {
            debug!(layer_id = layer.id(), evicted, cached = layer.tile_count(), "evicted off-screen tiles");
        }
        let missing = layer.missing_tiles(&view);
        (
            layer.id(),
            layer.spec().simplify_tolerance,
            layer.mark_loading(missing),
        )
    };

    for request in requests {
        spawn(load_tile(ui, slot, id, tolerance, request));
    }
}

async fn load_tile(
    ui: UiState,
    mut slot: Signal<Option<VectorTileLayer>>,
    layer_id: u64,
    tolerance: Option<f64>,
    request: TileRequest,
) {
    let features = match api::fetch_tile(&request.url).await {
        Ok(bytes) => match decode_tile(bytes, tolerance) {
            Ok(features) => Some(features),
            Err(e) => {
                debug!(tile = %request.coord.key(), "tile decode failed: {e}");
                None
            }
        },
        Err(e) => {
            debug!(tile = %request.coord.key(), "tile fetch failed: {e}");
            None
        }
    };

    if slot.peek().as_ref().map(VectorTileLayer::id) != Some(layer_id) {
        debug!(layer_id, tile = %request.coord.key(), "dropping tile of a discarded layer");
        return;
    }
    if let Some(layer) = slot.write().as_mut() {
        layer.complete(request.coord, features);
    }
    request_layer_tiles(ui, slot, *ui.view.peek());
}

/// A confirmed single click at container position `(sx, sy)`.
pub fn handle_map_click(mut ui: UiState, sx: f64, sy: f64) {
    let view = *ui.view.peek();
    let at = view.screen_to_world(sx, sy);
    let hit = ui
        .company_layer
        .peek()
        .as_ref()
        .and_then(|layer| hit_test_companies(layer, &view, sx, sy));

    let Some(lookup) = ui.popup.write().click(hit, at) else {
        return;
    };

    spawn(async move {
        match api::fetch_company(&lookup.cnpj).await {
            Ok(detail) => {
                if !ui.popup.write().resolve(lookup.ticket, detail) {
                    debug!(cnpj = %lookup.cnpj, "dropping company detail for an old click");
                    return;
                }
                let (dx, dy) = auto_pan_delta(&ui.view.peek(), at);
                if dx != 0.0 || dy != 0.0 {
                    animate_pan(ui, dx, dy);
                }
            }
            Err(e) => {
                error!("Error fetching company {}: {e}", lookup.cnpj);
                ui.popup.write().fail(lookup.ticket);
            }
        }
    });
}

/// Pan the view by `(dx, dy)` screen pixels over [`PAN_ANIMATION_MS`].
pub fn animate_pan(mut ui: UiState, dx: f64, dy: f64) {
    let ticket = ui.animation.write().issue();
    spawn(async move {
        let mut animation = PanAnimation::new(dx, dy, PAN_ANIMATION_MS);
        let mut elapsed = 0.0;
        while !animation.is_done(elapsed) {
            TimeoutFuture::new(ANIMATION_FRAME_MS).await;
            if !ui.animation.peek().is_current(ticket) {
                return;
            }
            elapsed += f64::from(ANIMATION_FRAME_MS);
            let (step_x, step_y) = animation.step(elapsed);
            ui.view.write().pan_by(step_x, step_y);
        }
    });
}

/// Stop a running animation; the user has taken over the view.
pub fn stop_animation(mut ui: UiState) {
    ui.animation.write().issue();
}
