use dioxus::prelude::*;
use laquila_shared::filter::FilterController;
use laquila_shared::layers::VectorTileLayer;
use laquila_shared::mercator::{MapView, WorldPoint};
use laquila_shared::popup::PopupController;
use laquila_shared::sequence::Sequencer;
use laquila_shared::stats::StatsPanel;

/// Initial map center (lon, lat) and zoom: the middle of Brazil.
pub const INITIAL_CENTER: (f64, f64) = (-55.428, -12.64);
pub const INITIAL_ZOOM: u8 = 5;

/// Everything the dashboard mutates, owned by the top-level page and handed
/// to children as props.
#[derive(Clone, Copy, PartialEq)]
pub struct UiState {
    pub filter: Signal<FilterController>,
    pub stats: Signal<StatsPanel>,
    pub boundary_layer: Signal<Option<VectorTileLayer>>,
    pub company_layer: Signal<Option<VectorTileLayer>>,
    pub popup: Signal<PopupController>,
    pub view: Signal<MapView>,
    /// Issuing a ticket stops the running view animation.
    pub animation: Signal<Sequencer>,
}

pub fn initial_view() -> MapView {
    let (lon, lat) = INITIAL_CENTER;
    // Size is unknown until the container is measured.
    MapView::new(WorldPoint::from_lon_lat(lon, lat), INITIAL_ZOOM, 0.0, 0.0)
}

pub fn use_ui_state() -> UiState {
    UiState {
        filter: use_signal(FilterController::new),
        stats: use_signal(StatsPanel::new),
        boundary_layer: use_signal(|| None),
        company_layer: use_signal(|| None),
        popup: use_signal(PopupController::new),
        view: use_signal(initial_view),
        animation: use_signal(Sequencer::new),
    }
}
