//! Overlay layer definitions and the per-instance tile table.

use std::collections::{HashMap, HashSet};

use crate::endpoints::{boundary_tiles_template, company_tiles_template};
use crate::mercator::{MapView, TileCoord, VisibleTile, MAX_ZOOM, MIN_ZOOM};
use crate::models::{CompanyRef, FilterSelection};
use crate::tiles::{TileFeature, TileGeometry, TILE_EXTENT};

pub const BOUNDARY_STROKE: &str = "rgba(0, 128, 128, 0.8)";
pub const BOUNDARY_STROKE_WIDTH: f64 = 3.5;

pub const COMPANY_RADIUS: f64 = 5.0;
pub const CLIENT_FILL: &str = "orange";
pub const MARKET_FILL: &str = "blue";

pub const COMPANY_MIN_ZOOM: u8 = 5;
pub const COMPANY_MAX_ZOOM: u8 = 14;
pub const COMPANY_SIMPLIFY_TOLERANCE: f64 = 50.0;

/// Extra pixels around a company point that still count as a hit.
pub const HIT_SLOP: f64 = 1.0;

/// Tile requests allowed in flight per layer instance.
pub const MAX_TILES_LOADING: usize = 32;

/// Tiles a layer instance keeps before evicting off-screen ones.
pub const MAX_CACHED_TILES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Boundary,
    Company,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleStyle {
    pub radius: f64,
    pub fill: &'static str,
}

/// Style of a company point by its `tipo` property.
pub fn company_style(tipo: &str) -> CircleStyle {
    let fill = if tipo == crate::models::CLIENT_CATEGORY {
        CLIENT_FILL
    } else {
        MARKET_FILL
    };
    CircleStyle {
        radius: COMPANY_RADIUS,
        fill,
    }
}

/// Everything needed to build one overlay layer instance.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub kind: LayerKind,
    pub url_template: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub simplify_tolerance: Option<f64>,
}

impl LayerSpec {
    pub fn boundary(base: &str, selection: &FilterSelection) -> Self {
        Self {
            kind: LayerKind::Boundary,
            url_template: boundary_tiles_template(base, selection),
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            simplify_tolerance: None,
        }
    }

    pub fn company(base: &str, selection: &FilterSelection) -> Self {
        Self {
            kind: LayerKind::Company,
            url_template: company_tiles_template(base, selection),
            min_zoom: COMPANY_MIN_ZOOM,
            max_zoom: COMPANY_MAX_ZOOM,
            simplify_tolerance: Some(COMPANY_SIMPLIFY_TOLERANCE),
        }
    }

    pub fn tile_url(&self, coord: TileCoord) -> String {
        self.url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    /// Pyramid level used when the view is at `view_zoom`.
    pub fn tile_zoom(&self, view_zoom: u8) -> u8 {
        view_zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileState {
    Loading,
    Ready(Vec<TileFeature>),
    Failed,
}

/// A tile fetch the caller must perform for a layer instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub coord: TileCoord,
    pub url: String,
}

#[derive(Debug, Clone)]
struct CachedTile {
    state: TileState,
    /// Value of the layer clock when the tile was last in view.
    last_seen: u64,
}

/// One overlay layer instance. A filter change replaces the instance, so
/// tiles fetched for an older id must be dropped by the caller.
#[derive(Debug, Clone)]
pub struct VectorTileLayer {
    id: u64,
    spec: LayerSpec,
    tiles: HashMap<TileCoord, CachedTile>,
    in_flight: usize,
    clock: u64,
}

impl VectorTileLayer {
    pub fn new(id: u64, spec: LayerSpec) -> Self {
        Self {
            id,
            spec,
            tiles: HashMap::new(),
            in_flight: 0,
            clock: 0,
        }
    }

    /// Discard the layer held in `slot` and install a fresh one built from
    /// `spec`. Returns the new instance id.
    pub fn replace(slot: &mut Option<Self>, spec: LayerSpec) -> u64 {
        let id = slot.as_ref().map_or(1, |layer| layer.id + 1);
        *slot = Some(Self::new(id, spec));
        id
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn spec(&self) -> &LayerSpec {
        &self.spec
    }

    pub fn tile_state(&self, coord: &TileCoord) -> Option<&TileState> {
        self.tiles.get(coord).map(|tile| &tile.state)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Visible tiles with no entry yet, capped by the free request slots.
    pub fn missing_tiles(&self, view: &MapView) -> Vec<TileCoord> {
        let capacity = MAX_TILES_LOADING.saturating_sub(self.in_flight);
        let tile_zoom = self.spec.tile_zoom(view.zoom);
        let mut seen = HashSet::new();
        view.visible_tiles(tile_zoom)
            .into_iter()
            .map(|tile| tile.coord)
            .filter(|coord| !self.tiles.contains_key(coord) && seen.insert(*coord))
            .take(capacity)
            .collect()
    }

    /// Record `coords` as loading and return the fetches to start.
    pub fn mark_loading(&mut self, coords: Vec<TileCoord>) -> Vec<TileRequest> {
        let mut requests = Vec::with_capacity(coords.len());
        for coord in coords {
            if self.tiles.contains_key(&coord) {
                continue;
            }
            self.tiles.insert(
                coord,
                CachedTile {
                    state: TileState::Loading,
                    last_seen: self.clock,
                },
            );
            self.in_flight += 1;
            requests.push(TileRequest {
                coord,
                url: self.spec.tile_url(coord),
            });
        }
        requests
    }

    /// Store the outcome of a tile fetch. `None` marks the tile failed; it
    /// is not requested again while it stays cached.
    pub fn complete(&mut self, coord: TileCoord, features: Option<Vec<TileFeature>>) {
        let Some(tile) = self.tiles.get_mut(&coord) else {
            return;
        };
        if !matches!(tile.state, TileState::Loading) {
            return;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        tile.state = match features {
            Some(features) => TileState::Ready(features),
            None => TileState::Failed,
        };
    }

    /// Loaded tiles in view with their screen placement, in draw order.
    pub fn visible_features(&self, view: &MapView) -> Vec<(VisibleTile, &[TileFeature])> {
        let tile_zoom = self.spec.tile_zoom(view.zoom);
        view.visible_tiles(tile_zoom)
            .into_iter()
            .filter_map(|tile| match self.tiles.get(&tile.coord).map(|t| &t.state) {
                Some(TileState::Ready(features)) => Some((tile, features.as_slice())),
                _ => None,
            })
            .collect()
    }

    /// Mark the tiles under `view` as seen, then evict ready or failed tiles
    /// outside it, least recently seen first, until at most
    /// [`MAX_CACHED_TILES`] remain. Loading tiles are never evicted.
    /// Returns the number of evicted tiles.
    pub fn prune(&mut self, view: &MapView) -> usize {
        self.prune_to(view, MAX_CACHED_TILES)
    }

    fn prune_to(&mut self, view: &MapView, cap: usize) -> usize {
        self.clock += 1;
        let now = self.clock;
        let tile_zoom = self.spec.tile_zoom(view.zoom);
        let mut visible = HashSet::new();
        for tile in view.visible_tiles(tile_zoom) {
            if let Some(cached) = self.tiles.get_mut(&tile.coord) {
                cached.last_seen = now;
            }
            visible.insert(tile.coord);
        }

        let excess = self.tiles.len().saturating_sub(cap);
        if excess == 0 {
            return 0;
        }
        let mut evictable: Vec<(u64, TileCoord)> = self
            .tiles
            .iter()
            .filter(|(coord, tile)| {
                !matches!(tile.state, TileState::Loading) && !visible.contains(*coord)
            })
            .map(|(coord, tile)| (tile.last_seen, *coord))
            .collect();
        evictable.sort_unstable();
        evictable.truncate(excess);
        for (_, coord) in &evictable {
            self.tiles.remove(coord);
        }
        evictable.len()
    }
}

/// Company under the screen position `(sx, sy)`, preferring the point drawn
/// last. Points in a tile's buffer zone belong to the neighbouring tile.
pub fn hit_test_companies(
    layer: &VectorTileLayer,
    view: &MapView,
    sx: f64,
    sy: f64,
) -> Option<CompanyRef> {
    let reach = COMPANY_RADIUS + HIT_SLOP;
    for (tile, features) in layer.visible_features(view).into_iter().rev() {
        for feature in features.iter().rev() {
            let TileGeometry::Points(points) = &feature.geometry else {
                continue;
            };
            let hit = points.iter().rev().any(|&(px, py)| {
                if !(0.0..TILE_EXTENT).contains(&px) || !(0.0..TILE_EXTENT).contains(&py) {
                    return false;
                }
                let (x, y) = tile.project(px, py, TILE_EXTENT);
                (x - sx).hypot(y - sy) <= reach
            });
            if hit {
                if let Some(company) = feature.company() {
                    return Some(company);
                }
            }
        }
    }
    None
}
