//! Web Mercator (EPSG:3857) projection and slippy-map tile math.
//!
//! World positions are normalized: `x` runs 0..1 west to east starting at
//! the antimeridian, `y` runs 0..1 north to south. At zoom `z` the world is
//! `TILE_SIZE * 2^z` pixels wide.

use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;

pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 19;

/// Latitude at which the Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (lon + 180.0) / 360.0;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
        Self { x, y }
    }

    pub fn to_lon_lat(self) -> (f64, f64) {
        let lon = self.x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * self.y)).sinh().atan().to_degrees();
        (lon, lat)
    }
}

/// Width of the whole world in pixels at `zoom`.
pub fn world_size_px(zoom: u8) -> f64 {
    TILE_SIZE * 2f64.powi(zoom as i32)
}

/// Number of tiles along one axis at `zoom`.
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// World position of a tile-local point given in `extent` units.
    pub fn to_world(&self, px: f64, py: f64, extent: f64) -> WorldPoint {
        let n = tiles_per_axis(self.z) as f64;
        WorldPoint {
            x: (self.x as f64 + px / extent) / n,
            y: (self.y as f64 + py / extent) / n,
        }
    }

    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A tile to draw, with its placement in screen pixels. `left` may put the
/// tile on a wrapped copy of the world while `coord` stays canonical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleTile {
    pub coord: TileCoord,
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

impl VisibleTile {
    /// Screen position of a tile-local point given in `extent` units.
    pub fn project(&self, px: f64, py: f64, extent: f64) -> (f64, f64) {
        (
            self.left + px / extent * self.size,
            self.top + py / extent * self.size,
        )
    }

    /// Unique per drawn copy, usable as a render key.
    pub fn key(&self) -> String {
        format!("{}@{}", self.coord.key(), self.left.round())
    }
}

/// The map viewport: center, integer zoom and size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: WorldPoint,
    pub zoom: u8,
    pub width: f64,
    pub height: f64,
}

impl MapView {
    pub fn new(center: WorldPoint, zoom: u8, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    fn scale(&self) -> f64 {
        world_size_px(self.zoom)
    }

    /// Screen position of a world point, choosing the wrapped copy of the
    /// world closest to the center.
    pub fn world_to_screen(&self, point: WorldPoint) -> (f64, f64) {
        let mut dx = point.x - self.center.x;
        dx -= dx.round();
        let dy = point.y - self.center.y;
        (
            dx * self.scale() + self.width / 2.0,
            dy * self.scale() + self.height / 2.0,
        )
    }

    /// World point under a container-relative screen position. `x` is not
    /// wrapped.
    pub fn screen_to_world(&self, sx: f64, sy: f64) -> WorldPoint {
        WorldPoint {
            x: self.center.x + (sx - self.width / 2.0) / self.scale(),
            y: self.center.y + (sy - self.height / 2.0) / self.scale(),
        }
    }

    /// Move the content by `(dx, dy)` screen pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let scale = self.scale();
        self.center = WorldPoint {
            x: (self.center.x - dx / scale).rem_euclid(1.0),
            y: (self.center.y - dy / scale).clamp(0.0, 1.0),
        };
    }

    /// Change zoom while keeping the world point under `(sx, sy)` fixed.
    /// Returns false when `zoom` is out of range or unchanged.
    pub fn zoom_at(&mut self, zoom: u8, sx: f64, sy: f64) -> bool {
        if zoom == self.zoom || !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            return false;
        }
        let anchor = self.screen_to_world(sx, sy);
        self.zoom = zoom;
        let scale = self.scale();
        self.center = WorldPoint {
            x: (anchor.x - (sx - self.width / 2.0) / scale).rem_euclid(1.0),
            y: (anchor.y - (sy - self.height / 2.0) / scale).clamp(0.0, 1.0),
        };
        true
    }

    pub fn zoom_in_at(&mut self, sx: f64, sy: f64) -> bool {
        self.zoom < MAX_ZOOM && self.zoom_at(self.zoom + 1, sx, sy)
    }

    pub fn zoom_out_at(&mut self, sx: f64, sy: f64) -> bool {
        self.zoom > MIN_ZOOM && self.zoom_at(self.zoom - 1, sx, sy)
    }

    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if (self.width - width).abs() < 0.5 && (self.height - height).abs() < 0.5 {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// Tiles of pyramid level `tile_zoom` covering the viewport. When
    /// `tile_zoom` differs from the view zoom the tiles are scaled.
    pub fn visible_tiles(&self, tile_zoom: u8) -> Vec<VisibleTile> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Vec::new();
        }
        let n = tiles_per_axis(tile_zoom);
        let size = self.scale() / n as f64;
        let left_px = self.center.x * self.scale() - self.width / 2.0;
        let top_px = self.center.y * self.scale() - self.height / 2.0;

        let first_col = (left_px / size).floor() as i64;
        let last_col = ((left_px + self.width) / size).floor() as i64;
        let first_row = ((top_px / size).floor() as i64).max(0);
        let last_row = (((top_px + self.height) / size).floor() as i64).min(n as i64 - 1);

        let mut tiles = Vec::new();
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                tiles.push(VisibleTile {
                    coord: TileCoord::new(tile_zoom, col.rem_euclid(n as i64) as u32, row as u32),
                    left: col as f64 * size - left_px,
                    top: row as f64 * size - top_px,
                    size,
                });
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn test_origin_projects_to_world_center() {
        let p = WorldPoint::from_lon_lat(0.0, 0.0);
        assert_close(p.x, 0.5);
        assert_close(p.y, 0.5);
    }

    #[test]
    fn test_lon_lat_round_trip() {
        let p = WorldPoint::from_lon_lat(-55.428, -12.64);
        let (lon, lat) = p.to_lon_lat();
        assert_close(lon, -55.428);
        assert_close(lat, -12.64);
    }

    #[test]
    fn test_southern_hemisphere_is_below_equator() {
        let p = WorldPoint::from_lon_lat(-46.6, -23.5);
        assert!(p.y > 0.5);
        assert!(p.x < 0.5);
    }

    #[test]
    fn test_latitude_is_clamped() {
        let p = WorldPoint::from_lon_lat(0.0, 89.9);
        assert_close(p.y, 0.0);
    }

    #[test]
    fn test_tile_to_world_corners() {
        let tile = TileCoord::new(1, 1, 0);
        let nw = tile.to_world(0.0, 0.0, 4096.0);
        let se = tile.to_world(4096.0, 4096.0, 4096.0);
        assert_close(nw.x, 0.5);
        assert_close(nw.y, 0.0);
        assert_close(se.x, 1.0);
        assert_close(se.y, 0.5);
    }

    #[test]
    fn test_world_screen_round_trip() {
        let view = MapView::new(WorldPoint::new(0.3, 0.6), 5, 800.0, 600.0);
        let (sx, sy) = view.world_to_screen(WorldPoint::new(0.31, 0.59));
        let back = view.screen_to_world(sx, sy);
        assert_close(back.x, 0.31);
        assert_close(back.y, 0.59);
    }

    #[test]
    fn test_center_maps_to_viewport_middle() {
        let view = MapView::new(WorldPoint::new(0.3, 0.6), 7, 800.0, 600.0);
        let (sx, sy) = view.world_to_screen(view.center);
        assert_close(sx, 400.0);
        assert_close(sy, 300.0);
    }

    #[test]
    fn test_world_to_screen_picks_nearest_wrapped_copy() {
        let view = MapView::new(WorldPoint::new(0.99, 0.5), 2, 1024.0, 512.0);
        let (sx, _) = view.world_to_screen(WorldPoint::new(0.01, 0.5));
        // 0.02 of a 1024px world to the right of center
        assert_close(sx, 512.0 + 0.02 * 1024.0);
    }

    #[test]
    fn test_pan_moves_content_with_pointer() {
        let mut view = MapView::new(WorldPoint::new(0.5, 0.5), 2, 400.0, 400.0);
        let target = WorldPoint::new(0.45, 0.55);
        let (before_x, before_y) = view.world_to_screen(target);
        view.pan_by(30.0, -20.0);
        let (after_x, after_y) = view.world_to_screen(target);
        assert_close(after_x - before_x, 30.0);
        assert_close(after_y - before_y, -20.0);
    }

    #[test]
    fn test_pan_wraps_horizontally_and_clamps_vertically() {
        let mut view = MapView::new(WorldPoint::new(0.001, 0.001), 0, 256.0, 256.0);
        view.pan_by(10.0, 10.0);
        assert!(view.center.x > 0.9);
        assert_close(view.center.y, 0.0);
    }

    #[test]
    fn test_zoom_at_keeps_cursor_point_fixed() {
        let mut view = MapView::new(WorldPoint::new(0.33, 0.58), 5, 800.0, 600.0);
        let under_cursor = view.screen_to_world(100.0, 450.0);
        assert!(view.zoom_at(6, 100.0, 450.0));
        let after = view.screen_to_world(100.0, 450.0);
        assert_close(after.x, under_cursor.x);
        assert_close(after.y, under_cursor.y);
        assert_eq!(view.zoom, 6);
    }

    #[test]
    fn test_zoom_limits() {
        let mut view = MapView::new(WorldPoint::new(0.5, 0.5), MAX_ZOOM, 100.0, 100.0);
        assert!(!view.zoom_in_at(50.0, 50.0));
        assert_eq!(view.zoom, MAX_ZOOM);

        let mut view = MapView::new(WorldPoint::new(0.5, 0.5), MIN_ZOOM, 100.0, 100.0);
        assert!(!view.zoom_out_at(50.0, 50.0));
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_resize_reports_change() {
        let mut view = MapView::new(WorldPoint::new(0.5, 0.5), 3, 100.0, 100.0);
        assert!(!view.resize(100.2, 99.9));
        assert!(view.resize(640.0, 480.0));
        assert_eq!(view.width, 640.0);
    }

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let view = MapView::new(WorldPoint::new(0.5, 0.5), 2, 512.0, 512.0);
        let tiles = view.visible_tiles(2);
        // Centered on a tile corner the viewport spans columns and rows 1..=3;
        // the last ones only touch the far border.
        assert!(tiles.iter().any(|t| t.coord == TileCoord::new(2, 1, 1)));
        assert!(tiles.iter().any(|t| t.coord == TileCoord::new(2, 2, 2)));
        for t in &tiles {
            assert_close(t.size, 256.0);
            assert!(t.left > -256.0 && t.left <= 512.0);
        }
    }

    #[test]
    fn test_visible_tiles_wrap_across_antimeridian() {
        let view = MapView::new(WorldPoint::new(0.0, 0.5), 1, 256.0, 256.0);
        let tiles = view.visible_tiles(1);
        let west = tiles.iter().find(|t| t.left < 0.0).unwrap();
        assert_eq!(west.coord.x, 1);
        let east = tiles.iter().find(|t| t.left >= 0.0).unwrap();
        assert_eq!(east.coord.x, 0);
    }

    #[test]
    fn test_visible_tiles_skip_rows_outside_world() {
        let view = MapView::new(WorldPoint::new(0.5, 0.0), 0, 256.0, 1024.0);
        let tiles = view.visible_tiles(0);
        assert!(tiles.iter().all(|t| t.coord.y == 0));
    }

    #[test]
    fn test_overzoomed_tiles_are_scaled_up() {
        let view = MapView::new(WorldPoint::new(0.5, 0.5), 16, 300.0, 300.0);
        let tiles = view.visible_tiles(14);
        assert!(!tiles.is_empty());
        for t in &tiles {
            assert_close(t.size, 1024.0);
            assert_eq!(t.coord.z, 14);
        }
    }

    #[test]
    fn test_empty_viewport_has_no_tiles() {
        let view = MapView::new(WorldPoint::new(0.5, 0.5), 4, 0.0, 0.0);
        assert!(view.visible_tiles(4).is_empty());
    }

    #[test]
    fn test_visible_tile_project() {
        let tile = VisibleTile {
            coord: TileCoord::new(3, 1, 1),
            left: 10.0,
            top: 20.0,
            size: 256.0,
        };
        let (sx, sy) = tile.project(2048.0, 4096.0, 4096.0);
        assert_close(sx, 138.0);
        assert_close(sy, 276.0);
    }
}
