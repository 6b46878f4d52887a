use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use laquila_shared::gesture::{
    midpoint, point_distance, Pinch, WheelGate, ZoomStep, TOUCH_TAP_THRESHOLD, WHEEL_SETTLE_MS,
};
use laquila_shared::layers::{
    company_style, LayerKind, VectorTileLayer, BOUNDARY_STROKE, BOUNDARY_STROKE_WIDTH,
};
use laquila_shared::mercator::{MapView as Viewport, TileCoord, VisibleTile};
use laquila_shared::sequence::Sequencer;
use laquila_shared::tiles::{Ring, TileFeature, TileGeometry, TILE_EXTENT};

use crate::components::popup::Popup;
use crate::controller;
use crate::coords::{self, MAP_CONTAINER_ID};
use crate::state::UiState;

/// Pointer movement in pixels below which a press is a click, not a drag.
const DRAG_THRESHOLD: f64 = 3.0;

/// How long a click waits for a possible second click before it counts.
const SINGLE_CLICK_DELAY_MS: u32 = 250;

const OSM_TILE_URL: &str = "https://tile.openstreetmap.org";
const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";

fn osm_tile_url(coord: TileCoord) -> String {
    format!("{OSM_TILE_URL}/{}/{}/{}.png", coord.z, coord.x, coord.y)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    start: (f64, f64),
    last: (f64, f64),
    moved: bool,
}

/// What the fingers currently on the map are doing.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TouchGesture {
    /// One finger; becomes a pan once it moves past the tap threshold.
    Single(Drag),
    /// Two fingers, zooming around their midpoint.
    Pinch(Pinch),
    /// A pinch ended with fingers still down; wait until all are lifted.
    Finished,
}

fn touch_points(evt: &Event<TouchData>) -> Vec<(f64, f64)> {
    evt.data()
        .touches()
        .iter()
        .map(|t| {
            let c = t.client_coordinates();
            (c.x, c.y)
        })
        .collect()
}

fn apply_zoom_step(view: &mut Viewport, step: ZoomStep, sx: f64, sy: f64) {
    match step {
        ZoomStep::In => view.zoom_in_at(sx, sy),
        ZoomStep::Out => view.zoom_out_at(sx, sy),
    };
}

/// Treat a press at container position `(sx, sy)` as a click once no second
/// press follows within [`SINGLE_CLICK_DELAY_MS`].
fn schedule_click(ui: UiState, mut clicks: Signal<Sequencer>, sx: f64, sy: f64) {
    let ticket = clicks.write().issue();
    spawn(async move {
        TimeoutFuture::new(SINGLE_CLICK_DELAY_MS).await;
        if clicks.peek().is_current(ticket) {
            controller::handle_map_click(ui, sx, sy);
        }
    });
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

fn ring_path(svg: &mut String, ring: &Ring, close: bool) {
    for (i, (x, y)) in ring.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        svg.push_str(&format!("{cmd}{x} {y}"));
    }
    if close {
        svg.push('Z');
    }
}

fn build_boundary_tile(svg: &mut String, tile: &VisibleTile, features: &[TileFeature]) {
    let mut d = String::new();
    for feature in features {
        match &feature.geometry {
            TileGeometry::Polygons(rings) => rings.iter().for_each(|r| ring_path(&mut d, r, true)),
            TileGeometry::Lines(lines) => lines.iter().for_each(|l| ring_path(&mut d, l, false)),
            TileGeometry::Points(_) => {}
        }
    }
    if d.is_empty() {
        return;
    }
    svg.push_str(&format!(
        r#"<svg x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" viewBox="0 0 {TILE_EXTENT} {TILE_EXTENT}" overflow="hidden"><path d="{d}" fill="none" stroke="{BOUNDARY_STROKE}" stroke-width="{BOUNDARY_STROKE_WIDTH}" stroke-linejoin="round" vector-effect="non-scaling-stroke"/></svg>"#,
        tile.left, tile.top, tile.size, tile.size
    ));
}

fn build_company_tile(svg: &mut String, tile: &VisibleTile, features: &[TileFeature]) {
    for feature in features {
        let TileGeometry::Points(points) = &feature.geometry else {
            continue;
        };
        let style = company_style(feature.property("tipo").unwrap_or_default());
        for &(px, py) in points {
            // Buffer points are drawn by the neighbouring tile.
            if !(0.0..TILE_EXTENT).contains(&px) || !(0.0..TILE_EXTENT).contains(&py) {
                continue;
            }
            let (x, y) = tile.project(px, py, TILE_EXTENT);
            svg.push_str(&format!(
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="{}" fill="{}"/>"#,
                style.radius, style.fill
            ));
        }
    }
}

/// Build one overlay layer as an SVG string in container pixels.
fn build_layer_svg(layer: &VectorTileLayer, view: &Viewport) -> String {
    let mut content = String::with_capacity(8192);
    for (tile, features) in layer.visible_features(view) {
        match layer.spec().kind {
            LayerKind::Boundary => build_boundary_tile(&mut content, &tile, features),
            LayerKind::Company => build_company_tile(&mut content, &tile, features),
        }
    }
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" style="position:absolute;top:0;left:0;pointer-events:none;">{content}</svg>"#,
        w = view.width,
        h = view.height,
    )
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Measure the container and adopt its size.
fn sync_size(mut ui: UiState) {
    let Some(rect) = coords::container_rect() else {
        return;
    };
    if ui.view.peek().width == rect.width() && ui.view.peek().height == rect.height() {
        return;
    }
    ui.view.write().resize(rect.width(), rect.height());
}

#[component]
pub fn MapView(ui: UiState) -> Element {
    let mut ui = ui;
    let mut drag = use_signal(|| None::<Drag>);
    let mut touch = use_signal(|| None::<TouchGesture>);
    let mut clicks = use_signal(Sequencer::new);
    let mut wheel = use_signal(WheelGate::default);
    let mut wheel_quiet = use_signal(Sequencer::new);

    // New tiles come into view whenever the viewport moves.
    use_effect(move || {
        let _ = ui.view.read();
        controller::request_tiles(ui);
    });

    let view = *ui.view.read();

    let boundary_svg = use_memo(move || {
        let view = ui.view.read();
        ui.boundary_layer
            .read()
            .as_ref()
            .map(|layer| build_layer_svg(layer, &view))
            .unwrap_or_default()
    });
    let company_svg = use_memo(move || {
        let view = ui.view.read();
        ui.company_layer
            .read()
            .as_ref()
            .map(|layer| build_layer_svg(layer, &view))
            .unwrap_or_default()
    });

    let base_tiles = view.visible_tiles(view.zoom);
    let panning = drag.read().is_some_and(|d| d.moved)
        || matches!(*touch.read(), Some(TouchGesture::Single(d)) if d.moved);
    let container_class = if panning {
        "map-container dragging"
    } else {
        "map-container"
    };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onmounted: move |_| sync_size(ui),
            onresize: move |_| sync_size(ui),

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                let client = evt.data().client_coordinates();
                let Some((sx, sy)) = coords::client_to_map(client.x, client.y) else { return };
                let delta_y = coords::wheel_delta_y(evt.data().delta());
                if let Some(step) = wheel.write().push(delta_y) {
                    controller::stop_animation(ui);
                    apply_zoom_step(&mut ui.view.write(), step, sx, sy);
                }
                let ticket = wheel_quiet.write().issue();
                spawn(async move {
                    TimeoutFuture::new(WHEEL_SETTLE_MS).await;
                    if wheel_quiet.peek().is_current(ticket) {
                        wheel.write().settle();
                    }
                });
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                controller::stop_animation(ui);
                let client = evt.client_coordinates();
                drag.set(Some(Drag {
                    start: (client.x, client.y),
                    last: (client.x, client.y),
                    moved: false,
                }));
            },

            onmousemove: move |evt: Event<MouseData>| {
                let Some(mut state) = *drag.peek() else { return };
                let client = evt.client_coordinates();
                let (dx, dy) = (client.x - state.start.0, client.y - state.start.1);
                if !state.moved && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                    state.moved = true;
                }
                if state.moved {
                    ui.view.write().pan_by(client.x - state.last.0, client.y - state.last.1);
                    state.last = (client.x, client.y);
                }
                drag.set(Some(state));
            },

            onmouseup: move |evt: Event<MouseData>| {
                let Some(state) = *drag.peek() else { return };
                drag.set(None);
                if state.moved {
                    return;
                }
                let client = evt.client_coordinates();
                let Some((sx, sy)) = coords::client_to_map(client.x, client.y) else { return };
                schedule_click(ui, clicks, sx, sy);
            },

            onmouseleave: move |_| {
                drag.set(None);
            },

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                clicks.write().issue();
                controller::stop_animation(ui);
                let client = evt.client_coordinates();
                if let Some((sx, sy)) = coords::client_to_map(client.x, client.y) {
                    ui.view.write().zoom_in_at(sx, sy);
                }
            },

            ontouchstart: move |evt: Event<TouchData>| {
                evt.prevent_default();
                controller::stop_animation(ui);
                let points = touch_points(&evt);
                match points.as_slice() {
                    [p] => touch.set(Some(TouchGesture::Single(Drag { start: *p, last: *p, moved: false }))),
                    [p0, p1, ..] => {
                        // A second finger turns any tap or pan into a pinch.
                        clicks.write().issue();
                        touch.set(Some(TouchGesture::Pinch(Pinch::new(point_distance(*p0, *p1)))));
                    }
                    [] => {}
                }
            },

            ontouchmove: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let points = touch_points(&evt);
                let Some(gesture) = *touch.peek() else { return };
                match (gesture, points.as_slice()) {
                    (TouchGesture::Pinch(mut pinch), [p0, p1, ..]) => {
                        if let Some(step) = pinch.update(point_distance(*p0, *p1)) {
                            let mid = midpoint(*p0, *p1);
                            if let Some((sx, sy)) = coords::client_to_map(mid.0, mid.1) {
                                apply_zoom_step(&mut ui.view.write(), step, sx, sy);
                            }
                        }
                        touch.set(Some(TouchGesture::Pinch(pinch)));
                    }
                    (TouchGesture::Single(mut state), [p]) => {
                        if !state.moved && point_distance(state.start, *p) > TOUCH_TAP_THRESHOLD {
                            state.moved = true;
                        }
                        if state.moved {
                            ui.view.write().pan_by(p.0 - state.last.0, p.1 - state.last.1);
                            state.last = *p;
                        }
                        touch.set(Some(TouchGesture::Single(state)));
                    }
                    _ => {}
                }
            },

            ontouchend: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let remaining = evt.data().touches().len();
                let Some(gesture) = *touch.peek() else { return };
                match gesture {
                    TouchGesture::Single(state) if remaining == 0 => {
                        touch.set(None);
                        if !state.moved {
                            if let Some((sx, sy)) = coords::client_to_map(state.start.0, state.start.1) {
                                schedule_click(ui, clicks, sx, sy);
                            }
                        }
                    }
                    TouchGesture::Pinch(_) | TouchGesture::Finished if remaining == 0 => touch.set(None),
                    TouchGesture::Pinch(_) => touch.set(Some(TouchGesture::Finished)),
                    _ => {}
                }
            },

            ontouchcancel: move |_evt: Event<TouchData>| {
                touch.set(None);
            },

            div { class: "base-layer",
                for tile in base_tiles {
                    img {
                        key: "{tile.key()}",
                        src: "{osm_tile_url(tile.coord)}",
                        draggable: "false",
                        alt: "",
                        style: "left:{tile.left}px;top:{tile.top}px;width:{tile.size}px;height:{tile.size}px;",
                    }
                }
            }

            div { class: "overlay-layer", dangerous_inner_html: "{boundary_svg}" }
            div { class: "overlay-layer", dangerous_inner_html: "{company_svg}" }

            Popup { ui }

            div {
                class: "zoom-controls",
                onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                onmouseup: move |evt: Event<MouseData>| evt.stop_propagation(),
                ondoubleclick: move |evt: Event<MouseData>| evt.stop_propagation(),
                ontouchstart: move |evt: Event<TouchData>| evt.stop_propagation(),
                ontouchend: move |evt: Event<TouchData>| evt.stop_propagation(),
                button {
                    title: "Zoom in",
                    onclick: move |_| {
                        controller::stop_animation(ui);
                        let (w, h) = (ui.view.peek().width, ui.view.peek().height);
                        ui.view.write().zoom_in_at(w / 2.0, h / 2.0);
                    },
                    "+"
                }
                button {
                    title: "Zoom out",
                    onclick: move |_| {
                        controller::stop_animation(ui);
                        let (w, h) = (ui.view.peek().width, ui.view.peek().height);
                        ui.view.write().zoom_out_at(w / 2.0, h / 2.0);
                    },
                    "−"
                }
            }

            div { class: "attribution",
                a { href: "https://www.openstreetmap.org/copyright", target: "_blank", "{OSM_ATTRIBUTION}" }
            }
        }
    }
}
