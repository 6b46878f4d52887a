use dioxus::html::geometry::WheelDelta;

pub const MAP_CONTAINER_ID: &str = "laquila-map-container";

/// Convert client (viewport) coordinates to container-relative pixel coordinates.
pub fn client_to_container(
    client_x: f64,
    client_y: f64,
    rect_left: f64,
    rect_top: f64,
) -> (f64, f64) {
    (client_x - rect_left, client_y - rect_top)
}

/// Bounding client rect of the map container element.
pub fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

/// Container-relative position of a client point, if the map is mounted.
pub fn client_to_map(client_x: f64, client_y: f64) -> Option<(f64, f64)> {
    let rect = container_rect()?;
    Some(client_to_container(client_x, client_y, rect.left(), rect.top()))
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
pub fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}
