//! URLs of the remote API the map talks to.

use url::{form_urlencoded, Url};

use crate::error::ApiError;
use crate::models::FilterSelection;

/// Host serving the statistics, municipality, company and tile endpoints.
pub const API_BASE: &str = "http://ns5004901.ip-51-222-153.net";

/// Encode `pairs` as a query string, keeping empty values (`municipio=`).
fn query(pairs: &[(&str, &str)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

pub fn stats_url(base: &str, selection: &FilterSelection) -> String {
    format!(
        "{base}/api/laquila-stats?{}",
        query(&[("uf", &selection.state), ("city", &selection.municipality)])
    )
}

pub fn municipalities_url(base: &str, state: &str) -> String {
    format!(
        "{base}/api/municipios?{}",
        query(&[("uf", state), ("useStandard", "true")])
    )
}

/// Company lookup URL with `cnpj` percent-encoded as a single path segment.
pub fn company_detail_url(base: &str, cnpj: &str) -> Result<String, ApiError> {
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: base.to_string(),
        reason,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(["api", "laquila", cnpj]);
    Ok(url.into())
}

/// Tile URL template for the municipal boundary layer. `{z}`, `{x}` and
/// `{y}` stay as placeholders.
pub fn boundary_tiles_template(base: &str, selection: &FilterSelection) -> String {
    format!(
        "{base}/api/municipios/tiles/{{z}}/{{x}}/{{y}}.pbf?{}",
        tile_query(selection)
    )
}

/// Tile URL template for the company point layer.
pub fn company_tiles_template(base: &str, selection: &FilterSelection) -> String {
    format!(
        "{base}/api/laquila/tiles/{{z}}/{{x}}/{{y}}.pbf?{}",
        tile_query(selection)
    )
}

fn tile_query(selection: &FilterSelection) -> String {
    query(&[
        ("municipio", &selection.municipality),
        ("uf", &selection.state),
    ])
}
