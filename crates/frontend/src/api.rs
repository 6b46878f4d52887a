use laquila_shared::endpoints::{self, API_BASE};
use laquila_shared::error::ApiError;
use laquila_shared::models::{
    AggregateStats, CompanyDetail, FilterSelection, MunicipalitiesResponse, StatsResponse,
};
use serde::de::DeserializeOwned;

async fn get(url: &str) -> Result<reqwest::Response, ApiError> {
    let resp = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(|e| ApiError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

fn parse_json<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, ApiError> {
    let body = get(url).await?.text().await.map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    parse_json(url, &body)
}

pub async fn fetch_stats(selection: &FilterSelection) -> Result<AggregateStats, ApiError> {
    let resp: StatsResponse = get_json(&endpoints::stats_url(API_BASE, selection)).await?;
    Ok(resp.into())
}

pub async fn fetch_municipalities(state: &str) -> Result<Vec<String>, ApiError> {
    let resp: MunicipalitiesResponse =
        get_json(&endpoints::municipalities_url(API_BASE, state)).await?;
    Ok(resp.municipios)
}

pub async fn fetch_company(cnpj: &str) -> Result<CompanyDetail, ApiError> {
    get_json(&endpoints::company_detail_url(API_BASE, cnpj)?).await
}

/// Raw body of one vector tile.
pub async fn fetch_tile(url: &str) -> Result<Vec<u8>, ApiError> {
    let bytes = get(url).await?.bytes().await.map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(bytes.to_vec())
}
