use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::AppState;
use crate::domain::{ProductId, VendorId};
use crate::engine::{RepriceOutcome, RepriceRequest};
use crate::error::AppError;
use crate::normalize::{normalize_offers, parse_integer, resolve_configs, NormalizeError, SourcedVendorConfig};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepriceBody {
    pub product_id: Value,
    #[serde(default)]
    pub offers: Vec<Value>,
    #[serde(default)]
    pub active_vendors: Vec<Value>,
    #[serde(default)]
    pub vendor_details: Vec<SourcedVendorConfig>,
    #[serde(default)]
    pub slow_cron: bool,
    pub context_url: Option<String>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepriceResponse {
    pub run_id: Uuid,
    #[serde(flatten)]
    pub outcome: RepriceOutcome,
}

pub async fn reprice(
    State(state): State<AppState>,
    payload: Result<Json<RepriceBody>, JsonRejection>,
) -> Result<Json<RepriceResponse>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request = build_request(&state, body)?;
    let outcome = state.repricer.reprice(&request);

    Ok(Json(RepriceResponse {
        run_id: Uuid::new_v4(),
        outcome,
    }))
}

fn build_request(state: &AppState, body: RepriceBody) -> Result<RepriceRequest, NormalizeError> {
    let product_id = parse_integer(&body.product_id)
        .map(ProductId)
        .ok_or_else(|| NormalizeError::InvalidField("productId".to_string(), body.product_id.to_string()))?;

    let active_vendors = body
        .active_vendors
        .iter()
        .map(|v| {
            parse_integer(v)
                .map(VendorId)
                .ok_or_else(|| NormalizeError::InvalidField("activeVendors".to_string(), v.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RepriceRequest {
        product_id,
        offers: normalize_offers(&body.offers),
        active_vendors,
        configs: resolve_configs(&body.vendor_details),
        slow_cron: body.slow_cron,
        context_url: body
            .context_url
            .unwrap_or_else(|| state.config.context_url(product_id)),
        evaluated_at: body.evaluated_at.unwrap_or_else(Utc::now),
    })
}
