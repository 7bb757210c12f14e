// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook routes for Shopify and HubSpot events.
//!
//! Both platforms sign the raw request body, so handlers take `Bytes` and
//! verify before parsing anything.

use crate::error::AppError;
use crate::services::connectors::hubspot::WebhookEvent;
use crate::services::webhook_signature::{
    verify_hubspot, verify_shopify, HUBSPOT_SIGNATURE_HEADER, SHOPIFY_HMAC_HEADER,
};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Webhook routes (public; authenticated by signature).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/webhooks/shopify/{funnel_id}/{resource}/{action}",
            post(handle_shopify),
        )
        .route("/api/webhooks/hubspot/{funnel_id}", post(handle_hubspot))
}

#[derive(Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

const ACK: WebhookAck = WebhookAck { status: "ok" };

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Handle a Shopify topic delivery (e.g. `orders/create`).
async fn handle_shopify(
    State(state): State<Arc<AppState>>,
    Path((funnel_id, resource, action)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = header(&headers, SHOPIFY_HMAC_HEADER);
    if !verify_shopify(&state.config.shopify_webhook_secret, &body, signature) {
        tracing::warn!(
            funnel_id = %funnel_id,
            "Security Alert: Shopify webhook signature mismatch"
        );
        return Err(AppError::Unauthorized);
    }

    let topic = format!("{}/{}", resource, action);
    let outcome = state
        .integrations
        .handle_shopify_webhook(&funnel_id, &topic, &body)
        .await?;

    tracing::debug!(funnel_id = %funnel_id, topic = %topic, ?outcome, "Shopify webhook handled");
    Ok(Json(ACK))
}

/// Handle a batch of HubSpot events.
async fn handle_hubspot(
    State(state): State<Arc<AppState>>,
    Path(funnel_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = header(&headers, HUBSPOT_SIGNATURE_HEADER);
    if !verify_hubspot(&state.config.hubspot_client_secret, &body, signature) {
        tracing::warn!(
            funnel_id = %funnel_id,
            "Security Alert: HubSpot webhook signature mismatch"
        );
        return Err(AppError::Unauthorized);
    }

    let events: Vec<WebhookEvent> = match serde_json::from_slice(&body) {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(funnel_id = %funnel_id, error = %e, "Unparseable HubSpot webhook body");
            return Ok(Json(ACK));
        }
    };

    // The batch is acknowledged even when processing fails; HubSpot would
    // otherwise redeliver every event in it.
    match state
        .integrations
        .handle_hubspot_events(&funnel_id, &events)
        .await
    {
        Ok(outcomes) => {
            tracing::debug!(funnel_id = %funnel_id, events = outcomes.len(), "HubSpot webhook handled");
        }
        Err(e) => {
            tracing::error!(funnel_id = %funnel_id, error = %e, "HubSpot webhook processing failed");
        }
    }

    Ok(Json(ACK))
}
