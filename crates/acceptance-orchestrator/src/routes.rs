use std::collections::BTreeMap;

use actix_web::{web, HttpRequest, HttpResponse};
use acceptance::{Amount, FiatConfirmationEvent, LiquidityGateway, PaymentIntent, ProcessOutcome};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub merchant_id: String,
    pub amount: Amount,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub id: Option<String>,
}

/// Body returned to the PSP for every accepted confirmation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookAck<'a> {
    status: &'static str,
    event_id: &'a str,
    #[serde(flatten)]
    outcome: ProcessOutcome,
}

/// POST /api/v1/payment_intents
pub async fn create_intent<G: LiquidityGateway + 'static>(
    state: web::Data<AppState<G>>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let request: CreateIntentRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid payment intent body: {e}")))?;

    if request.merchant_id.trim().is_empty() {
        return Err(ApiError::BadRequest("merchantId is required".to_string()));
    }
    request
        .amount
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let intent =
        PaymentIntent::new(request.merchant_id, request.amount).with_metadata(request.metadata);
    state.ledger().save_payment_intent(intent.clone());
    metrics::INTENTS_CREATED.inc();

    tracing::info!(
        intent_id = %intent.id,
        merchant_id = %intent.merchant_id,
        amount = %intent.amount,
        "payment intent created"
    );

    Ok(HttpResponse::Ok().json(intent))
}

/// POST /webhooks/psp
pub async fn psp_webhook<G: LiquidityGateway + 'static>(
    state: web::Data<AppState<G>>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let event: FiatConfirmationEvent = serde_json::from_slice(&body).map_err(|e| {
        metrics::CONFIRMATIONS.with_label_values(&["rejected"]).inc();
        ApiError::BadRequest(format!("invalid confirmation event: {e}"))
    })?;
    event.validate().map_err(|e| {
        metrics::CONFIRMATIONS.with_label_values(&["rejected"]).inc();
        ApiError::BadRequest(e.to_string())
    })?;

    let start = std::time::Instant::now();
    match state.processor.process_fiat_confirmation(&event).await {
        Ok(outcome) => {
            metrics::record_confirmation(outcome.label(), start.elapsed().as_secs_f64());
            Ok(HttpResponse::Ok().json(WebhookAck {
                status: "processed",
                event_id: &event.event_id,
                outcome,
            }))
        }
        Err(e) => {
            metrics::record_confirmation("error", start.elapsed().as_secs_f64());
            Err(ApiError::Processing(e))
        }
    }
}

/// GET /api/v1/status?id=<intent id>
pub async fn intent_status<G: LiquidityGateway + 'static>(
    state: web::Data<AppState<G>>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, ApiError> {
    let id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::NotFound("payment intent id is required".to_string()))?;

    match state.ledger().get_payment_intent(id) {
        Ok(intent) => Ok(HttpResponse::Ok().json(intent)),
        Err(e) if e.is_not_found() => Err(ApiError::NotFound(format!("payment intent {id}"))),
        Err(e) => Err(ApiError::Processing(e)),
    }
}

/// GET /health
pub async fn health<G: LiquidityGateway + 'static>(state: web::Data<AppState<G>>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "acceptance-orchestrator",
        "version": env!("CARGO_PKG_VERSION"),
        "intents": state.ledger().intent_count(),
    }))
}

/// Constant-time byte comparison that does not leak input lengths.
/// Both inputs are hashed to fixed-length digests before comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use sha2::{Digest, Sha256};
    use subtle::ConstantTimeEq;
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}

/// GET /metrics
pub async fn metrics_endpoint<G: LiquidityGateway + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<G>>,
) -> HttpResponse {
    match &state.metrics_token {
        Some(token) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| constant_time_eq(t.as_bytes(), token))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None if !state.public_metrics => {
            return HttpResponse::Forbidden().json(serde_json::json!({
                "error": "forbidden",
                "message": "Set METRICS_TOKEN or PUBLIC_METRICS=true to access /metrics"
            }));
        }
        None => {}
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}

pub fn configure<G: LiquidityGateway + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::<G>))
        .route("/metrics", web::get().to(metrics_endpoint::<G>))
        .route("/api/v1/payment_intents", web::post().to(create_intent::<G>))
        .route("/api/v1/status", web::get().to(intent_status::<G>))
        .route("/webhooks/psp", web::post().to(psp_webhook::<G>));
}
