//! HTTP ingress for provider webhooks.
//!
//! One route serves both providers: `/webhook/{tenant_id}/{provider}`. The
//! tenant comes from the path, never from the payload, so a forged body can
//! only ever talk to its own tenant. Meta additionally signs every POST and
//! uses a GET handshake when the webhook is first subscribed.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use tallerbot_agent::{Orchestrator, TurnOutcome};
use tallerbot_core::domain::agent_config::{TenantId, WhatsAppProvider};
use tallerbot_db::repositories::MessageRepository;
use tallerbot_whatsapp::inbound::{parse_meta_payload, parse_twilio_form, InboundEvent};
use tallerbot_whatsapp::signature::verify_meta_signature;

const META_SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub messages: Arc<dyn MessageRepository>,
    pub meta_app_secret: Option<String>,
    pub meta_verify_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<&'static str>,
}

impl WebhookResponse {
    fn ok() -> Self {
        Self { status: "ok", error_class: None }
    }

    fn error(class: &'static str) -> Self {
        Self { status: "error", error_class: Some(class) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/{tenant_id}/{provider}", get(verify).post(receive))
        .with_state(state)
}

/// Meta subscription handshake. Echoes `hub.challenge` when the verify token
/// matches; everything else is forbidden. Twilio has no GET leg.
async fn verify(
    State(state): State<AppState>,
    Path((tenant_id, provider)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    if !matches!(WhatsAppProvider::parse(&provider), Some(WhatsAppProvider::MetaCloud)) {
        return (StatusCode::NOT_FOUND, String::new());
    }

    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token");
    let challenge = params.get("hub.challenge");

    match (mode, token, challenge, state.meta_verify_token.as_ref()) {
        (Some("subscribe"), Some(token), Some(challenge), Some(expected)) if token == expected => {
            info!(
                event_name = "ingress.webhook.verified",
                tenant_id = %tenant_id,
                "webhook subscription handshake accepted"
            );
            (StatusCode::OK, challenge.clone())
        }
        _ => {
            warn!(
                event_name = "ingress.webhook.verify_rejected",
                tenant_id = %tenant_id,
                "webhook subscription handshake rejected"
            );
            (StatusCode::FORBIDDEN, String::new())
        }
    }
}

async fn receive(
    State(state): State<AppState>,
    Path((tenant_id, provider)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    let Some(provider) = WhatsAppProvider::parse(&provider) else {
        return (StatusCode::NOT_FOUND, Json(WebhookResponse::error("unknown_provider")));
    };
    let tenant = TenantId(tenant_id);

    let events = match provider {
        WhatsAppProvider::Twilio => {
            let fields: HashMap<String, String> = match serde_urlencoded::from_bytes(&body) {
                Ok(fields) => fields,
                Err(error) => {
                    warn!(
                        event_name = "ingress.webhook.malformed",
                        tenant_id = %tenant,
                        provider = provider.as_str(),
                        error = %error,
                        "webhook body was not a form"
                    );
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(WebhookResponse::error("malformed_payload")),
                    );
                }
            };
            match parse_twilio_form(&fields) {
                Ok(event) => vec![event],
                Err(error) => {
                    warn!(
                        event_name = "ingress.webhook.malformed",
                        tenant_id = %tenant,
                        provider = provider.as_str(),
                        error = %error,
                        "webhook form was missing required fields"
                    );
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(WebhookResponse::error("malformed_payload")),
                    );
                }
            }
        }
        WhatsAppProvider::MetaCloud => {
            if let Some(secret) = state.meta_app_secret.as_deref() {
                let header = headers
                    .get(META_SIGNATURE_HEADER)
                    .and_then(|value| value.to_str().ok());
                if let Err(error) = verify_meta_signature(secret, &body, header) {
                    warn!(
                        event_name = "ingress.webhook.signature_rejected",
                        tenant_id = %tenant,
                        error = %error,
                        "webhook signature did not verify"
                    );
                    return (
                        StatusCode::UNAUTHORIZED,
                        Json(WebhookResponse::error("invalid_signature")),
                    );
                }
            }

            let payload: serde_json::Value = match serde_json::from_slice(&body) {
                Ok(payload) => payload,
                Err(error) => {
                    warn!(
                        event_name = "ingress.webhook.malformed",
                        tenant_id = %tenant,
                        provider = provider.as_str(),
                        error = %error,
                        "webhook body was not JSON"
                    );
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(WebhookResponse::error("malformed_payload")),
                    );
                }
            };
            match parse_meta_payload(&payload) {
                Ok(events) => events,
                Err(error) => {
                    warn!(
                        event_name = "ingress.webhook.malformed",
                        tenant_id = %tenant,
                        provider = provider.as_str(),
                        error = %error,
                        "webhook envelope did not parse"
                    );
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(WebhookResponse::error("malformed_payload")),
                    );
                }
            }
        }
    };

    let mut first_error: Option<&'static str> = None;
    for event in events {
        match event {
            InboundEvent::Status(update) => {
                if let Err(error) = state
                    .messages
                    .update_delivery_status(&update.provider_message_id, update.status)
                    .await
                {
                    warn!(
                        event_name = "ingress.webhook.status_update_failed",
                        tenant_id = %tenant,
                        provider_message_id = %update.provider_message_id,
                        error = %error,
                        "delivery status update failed"
                    );
                    first_error.get_or_insert("store");
                }
            }
            InboundEvent::Message(inbound) => {
                let now_local = Local::now().naive_local();
                match state.orchestrator.handle_inbound(&tenant, &inbound, now_local).await {
                    Ok(outcome) => {
                        let label = match &outcome {
                            TurnOutcome::Replied(_) => "replied",
                            TurnOutcome::ClosedNotice(_) => "closed_notice",
                            TurnOutcome::Skipped(reason) => reason,
                        };
                        info!(
                            event_name = "ingress.webhook.turn_finished",
                            tenant_id = %tenant,
                            outcome = label,
                            "inbound message processed"
                        );
                    }
                    Err(error) => {
                        warn!(
                            event_name = "ingress.webhook.turn_failed",
                            tenant_id = %tenant,
                            error_class = error.error_class(),
                            error = %error,
                            "turn failed"
                        );
                        first_error.get_or_insert(error.error_class());
                    }
                }
            }
        }
    }

    // Providers replay webhooks on non-2xx responses. Once the payload
    // parsed, a failed turn must not be replayed, so the outcome rides in
    // the body instead of the status code.
    match first_error {
        None => (StatusCode::OK, Json(WebhookResponse::ok())),
        Some(class) => (StatusCode::OK, Json(WebhookResponse::error(class))),
    }
}
