//! Outbound reply delivery.
//!
//! A [`MessageTransport`] speaks one provider dialect; the
//! [`OutboundDispatcher`] wraps a transport and records every attempt in the
//! message log, so the transcript stays complete even when delivery fails.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use tallerbot_core::domain::conversation::{
    ConversationId, DeliveryStatus, Direction, Message, MessageId, MessageKind,
};
use tallerbot_core::domain::agent_config::{TenantId, WhatsAppProvider};
use tallerbot_db::repositories::{MessageRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("provider rejected the message: {status} {body}")]
    Rejected { status: u16, body: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("message log failure: {0}")]
    Store(#[from] RepositoryError),
}

impl From<reqwest::Error> for DispatchError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

/// Provider acknowledgement for a sent message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub provider_message_id: Option<String>,
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_text(&self, to_phone: &str, body: &str) -> Result<DeliveryReceipt, DispatchError>;
}

/// Drops every message. Wiring default and test stand-in.
#[derive(Default)]
pub struct NoopTransport;

#[async_trait]
impl MessageTransport for NoopTransport {
    async fn send_text(
        &self,
        _to_phone: &str,
        _body: &str,
    ) -> Result<DeliveryReceipt, DispatchError> {
        Ok(DeliveryReceipt::default())
    }
}

/// Twilio Messages API. Form-encoded POST, basic auth, `whatsapp:`-prefixed
/// addresses.
pub struct TwilioTransport {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_phone: String,
}

impl TwilioTransport {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_phone: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_phone: from_phone.into(),
        }
    }
}

#[derive(serde::Deserialize)]
struct TwilioSendResponse {
    sid: Option<String>,
}

#[async_trait]
impl MessageTransport for TwilioTransport {
    async fn send_text(&self, to_phone: &str, body: &str) -> Result<DeliveryReceipt, DispatchError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        );
        let form = [
            ("From", format!("whatsapp:{}", self.from_phone)),
            ("To", format!("whatsapp:{to_phone}")),
            ("Body", body.to_string()),
        ];

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected { status: status.as_u16(), body });
        }

        let parsed: TwilioSendResponse = response.json().await?;
        Ok(DeliveryReceipt { provider_message_id: parsed.sid })
    }
}

/// Meta Cloud API. JSON POST against the phone-number endpoint with a bearer
/// token.
pub struct MetaCloudTransport {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    phone_number_id: String,
}

impl MetaCloudTransport {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        phone_number_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_token: access_token.into(),
            phone_number_id: phone_number_id.into(),
        }
    }
}

#[derive(serde::Deserialize)]
struct MetaSendResponse {
    #[serde(default)]
    messages: Vec<MetaSentMessage>,
}

#[derive(serde::Deserialize)]
struct MetaSentMessage {
    id: String,
}

#[async_trait]
impl MessageTransport for MetaCloudTransport {
    async fn send_text(&self, to_phone: &str, body: &str) -> Result<DeliveryReceipt, DispatchError> {
        let url = format!(
            "{}/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.phone_number_id
        );
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to_phone.trim_start_matches('+'),
            "type": "text",
            "text": { "body": body },
        });

        let response =
            self.http.post(&url).bearer_auth(&self.access_token).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected { status: status.as_u16(), body });
        }

        let parsed: MetaSendResponse = response.json().await?;
        Ok(DeliveryReceipt {
            provider_message_id: parsed.messages.into_iter().next().map(|message| message.id),
        })
    }
}

/// Sends a reply and appends it to the message log. The log row is written
/// whether or not delivery succeeds, with `delivery_status` recording the
/// outcome, so operators can see what the bot tried to say.
///
/// Holds one transport per provider dialect; each tenant's config picks
/// which one carries its replies.
pub struct OutboundDispatcher {
    twilio: Arc<dyn MessageTransport>,
    meta: Arc<dyn MessageTransport>,
    messages: Arc<dyn MessageRepository>,
}

impl OutboundDispatcher {
    pub fn new(
        twilio: Arc<dyn MessageTransport>,
        meta: Arc<dyn MessageTransport>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self { twilio, meta, messages }
    }

    /// One transport for every tenant. Test wiring.
    pub fn uniform(transport: Arc<dyn MessageTransport>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { twilio: transport.clone(), meta: transport, messages }
    }

    pub async fn send_reply(
        &self,
        provider: WhatsAppProvider,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
        to_phone: &str,
        body: &str,
    ) -> Result<Message, DispatchError> {
        let transport = match provider {
            WhatsAppProvider::Twilio => &self.twilio,
            WhatsAppProvider::MetaCloud => &self.meta,
        };
        let send_result = transport.send_text(to_phone, body).await;

        let (delivery_status, provider_message_id, failure) = match send_result {
            Ok(receipt) => (DeliveryStatus::Sent, receipt.provider_message_id, None),
            Err(error) => (DeliveryStatus::Failed, None, Some(error)),
        };

        let message = Message {
            id: MessageId(format!("MSG-{}", Uuid::new_v4().simple())),
            conversation_id: conversation_id.clone(),
            tenant_id: tenant_id.clone(),
            direction: Direction::Outbound,
            body: body.to_string(),
            kind: MessageKind::Text,
            media_url: None,
            provider_message_id,
            delivery_status,
            created_at: Utc::now(),
        };
        self.messages.append(&message).await?;

        match failure {
            None => {
                info!(
                    event_name = "egress.whatsapp.reply_sent",
                    tenant_id = %tenant_id,
                    conversation_id = %conversation_id.0,
                    message_id = %message.id.0,
                    "outbound reply delivered to provider"
                );
                Ok(message)
            }
            Some(error) => {
                warn!(
                    event_name = "egress.whatsapp.reply_failed",
                    tenant_id = %tenant_id,
                    conversation_id = %conversation_id.0,
                    message_id = %message.id.0,
                    error = %error,
                    "outbound reply failed; logged with failed status"
                );
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use tallerbot_core::domain::agent_config::{TenantId, WhatsAppProvider};
    use tallerbot_core::domain::conversation::{ConversationId, DeliveryStatus};
    use tallerbot_db::repositories::InMemoryMessageRepository;

    use super::{DeliveryReceipt, DispatchError, MessageTransport, OutboundDispatcher};

    struct ScriptedTransport {
        results: Mutex<Vec<Result<DeliveryReceipt, DispatchError>>>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        fn new(results: Vec<Result<DeliveryReceipt, DispatchError>>) -> Self {
            Self { results: Mutex::new(results), sent: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl MessageTransport for ScriptedTransport {
        async fn send_text(
            &self,
            to_phone: &str,
            body: &str,
        ) -> Result<DeliveryReceipt, DispatchError> {
            self.sent.lock().await.push((to_phone.to_string(), body.to_string()));
            self.results.lock().await.remove(0)
        }
    }

    #[tokio::test]
    async fn successful_send_is_logged_as_sent() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(DeliveryReceipt {
            provider_message_id: Some("SM900".to_string()),
        })]));
        let messages = Arc::new(InMemoryMessageRepository::new());
        let dispatcher = OutboundDispatcher::uniform(transport.clone(), messages.clone());

        let message = dispatcher
            .send_reply(
                WhatsAppProvider::Twilio,
                &TenantId("t1".to_string()),
                &ConversationId("v1".to_string()),
                "+5215551234567",
                "Su cita quedó agendada.",
            )
            .await
            .expect("send");

        assert_eq!(message.delivery_status, DeliveryStatus::Sent);
        assert_eq!(message.provider_message_id.as_deref(), Some("SM900"));
        let logged = messages.all().await;
        assert_eq!(logged.len(), 1);
        assert_eq!(transport.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_send_is_still_logged() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(DispatchError::Rejected {
            status: 401,
            body: "bad credentials".to_string(),
        })]));
        let messages = Arc::new(InMemoryMessageRepository::new());
        let dispatcher = OutboundDispatcher::uniform(transport, messages.clone());

        let result = dispatcher
            .send_reply(
                WhatsAppProvider::MetaCloud,
                &TenantId("t1".to_string()),
                &ConversationId("v1".to_string()),
                "+5215551234567",
                "hola",
            )
            .await;

        assert!(result.is_err());
        let logged = messages.all().await;
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].delivery_status, DeliveryStatus::Failed);
        assert!(logged[0].provider_message_id.is_none());
    }
}
