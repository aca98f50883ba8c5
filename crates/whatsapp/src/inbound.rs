//! Provider webhook payloads normalized into one inbound shape.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use tallerbot_core::domain::conversation::{DeliveryStatus, MessageKind};
use tallerbot_core::domain::customer::normalize_phone;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InboundError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// One customer message, provider details already stripped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedInbound {
    pub sender_phone: String,
    pub sender_name: Option<String>,
    pub body: String,
    pub kind: MessageKind,
    pub media_url: Option<String>,
    pub provider_message_id: Option<String>,
}

/// Delivery-status advance for a previously sent outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusUpdate {
    pub provider_message_id: String,
    pub status: DeliveryStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    Message(NormalizedInbound),
    Status(StatusUpdate),
}

/// Parses a Twilio webhook form body. Twilio posts both fresh messages and
/// delivery-status callbacks to the same URL; `MessageStatus` distinguishes
/// them.
pub fn parse_twilio_form(fields: &HashMap<String, String>) -> Result<InboundEvent, InboundError> {
    if let Some(raw_status) = fields.get("MessageStatus") {
        let sid = fields
            .get("MessageSid")
            .ok_or(InboundError::MissingField("MessageSid"))?;
        let status = delivery_status_from(raw_status)
            .ok_or_else(|| InboundError::Malformed(format!("unknown status `{raw_status}`")))?;
        return Ok(InboundEvent::Status(StatusUpdate {
            provider_message_id: sid.clone(),
            status,
        }));
    }

    let from = fields.get("From").ok_or(InboundError::MissingField("From"))?;
    let body = fields.get("Body").cloned().unwrap_or_default();

    let num_media: u32 = fields
        .get("NumMedia")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(0);
    let (kind, media_url) = if num_media > 0 {
        let content_type = fields.get("MediaContentType0").map(String::as_str).unwrap_or("");
        (media_kind_from(content_type), fields.get("MediaUrl0").cloned())
    } else {
        (MessageKind::Text, None)
    };

    Ok(InboundEvent::Message(NormalizedInbound {
        sender_phone: normalize_phone(from),
        sender_name: fields.get("ProfileName").cloned(),
        body,
        kind,
        media_url,
        provider_message_id: fields.get("MessageSid").cloned(),
    }))
}

#[derive(Deserialize)]
struct MetaEnvelope {
    #[serde(default)]
    entry: Vec<MetaEntry>,
}

#[derive(Deserialize)]
struct MetaEntry {
    #[serde(default)]
    changes: Vec<MetaChange>,
}

#[derive(Deserialize)]
struct MetaChange {
    value: MetaValue,
}

#[derive(Deserialize)]
struct MetaValue {
    #[serde(default)]
    contacts: Vec<MetaContact>,
    #[serde(default)]
    messages: Vec<MetaMessage>,
    #[serde(default)]
    statuses: Vec<MetaStatus>,
}

#[derive(Deserialize)]
struct MetaContact {
    wa_id: String,
    profile: Option<MetaProfile>,
}

#[derive(Deserialize)]
struct MetaProfile {
    name: Option<String>,
}

#[derive(Deserialize)]
struct MetaMessage {
    from: String,
    id: String,
    #[serde(rename = "type")]
    kind: String,
    text: Option<MetaText>,
    image: Option<MetaMedia>,
    document: Option<MetaMedia>,
    audio: Option<MetaMedia>,
    video: Option<MetaMedia>,
}

#[derive(Deserialize)]
struct MetaText {
    body: String,
}

#[derive(Deserialize)]
struct MetaMedia {
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

#[derive(Deserialize)]
struct MetaStatus {
    id: String,
    status: String,
}

/// Parses a Meta Cloud API webhook envelope. One POST can batch several
/// messages and status updates across entries; events come back in payload
/// order. Unknown message types and statuses are skipped rather than failing
/// the whole batch.
pub fn parse_meta_payload(payload: &serde_json::Value) -> Result<Vec<InboundEvent>, InboundError> {
    let envelope: MetaEnvelope = serde_json::from_value(payload.clone())
        .map_err(|error| InboundError::Malformed(error.to_string()))?;

    let mut events = Vec::new();
    for entry in envelope.entry {
        for change in entry.changes {
            let value = change.value;
            for message in value.messages {
                let sender_name = value
                    .contacts
                    .iter()
                    .find(|contact| contact.wa_id == message.from)
                    .and_then(|contact| contact.profile.as_ref())
                    .and_then(|profile| profile.name.clone());

                let (kind, body, media_url) = match message.kind.as_str() {
                    "text" => {
                        let body = message
                            .text
                            .as_ref()
                            .map(|text| text.body.clone())
                            .unwrap_or_default();
                        (MessageKind::Text, body, None)
                    }
                    "image" => media_parts(MessageKind::Image, message.image.as_ref()),
                    "document" => media_parts(MessageKind::Document, message.document.as_ref()),
                    "audio" => media_parts(MessageKind::Audio, message.audio.as_ref()),
                    "video" => media_parts(MessageKind::Video, message.video.as_ref()),
                    _ => continue,
                };

                events.push(InboundEvent::Message(NormalizedInbound {
                    sender_phone: normalize_phone(&message.from),
                    sender_name,
                    body,
                    kind,
                    media_url,
                    provider_message_id: Some(message.id),
                }));
            }
            for status in value.statuses {
                if let Some(mapped) = delivery_status_from(&status.status) {
                    events.push(InboundEvent::Status(StatusUpdate {
                        provider_message_id: status.id,
                        status: mapped,
                    }));
                }
            }
        }
    }
    Ok(events)
}

fn media_parts(
    kind: MessageKind,
    media: Option<&MetaMedia>,
) -> (MessageKind, String, Option<String>) {
    let caption = media.and_then(|m| m.caption.clone()).unwrap_or_default();
    let link = media.and_then(|m| m.link.clone());
    (kind, caption, link)
}

fn media_kind_from(content_type: &str) -> MessageKind {
    if content_type.starts_with("image/") {
        MessageKind::Image
    } else if content_type.starts_with("audio/") {
        MessageKind::Audio
    } else if content_type.starts_with("video/") {
        MessageKind::Video
    } else {
        MessageKind::Document
    }
}

fn delivery_status_from(raw: &str) -> Option<DeliveryStatus> {
    match raw {
        "queued" | "accepted" | "sending" => Some(DeliveryStatus::Pending),
        "sent" => Some(DeliveryStatus::Sent),
        "delivered" => Some(DeliveryStatus::Delivered),
        "read" => Some(DeliveryStatus::Read),
        "failed" | "undelivered" => Some(DeliveryStatus::Failed),
        _ => None,
    }
}
