//! WhatsApp Business API ingress and egress.
//!
//! Two provider dialects share one normalized shape: Twilio posts
//! `application/x-www-form-urlencoded` fields, Meta Cloud posts a nested JSON
//! envelope. Webhook handlers parse either into [`InboundEvent`] and hand it
//! to the orchestrator; replies go back out through a [`MessageTransport`].

pub mod inbound;
pub mod outbound;
pub mod signature;

pub use inbound::{
    parse_meta_payload, parse_twilio_form, InboundError, InboundEvent, NormalizedInbound,
    StatusUpdate,
};
pub use outbound::{
    DeliveryReceipt, DispatchError, MessageTransport, MetaCloudTransport, NoopTransport,
    OutboundDispatcher, TwilioTransport,
};
pub use signature::{verify_meta_signature, SignatureError};
