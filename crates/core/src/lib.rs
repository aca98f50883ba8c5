//! Tallerbot core - domain types and pure orchestration logic
//!
//! This crate holds everything the conversational agent needs that does not
//! touch the network or the database:
//!
//! - Domain records for conversations, messages, customers, appointments, and
//!   per-tenant agent configuration (`domain`)
//! - Business-hours evaluation and the canned "we are closed" reply (`hours`)
//! - Slot generation and the appointment conflict predicate (`scheduling`)
//! - Service-catalog matching and quote arithmetic (`quoting`)
//! - Deterministic system-prompt rendering (`prompt`) and the capability
//!   table that gates both prompt text and tool visibility (`capability`)
//! - The turn error taxonomy (`errors`) and application config (`config`)
//!
//! # Safety Principle
//!
//! The LLM is strictly a conversational front end. Prices, availability, and
//! booking decisions are computed here deterministically; the model can only
//! request them through the tool surface the capability table exposes.

pub mod capability;
pub mod config;
pub mod domain;
pub mod errors;
pub mod hours;
pub mod prompt;
pub mod quoting;
pub mod scheduling;

pub use capability::{enabled_capabilities, AgentCapability};
pub use domain::agent_config::{
    FaqEntry, LlmVendor, ServiceOffering, TenantAgentConfig, TenantId, WhatsAppProvider,
};
pub use domain::appointment::{Appointment, AppointmentId, AppointmentStatus};
pub use domain::conversation::{
    Conversation, ConversationId, ConversationStatus, DeliveryStatus, Direction, HistoryEntry,
    Message, MessageId, MessageKind,
};
pub use domain::customer::{normalize_phone, Customer, CustomerId};
pub use errors::{AdapterError, TurnError};
pub use hours::{render_closed_reply, DayWindow, WeekSchedule};
pub use prompt::{build_system_prompt, BusinessFacts};
pub use quoting::{build_quote, match_service, QuoteSummary, DEFAULT_TAX_RATE};
pub use scheduling::{conflicts_with_any, free_slots, overlaps, BookedSlot};
