//! The turn loop: one inbound message in, at most one reply out.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use tallerbot_core::domain::agent_config::{TenantId, WhatsAppProvider};
use tallerbot_core::domain::conversation::Message;
use tallerbot_core::errors::TurnError;
use tallerbot_core::hours::render_closed_reply;
use tallerbot_core::prompt::{build_system_prompt, BusinessFacts};
use tallerbot_db::repositories::{AgentConfigRepository, TenantAgentProfile};
use tallerbot_whatsapp::inbound::NormalizedInbound;
use tallerbot_whatsapp::outbound::OutboundDispatcher;

use crate::context::{ConversationGateway, ResolvedTurn};
use crate::llm::{ChatRequest, ModelTurn, TranscriptEntry};
use crate::providers::ChatProviderFactory;
use crate::tools::{visible_tools, ToolContext, ToolRouter};

/// Hard ceiling on model rounds per turn. A model that keeps requesting
/// tools past this gets the fallback reply instead of another round.
pub const MAX_TOOL_ROUNDS: usize = 6;

const FALLBACK_REPLY: &str = "Sorry, I could not finish that request just now. \
                              A member of our team will follow up with you shortly.";

const PROVIDER_RETRY_DELAY: Duration = Duration::from_millis(200);

/// How the turn ended. `Skipped` turns persist the inbound message but send
/// nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied(Message),
    ClosedNotice(Message),
    Skipped(&'static str),
}

pub struct Orchestrator {
    configs: Arc<dyn AgentConfigRepository>,
    gateway: ConversationGateway,
    providers: Arc<dyn ChatProviderFactory>,
    tools: ToolRouter,
    dispatcher: OutboundDispatcher,
}

impl Orchestrator {
    pub fn new(
        configs: Arc<dyn AgentConfigRepository>,
        gateway: ConversationGateway,
        providers: Arc<dyn ChatProviderFactory>,
        tools: ToolRouter,
        dispatcher: OutboundDispatcher,
    ) -> Self {
        Self { configs, gateway, providers, tools, dispatcher }
    }

    /// Runs one conversational turn. `now_local` is the tenant's wall-clock
    /// time; the business-hours gate and all scheduling dates use it.
    pub async fn handle_inbound(
        &self,
        tenant_id: &TenantId,
        inbound: &NormalizedInbound,
        now_local: NaiveDateTime,
    ) -> Result<TurnOutcome, TurnError> {
        let profile = self
            .configs
            .load(tenant_id)
            .await
            .map_err(|error| TurnError::Store(error.to_string()))?
            .ok_or_else(|| TurnError::NotConfigured(tenant_id.clone()))?;

        let resolved =
            self.gateway.resolve(tenant_id, inbound, profile.config.history_limit).await?;

        info!(
            event_name = "agent.turn.started",
            tenant_id = %tenant_id,
            conversation_id = %resolved.conversation.id.0,
            correlation_id = %resolved.inbound_message_id.0,
            "inbound message resolved"
        );

        if !profile.config.enabled {
            info!(
                event_name = "agent.turn.skipped",
                tenant_id = %tenant_id,
                conversation_id = %resolved.conversation.id.0,
                reason = "agent_disabled",
                "agent disabled for tenant; message logged only"
            );
            return Ok(TurnOutcome::Skipped("agent_disabled"));
        }
        if !resolved.conversation.bot_active {
            info!(
                event_name = "agent.turn.skipped",
                tenant_id = %tenant_id,
                conversation_id = %resolved.conversation.id.0,
                reason = "human_takeover",
                "a human owns this conversation; message logged only"
            );
            return Ok(TurnOutcome::Skipped("human_takeover"));
        }

        if profile.config.business_hours_only
            && !profile.config.business_hours.is_within(now_local)
        {
            let reply =
                render_closed_reply(&profile.workshop_name, &profile.config.business_hours);
            let message =
                self.dispatch(&resolved, profile.config.whatsapp_provider, &reply).await?;
            info!(
                event_name = "agent.turn.closed_notice",
                tenant_id = %tenant_id,
                conversation_id = %resolved.conversation.id.0,
                "outside business hours; canned reply sent without a model call"
            );
            return Ok(TurnOutcome::ClosedNotice(message));
        }

        let reply = match self.run_model_loop(&profile, &resolved, now_local).await {
            Ok(reply) => reply,
            Err(error) => {
                self.apologize(&resolved, profile.config.whatsapp_provider, &error).await;
                return Err(error);
            }
        };
        let message =
            self.dispatch(&resolved, profile.config.whatsapp_provider, &reply).await?;

        info!(
            event_name = "agent.turn.completed",
            tenant_id = %tenant_id,
            conversation_id = %resolved.conversation.id.0,
            message_id = %message.id.0,
            "turn completed with a reply"
        );
        Ok(TurnOutcome::Replied(message))
    }

    /// Best-effort apology for a turn that died after the conversation was
    /// resolved. The original error is what surfaces to the caller; a
    /// dispatch failure here is logged and dropped.
    async fn apologize(
        &self,
        resolved: &ResolvedTurn,
        provider: WhatsAppProvider,
        error: &TurnError,
    ) {
        let Some(apology) = error.user_message() else {
            return;
        };
        match self.dispatch(resolved, provider, apology).await {
            Ok(message) => info!(
                event_name = "agent.turn.apology_sent",
                tenant_id = %resolved.conversation.tenant_id,
                conversation_id = %resolved.conversation.id.0,
                message_id = %message.id.0,
                error_class = error.error_class(),
                "turn failed; apology dispatched to the customer"
            ),
            Err(dispatch_error) => warn!(
                event_name = "agent.turn.apology_failed",
                tenant_id = %resolved.conversation.tenant_id,
                conversation_id = %resolved.conversation.id.0,
                error_class = error.error_class(),
                error = %dispatch_error,
                "turn failed and the apology could not be dispatched"
            ),
        }
    }

    async fn run_model_loop(
        &self,
        profile: &TenantAgentProfile,
        resolved: &ResolvedTurn,
        now_local: NaiveDateTime,
    ) -> Result<String, TurnError> {
        let config = &profile.config;
        let facts =
            BusinessFacts { workshop_name: profile.workshop_name.clone(), today: now_local.date() };
        let system = build_system_prompt(&facts, config);
        let tools = visible_tools(config);
        let provider = self.providers.for_vendor(config.vendor).ok_or_else(|| {
            TurnError::Configuration(format!(
                "no API credential configured for vendor `{}`",
                config.vendor.as_str()
            ))
        })?;

        let mut transcript: Vec<TranscriptEntry> = resolved
            .history
            .iter()
            .map(|entry| match entry.role {
                "assistant" => TranscriptEntry::Assistant(entry.text.clone()),
                _ => TranscriptEntry::User(entry.text.clone()),
            })
            .collect();

        for round in 1..=MAX_TOOL_ROUNDS {
            let request = ChatRequest {
                model: config.model.clone(),
                system: system.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                transcript: transcript.clone(),
                tools: tools.clone(),
            };

            let turn = match provider.send_turn(&request).await {
                Ok(turn) => turn,
                Err(first_error) => {
                    warn!(
                        event_name = "agent.provider.retry",
                        tenant_id = %config.tenant_id,
                        round,
                        error = %first_error,
                        "provider call failed; retrying once"
                    );
                    tokio::time::sleep(PROVIDER_RETRY_DELAY).await;
                    provider
                        .send_turn(&request)
                        .await
                        .map_err(|error| TurnError::Provider(error.to_string()))?
                }
            };

            match turn {
                ModelTurn::Text(text) => return Ok(text),
                ModelTurn::ToolCalls(calls) => {
                    let ctx = ToolContext { config, customer: &resolved.customer };
                    let mut outcomes = Vec::with_capacity(calls.len());
                    for call in &calls {
                        outcomes.push(self.tools.execute(call, &ctx).await);
                    }
                    transcript.push(TranscriptEntry::ToolCalls(calls));
                    transcript.push(TranscriptEntry::ToolOutcomes(outcomes));
                }
            }
        }

        warn!(
            event_name = "agent.turn.round_limit",
            tenant_id = %config.tenant_id,
            conversation_id = %resolved.conversation.id.0,
            max_rounds = MAX_TOOL_ROUNDS,
            "model never produced text; sending fallback reply"
        );
        Ok(FALLBACK_REPLY.to_string())
    }

    async fn dispatch(
        &self,
        resolved: &ResolvedTurn,
        provider: WhatsAppProvider,
        body: &str,
    ) -> Result<Message, TurnError> {
        self.dispatcher
            .send_reply(
                provider,
                &resolved.conversation.tenant_id,
                &resolved.conversation.id,
                &resolved.customer.phone,
                body,
            )
            .await
            .map_err(|error| TurnError::Dispatch(error.to_string()))
    }
}
