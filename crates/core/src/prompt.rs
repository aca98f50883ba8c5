use chrono::NaiveDate;

use crate::capability::{enabled_capabilities, AgentCapability};
use crate::domain::agent_config::TenantAgentConfig;

/// Tenant facts rendered into the prompt that do not live in the agent
/// config record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusinessFacts {
    pub workshop_name: String,
    pub today: NaiveDate,
}

/// Renders the system prompt for one turn. Pure and deterministic: the same
/// facts and config always produce the same text, which keeps prompt changes
/// reviewable and testable.
///
/// Capability flags gate whole sections. A tenant with scheduling disabled
/// gets explicit deferral instructions instead of scheduling guidance, and
/// the matching tools are withheld by the registry using the same table.
pub fn build_system_prompt(facts: &BusinessFacts, config: &TenantAgentConfig) -> String {
    let capabilities = enabled_capabilities(config);
    let mut sections = Vec::new();

    sections.push(format!(
        "You are the WhatsApp assistant for {name}, an auto workshop. \
         Today is {today}. Reply in the customer's language, keep answers \
         short and concrete, and never invent prices or availability: use \
         the provided tools for anything you do not know.",
        name = facts.workshop_name,
        today = facts.today.format("%Y-%m-%d"),
    ));

    sections.push(format!("Business hours:\n{}", config.business_hours.render()));

    if config.services.is_empty() {
        sections.push("No service catalog is configured; answer general questions only.".into());
    } else {
        let catalog = config
            .services
            .iter()
            .map(|service| {
                format!(
                    "- {name}: ${price} ({minutes} min){detail}",
                    name = service.name,
                    price = service.price,
                    minutes = service.duration_minutes,
                    detail = if service.description.is_empty() {
                        String::new()
                    } else {
                        format!(" - {}", service.description)
                    },
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Service catalog:\n{catalog}"));
    }

    if !config.policies.is_empty() {
        sections.push(format!("Workshop policies:\n{}", config.policies));
    }

    if !config.faqs.is_empty() {
        let faqs = config
            .faqs
            .iter()
            .map(|faq| format!("Q: {}\nA: {}", faq.question, faq.answer))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Frequently asked questions:\n{faqs}"));
    }

    if capabilities.contains(&AgentCapability::Scheduling) {
        sections.push(
            "You may book appointments. Always check availability for the \
             requested date first, offer the free slots, and only create the \
             appointment after the customer picks one."
                .into(),
        );
    } else {
        sections.push(
            "You must NOT book appointments. If the customer asks to \
             schedule, collect the preferred date and service and tell them \
             a colleague will confirm the booking shortly."
                .into(),
        );
    }

    if capabilities.contains(&AgentCapability::Quoting) {
        sections.push(
            "You may prepare formal quotes with tax included when the \
             customer asks for pricing on one or more services."
                .into(),
        );
    } else {
        sections.push(
            "Do not produce formal quotes. You may state catalog prices, \
             but refer the customer to the workshop for a full quote."
                .into(),
        );
    }

    if config.require_human_approval {
        sections.push(
            "Every commitment you make is subject to human review; phrase \
             confirmations as pending review."
                .into(),
        );
    }

    sections.join("\n\n")
}
