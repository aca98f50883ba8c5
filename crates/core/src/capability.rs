use crate::domain::agent_config::TenantAgentConfig;

/// What the agent is allowed to do for a tenant. One table drives both the
/// rendered prompt text and the tool list handed to the model, so the model
/// is never offered a tool its adapter would refuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentCapability {
    ServiceInfo,
    Availability,
    Scheduling,
    Pricing,
    Quoting,
}

pub fn enabled_capabilities(config: &TenantAgentConfig) -> Vec<AgentCapability> {
    let mut capabilities =
        vec![AgentCapability::ServiceInfo, AgentCapability::Availability, AgentCapability::Pricing];
    if config.auto_schedule_appointments {
        capabilities.push(AgentCapability::Scheduling);
    }
    if config.auto_create_orders {
        capabilities.push(AgentCapability::Quoting);
    }
    capabilities
}
