//! Tool declarations and the router that executes model tool calls.
//!
//! Visibility is driven by the same capability table that shapes the prompt,
//! so a tenant with scheduling disabled never sees
//! `create_appointment_request` in the tool list. The router re-checks that
//! table at dispatch, so a call naming a withheld tool fails even when the
//! model invents the name.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{json, Value};
use tracing::info;

use tallerbot_core::capability::{enabled_capabilities, AgentCapability};
use tallerbot_core::domain::agent_config::TenantAgentConfig;
use tallerbot_core::domain::customer::Customer;
use tallerbot_core::errors::AdapterError;

use crate::adapters::{
    matched_service, AppointmentScheduler, AvailabilityDesk, DayAvailability, QuoteDesk,
};
use crate::llm::{ToolCallRequest, ToolDeclaration, ToolOutcome};

pub const GET_SERVICES_INFO: &str = "get_services_info";
pub const GET_SERVICE_PRICE: &str = "get_service_price";
pub const CHECK_AVAILABILITY: &str = "check_availability";
pub const CREATE_APPOINTMENT_REQUEST: &str = "create_appointment_request";
pub const CREATE_QUOTE: &str = "create_quote";

fn declaration(capability: AgentCapability) -> ToolDeclaration {
    match capability {
        AgentCapability::ServiceInfo => ToolDeclaration {
            name: GET_SERVICES_INFO,
            description: "List the workshop's service catalog with prices and durations.",
            parameters: json!({ "type": "object", "properties": {}, "required": [] }),
        },
        AgentCapability::Pricing => ToolDeclaration {
            name: GET_SERVICE_PRICE,
            description: "Look up the price and duration of one catalog service by name.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "service_name": {
                        "type": "string",
                        "description": "Service name as the customer said it"
                    }
                },
                "required": ["service_name"]
            }),
        },
        AgentCapability::Availability => ToolDeclaration {
            name: CHECK_AVAILABILITY,
            description: "List free appointment start times for one date.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "date": { "type": "string", "description": "Date, YYYY-MM-DD" }
                },
                "required": ["date"]
            }),
        },
        AgentCapability::Scheduling => ToolDeclaration {
            name: CREATE_APPOINTMENT_REQUEST,
            description: "Book an appointment for the customer. Check availability first.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "service_name": { "type": "string" },
                    "date": { "type": "string", "description": "Date, YYYY-MM-DD" },
                    "time": { "type": "string", "description": "Start time, HH:MM" },
                    "vehicle": {
                        "type": "string",
                        "description": "Vehicle description if the customer gave one"
                    },
                    "notes": { "type": "string" }
                },
                "required": ["service_name", "date", "time"]
            }),
        },
        AgentCapability::Quoting => ToolDeclaration {
            name: CREATE_QUOTE,
            description: "Prepare a formal quote with tax for one or more catalog services.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "services": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Service names to quote"
                    }
                },
                "required": ["services"]
            }),
        },
    }
}

fn required_capability(name: &str) -> Option<AgentCapability> {
    match name {
        GET_SERVICES_INFO => Some(AgentCapability::ServiceInfo),
        GET_SERVICE_PRICE => Some(AgentCapability::Pricing),
        CHECK_AVAILABILITY => Some(AgentCapability::Availability),
        CREATE_APPOINTMENT_REQUEST => Some(AgentCapability::Scheduling),
        CREATE_QUOTE => Some(AgentCapability::Quoting),
        _ => None,
    }
}

/// The tool list offered to the model for this tenant.
pub fn visible_tools(config: &TenantAgentConfig) -> Vec<ToolDeclaration> {
    enabled_capabilities(config).into_iter().map(declaration).collect()
}

/// Per-turn facts the tools need beyond their arguments. The caller's
/// identity comes from the webhook, never from model arguments.
pub struct ToolContext<'a> {
    pub config: &'a TenantAgentConfig,
    pub customer: &'a Customer,
}

pub struct ToolRouter {
    availability: AvailabilityDesk,
    scheduler: AppointmentScheduler,
}

impl ToolRouter {
    pub fn new(
        appointments: Arc<dyn tallerbot_db::repositories::AppointmentRepository>,
    ) -> Self {
        Self {
            availability: AvailabilityDesk::new(appointments.clone()),
            scheduler: AppointmentScheduler::new(appointments),
        }
    }

    /// Executes one tool call. Adapter failures become error outcomes in the
    /// transcript rather than turn failures, so the model can apologize or
    /// retry with different arguments.
    pub async fn execute(&self, call: &ToolCallRequest, ctx: &ToolContext<'_>) -> ToolOutcome {
        let result = self.dispatch(call, ctx).await;
        match result {
            Ok(content) => {
                info!(
                    event_name = "agent.tool.executed",
                    tenant_id = %ctx.config.tenant_id,
                    tool = %call.name,
                    "tool call succeeded"
                );
                ToolOutcome {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    content,
                    is_error: false,
                }
            }
            Err(error) => {
                info!(
                    event_name = "agent.tool.failed",
                    tenant_id = %ctx.config.tenant_id,
                    tool = %call.name,
                    error_class = error.error_class(),
                    error = %error,
                    "tool call failed; outcome fed back to the model"
                );
                ToolOutcome {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    content: json!({
                        "error": error.error_class(),
                        "message": error.to_string(),
                    }),
                    is_error: true,
                }
            }
        }
    }

    async fn dispatch(
        &self,
        call: &ToolCallRequest,
        ctx: &ToolContext<'_>,
    ) -> Result<Value, AdapterError> {
        let capability =
            required_capability(call.name.as_str()).ok_or_else(|| AdapterError::InvalidArgument {
                field: "tool".to_string(),
                reason: format!("unknown tool `{}`", call.name),
            })?;
        if !enabled_capabilities(ctx.config).contains(&capability) {
            return Err(AdapterError::DisabledTool(call.name.clone()));
        }

        match call.name.as_str() {
            GET_SERVICES_INFO => Ok(services_info(ctx.config)),
            GET_SERVICE_PRICE => {
                let name = required_str(&call.arguments, "service_name")?;
                let service = matched_service(ctx.config, name)?;
                Ok(json!({
                    "service": service.name,
                    "price": service.price,
                    "duration_minutes": service.duration_minutes,
                }))
            }
            CHECK_AVAILABILITY => {
                let date = required_date(&call.arguments, "date")?;
                match self.availability.availability_on(ctx.config, date).await? {
                    DayAvailability::Closed => Ok(json!({
                        "date": date.to_string(),
                        "open": false,
                        "slots": [],
                    })),
                    DayAvailability::Open { slots } => Ok(json!({
                        "date": date.to_string(),
                        "open": true,
                        "slots": slots
                            .iter()
                            .map(|slot| slot.format("%H:%M").to_string())
                            .collect::<Vec<_>>(),
                    })),
                }
            }
            CREATE_APPOINTMENT_REQUEST => {
                let service = required_str(&call.arguments, "service_name")?;
                let date = required_date(&call.arguments, "date")?;
                let time = required_time(&call.arguments, "time")?;
                let vehicle = optional_str(&call.arguments, "vehicle");
                let notes = optional_str(&call.arguments, "notes");

                let start_at = NaiveDateTime::new(date, time);
                let appointment = self
                    .scheduler
                    .schedule(ctx.config, ctx.customer, service, start_at, vehicle, notes)
                    .await?;
                Ok(json!({
                    "appointment_id": appointment.id.0,
                    "service": appointment.service_type,
                    "start_at": appointment.start_at.format("%Y-%m-%d %H:%M").to_string(),
                    "duration_minutes": appointment.duration_minutes,
                }))
            }
            CREATE_QUOTE => {
                let services = required_str_list(&call.arguments, "services")?;
                let summary = QuoteDesk::quote(ctx.config, &services)?;
                Ok(serde_json::to_value(&summary).unwrap_or_else(|_| json!({})))
            }
            other => Err(AdapterError::InvalidArgument {
                field: "tool".to_string(),
                reason: format!("unknown tool `{other}`"),
            }),
        }
    }
}

fn services_info(config: &TenantAgentConfig) -> Value {
    json!({
        "services": config
            .services
            .iter()
            .map(|service| {
                json!({
                    "name": service.name,
                    "price": service.price,
                    "duration_minutes": service.duration_minutes,
                    "description": service.description,
                })
            })
            .collect::<Vec<_>>(),
    })
}

fn required_str<'a>(arguments: &'a Value, field: &str) -> Result<&'a str, AdapterError> {
    arguments.get(field).and_then(Value::as_str).filter(|raw| !raw.trim().is_empty()).ok_or_else(
        || AdapterError::InvalidArgument {
            field: field.to_string(),
            reason: "missing or empty".to_string(),
        },
    )
}

fn optional_str(arguments: &Value, field: &str) -> Option<String> {
    arguments
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(str::to_string)
}

fn required_date(arguments: &Value, field: &str) -> Result<NaiveDate, AdapterError> {
    let raw = required_str(arguments, field)?;
    raw.parse().map_err(|_| AdapterError::InvalidArgument {
        field: field.to_string(),
        reason: format!("`{raw}` is not a YYYY-MM-DD date"),
    })
}

fn required_time(arguments: &Value, field: &str) -> Result<NaiveTime, AdapterError> {
    let raw = required_str(arguments, field)?;
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AdapterError::InvalidArgument {
            field: field.to_string(),
            reason: format!("`{raw}` is not an HH:MM time"),
        })
}

fn required_str_list(arguments: &Value, field: &str) -> Result<Vec<String>, AdapterError> {
    let items = arguments.get(field).and_then(Value::as_array).ok_or_else(|| {
        AdapterError::InvalidArgument {
            field: field.to_string(),
            reason: "missing or not an array".to_string(),
        }
    })?;
    let list: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    if list.is_empty() {
        return Err(AdapterError::InvalidArgument {
            field: field.to_string(),
            reason: "empty list".to_string(),
        });
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveTime, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use tallerbot_core::domain::agent_config::{
        LlmVendor, ServiceOffering, TenantAgentConfig, TenantId, WhatsAppProvider,
    };
    use tallerbot_core::domain::customer::{Customer, CustomerId};
    use tallerbot_core::hours::{DayWindow, WeekSchedule};
    use tallerbot_db::repositories::InMemoryAppointmentRepository;

    use crate::llm::ToolCallRequest;

    use super::{visible_tools, ToolContext, ToolRouter, CREATE_APPOINTMENT_REQUEST, CREATE_QUOTE};

    fn config() -> TenantAgentConfig {
        let window = DayWindow {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        };
        TenantAgentConfig {
            tenant_id: TenantId("t1".to_string()),
            enabled: true,
            vendor: LlmVendor::OpenAi,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.4,
            max_tokens: 1024,
            business_hours_only: false,
            auto_schedule_appointments: true,
            auto_create_orders: true,
            require_human_approval: false,
            business_hours: WeekSchedule {
                friday: Some(window),
                ..WeekSchedule::default()
            },
            services: vec![ServiceOffering {
                name: "Cambio de aceite".to_string(),
                price: Decimal::new(500, 0),
                duration_minutes: 60,
                description: String::new(),
            }],
            policies: String::new(),
            faqs: Vec::new(),
            whatsapp_provider: WhatsAppProvider::Twilio,
            slot_minutes: 60,
            tax_rate: Decimal::new(16, 2),
            history_limit: 10,
        }
    }

    fn customer() -> Customer {
        Customer {
            id: CustomerId("c1".to_string()),
            tenant_id: TenantId("t1".to_string()),
            name: "Ana".to_string(),
            phone: "+5215551234567".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn disabled_capabilities_withhold_their_tools() {
        let mut config = config();
        let names: Vec<&str> = visible_tools(&config).iter().map(|tool| tool.name).collect();
        assert!(names.contains(&CREATE_APPOINTMENT_REQUEST));
        assert!(names.contains(&CREATE_QUOTE));

        config.auto_schedule_appointments = false;
        config.auto_create_orders = false;
        let names: Vec<&str> = visible_tools(&config).iter().map(|tool| tool.name).collect();
        assert!(!names.contains(&CREATE_APPOINTMENT_REQUEST));
        assert!(!names.contains(&CREATE_QUOTE));
        assert!(names.contains(&"get_services_info"));
    }

    #[tokio::test]
    async fn appointment_tool_books_through_the_scheduler() {
        let appointments = Arc::new(InMemoryAppointmentRepository::new());
        let router = ToolRouter::new(appointments.clone());
        let config = config();
        let customer = customer();
        let ctx = ToolContext { config: &config, customer: &customer };

        let call = ToolCallRequest {
            id: "call_1".to_string(),
            name: CREATE_APPOINTMENT_REQUEST.to_string(),
            arguments: json!({
                "service_name": "cambio de aceite",
                "date": "2026-08-28",
                "time": "14:00",
            }),
        };
        let outcome = router.execute(&call, &ctx).await;
        assert!(!outcome.is_error, "outcome: {:?}", outcome.content);
        assert_eq!(outcome.content["service"], "Cambio de aceite");
        assert_eq!(appointments.all().await.len(), 1);
    }

    #[tokio::test]
    async fn bad_arguments_become_error_outcomes() {
        let router = ToolRouter::new(Arc::new(InMemoryAppointmentRepository::new()));
        let config = config();
        let customer = customer();
        let ctx = ToolContext { config: &config, customer: &customer };

        let call = ToolCallRequest {
            id: "call_2".to_string(),
            name: CREATE_APPOINTMENT_REQUEST.to_string(),
            arguments: json!({
                "service_name": "cambio de aceite",
                "date": "next friday",
                "time": "14:00",
            }),
        };
        let outcome = router.execute(&call, &ctx).await;
        assert!(outcome.is_error);
        assert_eq!(outcome.content["error"], "invalid_argument");
    }

    #[tokio::test]
    async fn unknown_tool_names_are_rejected() {
        let router = ToolRouter::new(Arc::new(InMemoryAppointmentRepository::new()));
        let config = config();
        let customer = customer();
        let ctx = ToolContext { config: &config, customer: &customer };

        let call = ToolCallRequest {
            id: "call_3".to_string(),
            name: "drop_database".to_string(),
            arguments: json!({}),
        };
        let outcome = router.execute(&call, &ctx).await;
        assert!(outcome.is_error);
    }

    #[tokio::test]
    async fn withheld_tools_are_refused_at_dispatch() {
        let appointments = Arc::new(InMemoryAppointmentRepository::new());
        let router = ToolRouter::new(appointments.clone());
        let mut config = config();
        config.auto_create_orders = false;
        config.auto_schedule_appointments = false;
        let customer = customer();
        let ctx = ToolContext { config: &config, customer: &customer };

        let quote = ToolCallRequest {
            id: "call_6".to_string(),
            name: CREATE_QUOTE.to_string(),
            arguments: json!({ "services": ["Cambio de aceite"] }),
        };
        let outcome = router.execute(&quote, &ctx).await;
        assert!(outcome.is_error);
        assert_eq!(outcome.content["error"], "disabled_tool");

        let booking = ToolCallRequest {
            id: "call_7".to_string(),
            name: CREATE_APPOINTMENT_REQUEST.to_string(),
            arguments: json!({
                "service_name": "cambio de aceite",
                "date": "2026-08-28",
                "time": "14:00",
            }),
        };
        let outcome = router.execute(&booking, &ctx).await;
        assert!(outcome.is_error);
        assert!(appointments.all().await.is_empty());
    }

    #[tokio::test]
    async fn quote_tool_returns_totals_with_tax() {
        let router = ToolRouter::new(Arc::new(InMemoryAppointmentRepository::new()));
        let config = config();
        let customer = customer();
        let ctx = ToolContext { config: &config, customer: &customer };

        let call = ToolCallRequest {
            id: "call_4".to_string(),
            name: CREATE_QUOTE.to_string(),
            arguments: json!({ "services": ["Cambio de aceite"] }),
        };
        let outcome = router.execute(&call, &ctx).await;
        assert!(!outcome.is_error);
        assert_eq!(outcome.content["total"], json!("580.00"));
    }

    #[tokio::test]
    async fn availability_tool_reports_closed_days() {
        let router = ToolRouter::new(Arc::new(InMemoryAppointmentRepository::new()));
        let config = config();
        let customer = customer();
        let ctx = ToolContext { config: &config, customer: &customer };

        let call = ToolCallRequest {
            id: "call_5".to_string(),
            name: "check_availability".to_string(),
            arguments: json!({ "date": "2026-08-30" }),
        };
        let outcome = router.execute(&call, &ctx).await;
        assert!(!outcome.is_error);
        assert_eq!(outcome.content["open"], json!(false));
    }
}
