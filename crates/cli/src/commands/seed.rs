use crate::commands::CommandResult;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use tallerbot_core::config::{AppConfig, LoadOptions};
use tallerbot_core::domain::agent_config::{
    FaqEntry, LlmVendor, ServiceOffering, TenantAgentConfig, TenantId, WhatsAppProvider,
};
use tallerbot_core::hours::{DayWindow, WeekSchedule};
use tallerbot_db::repositories::{AgentConfigRepository, SqlAgentConfigRepository};
use tallerbot_db::{connect_with_settings, migrations};

pub const DEMO_TENANT_ID: &str = "demo-taller";
pub const DEMO_WORKSHOP_NAME: &str = "Taller Demo La Curva";

fn window(open_hour: u32, close_hour: u32) -> Option<DayWindow> {
    Some(DayWindow {
        open: NaiveTime::from_hms_opt(open_hour, 0, 0)?,
        close: NaiveTime::from_hms_opt(close_hour, 0, 0)?,
    })
}

/// Full agent profile for the demo tenant. Re-running `seed` replaces it,
/// so the command is safe to repeat after editing.
pub fn demo_config() -> TenantAgentConfig {
    TenantAgentConfig {
        tenant_id: TenantId(DEMO_TENANT_ID.to_string()),
        enabled: true,
        vendor: LlmVendor::OpenAi,
        model: "gpt-4o-mini".to_string(),
        temperature: 0.4,
        max_tokens: 1024,
        business_hours_only: true,
        auto_schedule_appointments: true,
        auto_create_orders: false,
        require_human_approval: false,
        business_hours: WeekSchedule {
            monday: window(9, 18),
            tuesday: window(9, 18),
            wednesday: window(9, 18),
            thursday: window(9, 18),
            friday: window(9, 18),
            saturday: window(9, 14),
            sunday: None,
        },
        services: vec![
            ServiceOffering {
                name: "Cambio de aceite".to_string(),
                price: Decimal::new(650, 0),
                duration_minutes: 60,
                description: "Aceite sintético y filtro incluidos".to_string(),
            },
            ServiceOffering {
                name: "Afinación mayor".to_string(),
                price: Decimal::new(2400, 0),
                duration_minutes: 180,
                description: "Bujías, filtros, y revisión general".to_string(),
            },
            ServiceOffering {
                name: "Alineación y balanceo".to_string(),
                price: Decimal::new(800, 0),
                duration_minutes: 90,
                description: String::new(),
            },
        ],
        policies: "Se requiere anticipo del 20% para trabajos mayores. \
                   Cancelaciones con menos de 24 horas pierden el anticipo."
            .to_string(),
        faqs: vec![
            FaqEntry {
                question: "¿Aceptan tarjeta?".to_string(),
                answer: "Sí, aceptamos tarjeta de crédito y débito.".to_string(),
            },
            FaqEntry {
                question: "¿Dan factura?".to_string(),
                answer: "Sí, solicítela al pagar con sus datos fiscales.".to_string(),
            },
        ],
        whatsapp_provider: WhatsAppProvider::Twilio,
        slot_minutes: 60,
        tax_rate: Decimal::new(16, 2),
        history_limit: 10,
    }
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlAgentConfigRepository::new(pool.clone());
        let demo = demo_config();
        repository
            .upsert(DEMO_WORKSHOP_NAME, &demo)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let stored = repository
            .load(&demo.tenant_id)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
        let run_result = match stored {
            Some(profile) => Ok(profile.config.services.len()),
            None => Err((
                "seed_verification",
                "demo tenant was not readable after upsert".to_string(),
                6u8,
            )),
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(service_count) => CommandResult::success(
            "seed",
            format!(
                "demo tenant `{DEMO_TENANT_ID}` ({DEMO_WORKSHOP_NAME}) seeded with \
                 {service_count} services"
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
