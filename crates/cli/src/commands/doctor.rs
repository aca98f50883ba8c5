use serde::Serialize;
use tallerbot_core::config::{AppConfig, LoadOptions};
use tallerbot_db::connect_with_settings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_credentials(&config));
            checks.push(check_whatsapp_transports(&config));
            checks.push(check_database_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["llm_credentials", "whatsapp_transports", "database_connectivity"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_llm_credentials(config: &AppConfig) -> DoctorCheck {
    let mut vendors = Vec::new();
    if config.llm.openai_api_key.is_some() {
        vendors.push("openai");
    }
    if config.llm.anthropic_api_key.is_some() {
        vendors.push("anthropic");
    }

    if vendors.is_empty() {
        DoctorCheck {
            name: "llm_credentials",
            status: CheckStatus::Fail,
            details: "no model vendor key configured; set TALLERBOT_OPENAI_API_KEY or \
                      TALLERBOT_ANTHROPIC_API_KEY"
                .to_string(),
        }
    } else {
        DoctorCheck {
            name: "llm_credentials",
            status: CheckStatus::Pass,
            details: format!("keys present for: {}", vendors.join(", ")),
        }
    }
}

fn check_whatsapp_transports(config: &AppConfig) -> DoctorCheck {
    let twilio = config.whatsapp.twilio_account_sid.is_some()
        && config.whatsapp.twilio_auth_token.is_some()
        && config.whatsapp.twilio_from_phone.is_some();
    let meta = config.whatsapp.meta_access_token.is_some()
        && config.whatsapp.meta_phone_number_id.is_some();

    let mut transports = Vec::new();
    if twilio {
        transports.push("twilio");
    }
    if meta {
        transports.push("meta_cloud");
    }

    if transports.is_empty() {
        DoctorCheck {
            name: "whatsapp_transports",
            status: CheckStatus::Fail,
            details: "no WhatsApp transport fully configured; outbound replies would be dropped"
                .to_string(),
        }
    } else {
        DoctorCheck {
            name: "whatsapp_transports",
            status: CheckStatus::Pass,
            details: format!("configured transports: {}", transports.join(", ")),
        }
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

        pool.close().await;
        Ok::<(), String>(())
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
