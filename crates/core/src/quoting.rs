use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::agent_config::ServiceOffering;

/// 16% flat tax applied when a tenant does not configure its own rate.
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

/// Case-insensitive catalog lookup. Exact name match wins over substring
/// containment; among substring matches the first catalog entry (the tenant's
/// configured order) wins. Deterministic tie-break for ambiguous mentions
/// like "oil" against a catalog with two oil services.
pub fn match_service<'a>(
    catalog: &'a [ServiceOffering],
    query: &str,
) -> Option<&'a ServiceOffering> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) =
        catalog.iter().find(|service| service.name.to_lowercase() == needle)
    {
        return Some(exact);
    }

    catalog.iter().find(|service| {
        let name = service.name.to_lowercase();
        name.contains(&needle) || needle.contains(&name)
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub service: String,
    pub price: Decimal,
    pub duration_minutes: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub lines: Vec<QuoteLine>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// `total = subtotal + subtotal * tax_rate`, rounded to cents.
pub fn build_quote(
    catalog: &[ServiceOffering],
    requested: &[String],
    tax_rate: Decimal,
) -> Result<QuoteSummary, String> {
    let mut lines = Vec::with_capacity(requested.len());
    for mention in requested {
        let Some(service) = match_service(catalog, mention) else {
            let known: Vec<&str> =
                catalog.iter().map(|service| service.name.as_str()).collect();
            return Err(format!(
                "unknown service `{mention}`; known services: {}",
                known.join(", ")
            ));
        };
        lines.push(QuoteLine {
            service: service.name.clone(),
            price: service.price,
            duration_minutes: service.duration_minutes,
        });
    }

    let subtotal: Decimal = lines.iter().map(|line| line.price).sum();
    let tax = (subtotal * tax_rate).round_dp(2);
    let total = subtotal + tax;

    Ok(QuoteSummary { lines, subtotal, tax_rate, tax, total })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::agent_config::ServiceOffering;

    use super::{build_quote, match_service, DEFAULT_TAX_RATE};

    fn catalog() -> Vec<ServiceOffering> {
        vec![
            ServiceOffering {
                name: "Oil change".to_string(),
                price: Decimal::new(300, 0),
                duration_minutes: 60,
                description: "Engine oil and filter".to_string(),
            },
            ServiceOffering {
                name: "Oil change (synthetic)".to_string(),
                price: Decimal::new(450, 0),
                duration_minutes: 60,
                description: String::new(),
            },
            ServiceOffering {
                name: "Brake inspection".to_string(),
                price: Decimal::new(250, 0),
                duration_minutes: 45,
                description: String::new(),
            },
        ]
    }

    #[test]
    fn exact_name_beats_substring_match() {
        let catalog = catalog();
        let matched = match_service(&catalog, "oil change").expect("match");
        assert_eq!(matched.name, "Oil change");
    }

    #[test]
    fn ambiguous_substring_takes_first_catalog_entry() {
        let catalog = catalog();
        let matched = match_service(&catalog, "oil").expect("match");
        assert_eq!(matched.name, "Oil change");
    }

    #[test]
    fn longer_mention_containing_a_name_still_matches() {
        let catalog = catalog();
        let matched = match_service(&catalog, "full brake inspection please").expect("match");
        assert_eq!(matched.name, "Brake inspection");
    }

    #[test]
    fn unmatched_mention_is_none() {
        assert!(match_service(&catalog(), "paint job").is_none());
        assert!(match_service(&catalog(), "").is_none());
    }

    #[test]
    fn quote_applies_sixteen_percent_tax() {
        let summary =
            build_quote(&catalog(), &["Oil change".to_string()], DEFAULT_TAX_RATE).expect("quote");
        assert_eq!(summary.subtotal, Decimal::new(300, 0));
        assert_eq!(summary.tax, Decimal::new(4800, 2));
        assert_eq!(summary.total, Decimal::new(34800, 2));
    }

    #[test]
    fn quote_sums_multiple_lines() {
        let summary = build_quote(
            &catalog(),
            &["Oil change".to_string(), "brake".to_string()],
            DEFAULT_TAX_RATE,
        )
        .expect("quote");
        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.subtotal, Decimal::new(550, 0));
        assert_eq!(summary.total, Decimal::new(63800, 2));
    }

    #[test]
    fn unknown_service_lists_the_catalog() {
        let error = build_quote(&catalog(), &["paint job".to_string()], DEFAULT_TAX_RATE)
            .expect_err("should fail");
        assert!(error.contains("paint job"));
        assert!(error.contains("Oil change"));
    }
}
