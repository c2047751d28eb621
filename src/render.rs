//! Plain-text rendering of the console views.

use chrono::{DateTime, Local, Utc};
use std::fmt::Write;

use crate::api::KeyService;
use crate::console::{Console, Notifier, Tab, Validity};
use crate::models::{
    ActivationRecord, CustomerStats, Expiry, GeneratedKey, Health, KeyCounts, ServiceInfo,
    Verification, NEVER_EXPIRES,
};

const NOT_AVAILABLE: &str = "N/A";

/// Calendar date in local time, or "Never expires".
pub fn format_date(expiry: &Expiry) -> String {
    match expiry {
        Expiry::Never => NEVER_EXPIRES.to_string(),
        Expiry::At(at) => format_timestamp(Some(at)),
    }
}

pub fn format_timestamp(at: Option<&DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

fn status_label(record: &ActivationRecord) -> &'static str {
    if record.is_active {
        "Active"
    } else {
        "Inactive"
    }
}

/// Left-aligned text table with a header rule.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(headers.to_vec()));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in rows {
        let _ = writeln!(out, "{}", line(row.iter().map(String::as_str).collect()));
    }
    out
}

pub fn render_tab_bar(active: Tab) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            if *tab == active {
                format!("[{}]", tab.label())
            } else {
                format!(" {} ", tab.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_generated_key(key: &GeneratedKey) -> String {
    let mut out = String::from("Generated Key:\n");
    let _ = writeln!(out, "  {}", key.activation_key);
    let validity = match key.validity_days {
        Some(days) => format!("{days} days"),
        None => "lifetime".to_string(),
    };
    let _ = writeln!(out, "  app: {}  system: {}  validity: {}", key.app, key.system_id, validity);
    out
}

pub fn render_verification(result: &Verification) -> String {
    let mut out = String::new();
    let verdict = if result.valid { "VALID" } else { "INVALID" };
    let _ = writeln!(out, "Verification Result: {verdict}");
    let _ = writeln!(out, "  {}", result.message);
    if result.valid {
        if let Some(name) = result.customer_name.as_deref().filter(|n| !n.is_empty()) {
            let _ = writeln!(out, "  Customer: {name}");
        }
        if let Some(expiry) = &result.expires_at {
            let _ = writeln!(out, "  Expires: {}", format_date(expiry));
        }
    }
    out
}

/// Full key listing with one row per record.
pub fn render_records(records: &[ActivationRecord]) -> String {
    let headers = [
        "App",
        "System ID",
        "Activation Key",
        "Customer Name",
        "Mobile",
        "Email",
        "Created",
        "Expires",
        "Status",
    ];
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.app.to_string(),
                r.system_id.clone(),
                r.activation_key.clone(),
                or_na(&r.customer_name).to_string(),
                r.mobile().unwrap_or(NOT_AVAILABLE).to_string(),
                or_na(&r.customer_email).to_string(),
                format_timestamp(r.created_at.as_ref()),
                format_date(&r.expires_at),
                status_label(r).to_string(),
            ]
        })
        .collect();
    table(&headers, &rows)
}

fn counts_line(counts: &KeyCounts) -> String {
    format!(
        "Total: {}  Active: {}  Expired: {}  Deactivated: {}",
        counts.total, counts.active, counts.expired, counts.deactivated
    )
}

pub fn render_stats(stats: &CustomerStats) -> String {
    let mut out = String::new();

    if let Some(customer) = &stats.customer {
        let _ = writeln!(out, "Customer Information");
        let _ = writeln!(
            out,
            "  Name: {}  Mobile: {}  Email: {}",
            customer.name,
            or_na(&customer.mobile),
            customer.email
        );
        out.push('\n');
    }

    let _ = writeln!(out, "Keys");
    let _ = writeln!(out, "  {}", counts_line(&stats.totals));
    out.push('\n');

    let _ = writeln!(out, "App-wise Breakdown");
    for (app, counts) in &stats.apps {
        let _ = writeln!(out, "  {app:<12} {}", counts_line(counts));
    }

    if !stats.activations.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Activation History");
        let rows: Vec<Vec<String>> = stats
            .activations
            .iter()
            .map(|r| {
                vec![
                    r.app.to_string(),
                    r.activation_key.clone(),
                    format_timestamp(r.created_at.as_ref()),
                    status_label(r).to_string(),
                ]
            })
            .collect();
        out.push_str(&table(&["App", "Key", "Created", "Status"], &rows));
    }
    out
}

pub fn render_health(health: &Health) -> String {
    format!("{}: {}", or_na(&health.service), health.status)
}

pub fn render_service_info(info: &ServiceInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (version {})", info.message, or_na(&info.version));
    let _ = writeln!(out, "Supported apps: {}", info.supported_apps.join(", "));
    let _ = writeln!(out, "Endpoints:");
    for endpoint in &info.endpoints {
        let _ = writeln!(out, "  {endpoint}");
    }
    out
}

fn field(out: &mut String, label: &str, value: &str) {
    let shown = if value.is_empty() { "-" } else { value };
    let _ = writeln!(out, "  {label:<16} {shown}");
}

/// Draw the tab bar and the panel of the current tab.
pub fn render<S: KeyService, N: Notifier>(console: &Console<S, N>) -> String {
    let busy = console.is_busy();
    let mut out = render_tab_bar(console.tab());
    out.push_str("\n\n");

    match console.tab() {
        Tab::Generate => {
            let form = &console.generate_form;
            let _ = writeln!(out, "Generate Activation Key");
            field(&mut out, "App Name *", form.app.as_str());
            field(&mut out, "System ID *", &form.system_id);
            field(&mut out, "Customer Name *", &form.customer_name);
            field(&mut out, "Mobile Number", &form.customer_mobile);
            field(&mut out, "Email Address *", &form.customer_email);
            field(&mut out, "Key Validity", &form.validity.to_string());
            if form.validity == Validity::Limited {
                field(&mut out, "Validity (days)", &form.validity_days);
            }
            let _ = writeln!(out, "  {}", if busy { "Generating..." } else { "[submit] Generate Key" });
            if let Some(key) = console.generated_key() {
                out.push('\n');
                out.push_str(&render_generated_key(key));
            }
        }
        Tab::Verify => {
            let form = &console.verify_form;
            let _ = writeln!(out, "Verify Activation Key");
            field(&mut out, "Application *", form.app.as_str());
            field(&mut out, "System ID *", &form.system_id);
            field(&mut out, "Activation Key *", &form.activation_key);
            let _ = writeln!(out, "  {}", if busy { "Verifying..." } else { "[submit] Verify Key" });
            if let Some(result) = console.verification() {
                out.push('\n');
                out.push_str(&render_verification(result));
            }
        }
        Tab::Manage => {
            let _ = writeln!(
                out,
                "Manage Activation Keys  {}",
                if busy { "Loading..." } else { "[refresh]" }
            );
            let records = console.activations();
            if records.is_empty() && !busy {
                let _ = writeln!(out, "No activation keys found");
            } else {
                out.push_str(&render_records(records));
            }
        }
        Tab::CustomerStats => {
            let _ = writeln!(out, "Customer Statistics");
            field(&mut out, "Customer Email", &console.stats_query.email);
            let _ = writeln!(out, "  {}", if busy { "Loading..." } else { "[submit] Get Stats" });
            out.push('\n');
            match console.stats() {
                Some(stats) => out.push_str(&render_stats(stats)),
                None if console.stats_searched() => {
                    let _ = writeln!(out, "No data found for the provided email address");
                }
                None => {}
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppName;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn sample(key: &str, active: bool) -> ActivationRecord {
        ActivationRecord {
            app: AppName::MailStorm,
            system_id: "SYS-7".to_string(),
            activation_key: key.to_string(),
            customer_name: String::new(),
            customer_mobile: Some(String::new()),
            customer_email: "ops@example.com".to_string(),
            created_at: Some(Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()),
            expires_at: Expiry::Never,
            is_active: active,
            validity_days: None,
        }
    }

    #[test]
    fn never_expires_label() {
        assert_eq!(format_date(&Expiry::Never), "Never expires");
        let at = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        assert!(format_date(&Expiry::At(at)).starts_with("2025-03-1"));
    }

    #[test]
    fn records_table_fills_missing_values() {
        let out = render_records(&[sample("AAAA-1111-2222-3333", false)]);
        let row = out.lines().nth(2).unwrap();

        assert!(out.starts_with("App"));
        assert!(row.contains("mail-storm"));
        assert!(row.contains("N/A"));
        assert!(row.contains("Never expires"));
        assert!(row.ends_with("Inactive"));
    }

    #[test]
    fn tab_bar_marks_active_tab() {
        let bar = render_tab_bar(Tab::Verify);
        assert!(bar.contains("[Verify Key]"));
        assert!(!bar.contains("[Generate Key]"));
    }

    #[test]
    fn stats_panel_lists_breakdown_and_history() {
        let mut apps = BTreeMap::new();
        apps.insert(
            AppName::MailStorm,
            KeyCounts {
                total: 1,
                active: 1,
                expired: 0,
                deactivated: 0,
            },
        );
        let stats = CustomerStats {
            customer: None,
            totals: KeyCounts {
                total: 1,
                active: 1,
                expired: 0,
                deactivated: 0,
            },
            apps,
            activations: vec![sample("AAAA-1111-2222-3333", true)],
        };

        let out = render_stats(&stats);
        assert!(!out.contains("Customer Information"));
        assert!(out.contains("App-wise Breakdown"));
        assert!(out.contains("Activation History"));
        assert!(out.contains("AAAA-1111-2222-3333"));
    }

    #[test]
    fn invalid_verification_hides_customer() {
        let result = Verification {
            valid: false,
            message: "Activation key has been deactivated".to_string(),
            expired: false,
            customer_name: Some("Asha".to_string()),
            customer_mobile: None,
            customer_email: None,
            expires_at: None,
            validity_type: None,
        };
        let out = render_verification(&result);
        assert!(out.contains("INVALID"));
        assert!(!out.contains("Asha"));
    }
}
