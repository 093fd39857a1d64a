// Small formatting helpers shared by the catalog and enrollment views.

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// `"<h>h <m>m"` for an hour or more, `"<m>m"` otherwise.
pub fn format_duration(d: Duration) -> String {
    let minutes = d.as_secs() / 60;
    let hours = minutes / 60;
    if hours >= 1 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

pub fn certificate_number(issued_at: DateTime<Utc>) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!(
        "CERT-{}-{}",
        issued_at.format("%Y%m%d"),
        simple[..8].to_uppercase()
    )
}

pub fn hours(d: Duration) -> f64 {
    d.as_secs_f64() / 3600.0
}
