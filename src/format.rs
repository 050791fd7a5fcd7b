use chrono::{DateTime, Local, TimeDelta, Utc};

pub const UNSET_TIMESTAMP: &str = "0001-01-01T00:00:00Z";
pub const NOT_AVAILABLE: &str = "N/A";

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() || value == UNSET_TIMESTAMP {
        return None;
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Renders elapsed time using the largest applicable unit pair.
///
/// Units get a trailing `s` only when the quantity is greater than one, so
/// both `1 minute` and `0 second` are produced as-is.
pub fn format_uptime(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - start).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{} {}", unit(days, "day"), unit(hours % 24, "hour"))
    } else if hours > 0 {
        format!("{} {}", unit(hours, "hour"), unit(minutes % 60, "minute"))
    } else if minutes > 0 {
        format!("{} {}", unit(minutes, "minute"), unit(seconds % 60, "second"))
    } else {
        unit(seconds, "second")
    }
}

fn unit(quantity: i64, name: &str) -> String {
    let suffix = if quantity > 1 { "s" } else { "" };
    format!("{quantity} {name}{suffix}")
}

pub fn format_pod_uptime(start_time: &str, now: DateTime<Utc>) -> String {
    match parse_timestamp(start_time) {
        Some(start) => format_uptime(start, now),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_usage(usage: f64, limit: f64, request: f64, percent: f64) -> String {
    let mut parts = Vec::new();
    if usage > 0.0 {
        parts.push(format!("{usage}Mi"));
    }
    if limit > 0.0 {
        parts.push(format!("limit: {limit}Mi"));
    }
    if request > 0.0 {
        parts.push(format!("request: {request}Mi"));
    }
    if percent > 0.0 {
        parts.push(format!("({percent}%)"));
    }

    if parts.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        parts.join(", ")
    }
}

pub fn format_node_usage(usage: &str, capacity: &str, percentage: &str) -> String {
    format!("{usage} / {capacity} ({percentage}%)")
}

pub fn format_event_time(value: &str) -> String {
    if value.trim() == UNSET_TIMESTAMP {
        return NOT_AVAILABLE.to_string();
    }

    match parse_timestamp(value) {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => value.to_string(),
    }
}

pub fn memory_mib(bytes: f64) -> f64 {
    (bytes / BYTES_PER_MIB * 100.0).round() / 100.0
}

pub fn calculate_auto_step(start: DateTime<Utc>, end: DateTime<Utc>) -> &'static str {
    let width = end - start;
    if width >= TimeDelta::hours(24) {
        "15m"
    } else if width >= TimeDelta::hours(6) {
        "5m"
    } else if width >= TimeDelta::hours(1) {
        "1m"
    } else {
        "15s"
    }
}

pub fn parse_duration_token(token: &str) -> Option<TimeDelta> {
    let token = token.trim();
    let unit = token.chars().last()?;
    let amount = token[..token.len() - unit.len_utf8()].parse::<i64>().ok()?;
    if amount <= 0 {
        return None;
    }

    match unit {
        's' => TimeDelta::try_seconds(amount),
        'm' => TimeDelta::try_minutes(amount),
        'h' => TimeDelta::try_hours(amount),
        'd' => TimeDelta::try_days(amount),
        _ => None,
    }
}

pub fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value.chars().take(max_chars - 1).collect::<String>();
    out.push('…');
    out
}
