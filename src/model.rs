use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PageKind {
    Nodes,
    Pods,
    Events,
    Alerts,
}

impl PageKind {
    pub const ALL: [Self; 4] = [Self::Nodes, Self::Pods, Self::Events, Self::Alerts];

    pub fn title_key(self) -> &'static str {
        match self {
            Self::Nodes => "nodes.title",
            Self::Pods => "pods.title",
            Self::Events => "events.title",
            Self::Alerts => "alerts.title",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Page {
    Nodes,
    Pods,
    Events,
    Alerts,
    NodeMetrics { node: String },
    PodMetrics { pod: String },
}

impl Page {
    pub fn kind(&self) -> PageKind {
        match self {
            Self::Nodes | Self::NodeMetrics { .. } => PageKind::Nodes,
            Self::Pods | Self::PodMetrics { .. } => PageKind::Pods,
            Self::Events => PageKind::Events,
            Self::Alerts => PageKind::Alerts,
        }
    }

    pub fn is_metrics(&self) -> bool {
        matches!(self, Self::NodeMetrics { .. } | Self::PodMetrics { .. })
    }

    pub fn path(&self) -> String {
        match self {
            Self::Nodes => "/".to_string(),
            Self::Pods => "/pods".to_string(),
            Self::Events => "/events".to_string(),
            Self::Alerts => "/alerts".to_string(),
            Self::NodeMetrics { node } => format!("/nodes/{node}/metrics"),
            Self::PodMetrics { pod } => format!("/pods/{pod}/metrics"),
        }
    }

    pub fn from_kind(kind: PageKind) -> Self {
        match kind {
            PageKind::Nodes => Self::Nodes,
            PageKind::Pods => Self::Pods,
            PageKind::Events => Self::Events,
            PageKind::Alerts => Self::Alerts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Node {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub cpu_usage: String,
    #[serde(default)]
    pub cpu_capacity: String,
    #[serde(default)]
    pub cpu_usage_percentage: String,
    #[serde(default)]
    pub memory_usage: String,
    #[serde(default)]
    pub memory_usage_percentage: String,
    #[serde(default)]
    pub memory_capacity: String,
}

impl Node {
    pub fn is_ready(&self) -> bool {
        self.status == "Ready"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Pod {
    pub pod_name: String,
    pub namespace: String,
    #[serde(default)]
    pub node_name: String,
    pub status: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub cpu_usage: f64,
    #[serde(default)]
    pub cpu_usage_percent: f64,
    #[serde(default)]
    pub cpu_usage_limit: f64,
    #[serde(default)]
    pub cpu_usage_request: f64,
    #[serde(default)]
    pub memory_usage: f64,
    #[serde(default)]
    pub memory_usage_percent: f64,
    #[serde(default)]
    pub memory_usage_limit: f64,
    #[serde(default)]
    pub memory_usage_request: f64,
    #[serde(default)]
    pub restart_count: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PodPhase {
    Running,
    Pending,
    Succeeded,
    Failed,
    Unknown,
    Other,
}

impl PodPhase {
    pub fn parse(status: &str) -> Self {
        match status {
            "Running" => Self::Running,
            "Pending" => Self::Pending,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            "Unknown" => Self::Unknown,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Event {
    #[serde(default)]
    pub id: String,
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub involved_object: String,
    #[serde(default)]
    pub first_timestamp: String,
    #[serde(default)]
    pub last_timestamp: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum EventTypeFilter {
    #[default]
    All,
    Normal,
    Warning,
}

impl EventTypeFilter {
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Normal => Some("Normal"),
            Self::Warning => Some("Warning"),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Normal,
            Self::Normal => Self::Warning,
            Self::Warning => Self::All,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "" | "all" => Some(Self::All),
            "normal" => Some(Self::Normal),
            "warning" | "warn" => Some(Self::Warning),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Normal => "Normal",
            Self::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricPoint {
    pub timestamp: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MetricSeries {
    #[serde(default)]
    pub cpu_usage: Vec<MetricPoint>,
    #[serde(default)]
    pub memory_usage: Vec<MetricPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricsQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    #[default]
    All,
    Warning,
    Normal,
}

impl AlertType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "warning" => Some(Self::Warning),
            "normal" => Some(Self::Normal),
            _ => None,
        }
    }
}

impl Display for AlertType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Warning => write!(f, "warning"),
            Self::Normal => write!(f, "normal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlertRule {
    pub id: i64,
    pub chat_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<i64>,
    pub alert_type: AlertType,
    pub namespace: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAlertRule {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<i64>,
    pub alert_type: AlertType,
    pub namespace: String,
}
