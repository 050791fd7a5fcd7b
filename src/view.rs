use chrono::{DateTime, Local, TimeDelta, Utc};

use crate::format::{calculate_auto_step, parse_duration_token};
use crate::gateway::BackendGateway;
use crate::model::{AlertRule, Event, EventTypeFilter, MetricSeries, MetricsQuery, Node, Pod};
use crate::poll::{Generation, PollUpdate};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TimeWindow {
    Relative(TimeDelta),
    Absolute {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl TimeWindow {
    pub fn absolute(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self::Absolute { start, end })
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match *self {
            Self::Relative(span) => (now - span, now),
            Self::Absolute { start, end } => (start, end),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Relative(span) => format!("last {}", span_label(*span)),
            Self::Absolute { start, end } => format!(
                "{} → {}",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            ),
        }
    }
}

fn span_label(span: TimeDelta) -> String {
    let seconds = span.num_seconds();
    if seconds % 86_400 == 0 {
        format!("{}d", seconds / 86_400)
    } else if seconds % 3_600 == 0 {
        format!("{}h", seconds / 3_600)
    } else if seconds % 60 == 0 {
        format!("{}m", seconds / 60)
    } else {
        format!("{seconds}s")
    }
}

// A hand-set step turns auto mode off until set_auto_step(true).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MetricsWindow {
    window: TimeWindow,
    auto_step: bool,
    manual_step: String,
}

impl MetricsWindow {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            auto_step: true,
            manual_step: "15s".to_string(),
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn auto_step(&self) -> bool {
        self.auto_step
    }

    pub fn set_window(&mut self, window: TimeWindow) {
        self.window = window;
    }

    pub fn set_step(&mut self, step: &str) -> Result<(), String> {
        let step = step.trim();
        if parse_duration_token(step).is_none() {
            return Err(format!("invalid step '{step}'"));
        }
        self.manual_step = step.to_string();
        self.auto_step = false;
        Ok(())
    }

    pub fn set_auto_step(&mut self, enabled: bool) {
        if self.auto_step && !enabled {
            let (start, end) = self.window.resolve(Utc::now());
            self.manual_step = calculate_auto_step(start, end).to_string();
        }
        self.auto_step = enabled;
    }

    pub fn step_for(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        if self.auto_step {
            calculate_auto_step(start, end).to_string()
        } else {
            self.manual_step.clone()
        }
    }

    pub fn query(&self, now: DateTime<Utc>) -> MetricsQuery {
        let (start, end) = self.window.resolve(now);
        MetricsQuery {
            start,
            end,
            step: self.step_for(start, end),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FetchRequest {
    Nodes,
    Pods {
        namespace: String,
    },
    Events {
        namespace: String,
        limit: u32,
        filter: EventTypeFilter,
    },
    NodeMetrics {
        node: String,
        window: MetricsWindow,
    },
    PodMetrics {
        namespace: String,
        pod: String,
        window: MetricsWindow,
    },
    Alerts {
        namespace: String,
    },
}

impl FetchRequest {
    pub fn is_metrics(&self) -> bool {
        matches!(self, Self::NodeMetrics { .. } | Self::PodMetrics { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewData {
    Nodes(Vec<Node>),
    Pods(Vec<Pod>),
    Events(Vec<Event>),
    Metrics {
        series: MetricSeries,
        query: MetricsQuery,
    },
    Alerts(Vec<AlertRule>),
}

pub async fn fetch_view_data(
    gateway: &BackendGateway,
    request: &FetchRequest,
) -> Result<ViewData, String> {
    let outcome = match request {
        FetchRequest::Nodes => gateway.list_nodes().await.map(ViewData::Nodes),
        FetchRequest::Pods { namespace } => gateway.list_pods(namespace).await.map(ViewData::Pods),
        FetchRequest::Events {
            namespace,
            limit,
            filter,
        } => gateway
            .list_events(namespace, *limit, *filter)
            .await
            .map(ViewData::Events),
        FetchRequest::NodeMetrics { node, window } => {
            let query = window.query(Utc::now());
            gateway
                .node_metrics(node, &query)
                .await
                .map(|series| ViewData::Metrics { series, query })
        }
        FetchRequest::PodMetrics {
            namespace,
            pod,
            window,
        } => {
            let query = window.query(Utc::now());
            gateway
                .pod_metrics(namespace, pod, &query)
                .await
                .map(|series| ViewData::Metrics { series, query })
        }
        FetchRequest::Alerts { namespace } => {
            gateway.list_alerts(namespace).await.map(ViewData::Alerts)
        }
    };

    outcome.map_err(|error| error.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    generation: Generation,
    loading: bool,
    data: Option<ViewData>,
    error: Option<String>,
    refreshed_at: Option<DateTime<Local>>,
}

impl ViewState {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn data(&self) -> Option<&ViewData> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        self.refreshed_at
    }

    pub fn begin(&mut self, generation: Generation, same_target: bool) {
        self.generation = generation;
        self.loading = true;
        if !same_target {
            self.data = None;
            self.error = None;
        }
    }

    pub fn apply(&mut self, update: PollUpdate<ViewData>, now: DateTime<Local>) -> bool {
        if update.generation != self.generation {
            return false;
        }

        self.loading = false;
        self.refreshed_at = Some(now);
        match update.result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(error) => self.error = Some(error),
        }
        true
    }
}
