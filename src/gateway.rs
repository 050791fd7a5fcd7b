use anyhow::{Context, Result};
use chrono::SecondsFormat;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    AlertRule, Event, EventTypeFilter, MetricSeries, MetricsQuery, NewAlertRule, Node, Pod,
};

/// Failure of a single backend call. Only the message text is meant for
/// callers; the variant records where the call broke down.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Status(String),

    #[error("{0}")]
    Decode(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[derive(Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Option<Vec<Event>>,
}

#[derive(Deserialize)]
struct WatchedNamespacesResponse {
    #[serde(default)]
    namespaces: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct AlertsResponse {
    #[serde(default)]
    alerts: Option<Vec<AlertRule>>,
}

#[derive(Clone)]
pub struct BackendGateway {
    client: Client,
    base_url: Url,
}

impl BackendGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid backend base url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("backend base url '{base_url}' cannot carry API paths");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to initialize HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub async fn list_namespaces(&self) -> GatewayResult<Vec<String>> {
        let url = self.endpoint(&["api", "namespaces"])?;
        self.fetch_json(self.client.get(url), "Failed to fetch namespaces")
            .await
    }

    pub async fn list_nodes(&self) -> GatewayResult<Vec<Node>> {
        let url = self.endpoint(&["api", "nodes"])?;
        self.fetch_json(self.client.get(url), "Failed to fetch nodes")
            .await
    }

    pub async fn node_metrics(&self, node: &str, query: &MetricsQuery) -> GatewayResult<MetricSeries> {
        let url = self.endpoint(&["api", "nodes", "metrics", node])?;
        let response = self
            .dispatch(with_window(self.client.get(url), query))
            .await?;
        if !response.status().is_success() {
            return Err(GatewayError::Status(format!(
                "HTTP error! status: {}",
                response.status().as_u16()
            )));
        }
        decode(response).await
    }

    pub async fn list_pods(&self, namespace: &str) -> GatewayResult<Vec<Pod>> {
        let url = self.endpoint(&["api", "pods"])?;
        let request = self.client.get(url).query(&[("namespace", namespace)]);
        self.fetch_json(request, "Failed to fetch pods").await
    }

    pub async fn pod_metrics(
        &self,
        namespace: &str,
        pod: &str,
        query: &MetricsQuery,
    ) -> GatewayResult<MetricSeries> {
        let url = self.endpoint(&["api", "pods", "metrics", namespace, pod])?;
        let request = with_window(self.client.get(url), query);
        self.fetch_json(request, "Failed to fetch pod metrics").await
    }

    pub async fn list_events(
        &self,
        namespace: &str,
        limit: u32,
        filter: EventTypeFilter,
    ) -> GatewayResult<Vec<Event>> {
        let url = self.endpoint(&["api", "events"])?;
        let mut params = vec![
            ("namespace", namespace.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(event_type) = filter.query_value() {
            params.push(("type", event_type.to_string()));
        }

        let response: EventsResponse = self
            .fetch_json(self.client.get(url).query(&params), "Failed to fetch events")
            .await?;
        Ok(response.events.unwrap_or_default())
    }

    pub async fn list_watched_namespaces(&self) -> GatewayResult<Vec<String>> {
        let url = self.endpoint(&["api", "watched_namespaces"])?;
        let response: WatchedNamespacesResponse = self
            .fetch_json(self.client.get(url), "Failed to fetch watched namespaces")
            .await?;
        Ok(response.namespaces.unwrap_or_default())
    }

    pub async fn add_watched_namespace(&self, namespace: &str) -> GatewayResult<()> {
        let url = self.endpoint(&["api", "watched_namespaces"])?;
        let request = self.client.post(url).query(&[("namespace", namespace)]);
        self.send(request, "Failed to add watched namespace")
            .await
            .map(drop)
    }

    pub async fn remove_watched_namespace(&self, namespace: &str) -> GatewayResult<()> {
        let url = self.endpoint(&["api", "watched_namespaces", namespace])?;
        self.send(self.client.delete(url), "Failed to remove watched namespace")
            .await
            .map(drop)
    }

    pub async fn list_alerts(&self, namespace: &str) -> GatewayResult<Vec<AlertRule>> {
        let url = self.endpoint(&["api", "alerts", "namespace", namespace])?;
        let response: AlertsResponse = self
            .fetch_json(self.client.get(url), "Failed to fetch alerts")
            .await?;
        Ok(response.alerts.unwrap_or_default())
    }

    pub async fn create_alert(&self, rule: &NewAlertRule) -> GatewayResult<()> {
        let url = self.endpoint(&["api", "alerts"])?;
        self.send(self.client.post(url).json(rule), "Failed to create alert")
            .await
            .map(drop)
    }

    pub async fn delete_alert(&self, id: i64) -> GatewayResult<()> {
        let url = self.endpoint(&["api", "alerts", &id.to_string()])?;
        self.send(self.client.delete(url), "Failed to delete alert")
            .await
            .map(drop)
    }

    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Transport(format!("invalid backend url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch_json<T>(&self, request: RequestBuilder, failure: &str) -> GatewayResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request, failure).await?;
        decode(response).await
    }

    async fn send(&self, request: RequestBuilder, failure: &str) -> GatewayResult<Response> {
        let response = self.dispatch(request).await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "{failure}");
            return Err(GatewayError::Status(failure.to_string()));
        }
        Ok(response)
    }

    async fn dispatch(&self, request: RequestBuilder) -> GatewayResult<Response> {
        request
            .send()
            .await
            .map_err(|error| GatewayError::Transport(transport_message(&error)))
    }
}

fn with_window(request: RequestBuilder, query: &MetricsQuery) -> RequestBuilder {
    request.query(&[
        ("start", query.start.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ("end", query.end.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ("step", query.step.clone()),
    ])
}

async fn decode<T>(response: Response) -> GatewayResult<T>
where
    T: DeserializeOwned,
{
    let body = response
        .bytes()
        .await
        .map_err(|error| GatewayError::Transport(transport_message(&error)))?;
    serde_json::from_slice(&body)
        .map_err(|error| GatewayError::Decode(format!("invalid response body: {error}")))
}

fn transport_message(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "backend request timed out".to_string()
    } else if error.is_connect() {
        "backend is unreachable".to_string()
    } else {
        error.to_string()
    }
}
