use tracing::{debug, warn};

use crate::gateway::{BackendGateway, GatewayResult};
use crate::model::DEFAULT_NAMESPACE;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NamespaceLoad {
    Uninitialized,
    Loaded,
}

#[derive(Debug, Clone)]
pub struct NamespaceStore {
    load: NamespaceLoad,
    namespaces: Vec<String>,
    selected: String,
}

impl Default for NamespaceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceStore {
    pub fn new() -> Self {
        Self {
            load: NamespaceLoad::Uninitialized,
            namespaces: Vec::new(),
            selected: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn load_state(&self) -> NamespaceLoad {
        self.load
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn apply_fetch(&mut self, result: GatewayResult<Vec<String>>) {
        match result {
            Ok(namespaces) => {
                if let Some(first) = namespaces.first() {
                    self.selected = first.clone();
                }
                debug!(count = namespaces.len(), selected = %self.selected, "namespaces loaded");
                self.namespaces = namespaces;
                self.load = NamespaceLoad::Loaded;
            }
            Err(error) => {
                warn!("namespace bootstrap failed: {error}");
            }
        }
    }

    pub fn select(&mut self, namespace: impl Into<String>) -> bool {
        let namespace = namespace.into();
        if namespace == self.selected {
            return false;
        }
        self.selected = namespace;
        true
    }

    pub fn select_offset(&mut self, delta: isize) -> bool {
        if self.namespaces.is_empty() {
            return false;
        }

        let len = self.namespaces.len() as isize;
        let next = match self.position() {
            Some(current) => (current as isize + delta).rem_euclid(len),
            None if delta < 0 => len - 1,
            None => 0,
        };
        let target = self.namespaces[next as usize].clone();
        self.select(target)
    }

    pub fn position(&self) -> Option<usize> {
        self.namespaces.iter().position(|ns| ns == &self.selected)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WatchChange {
    Added,
    Removed,
}

impl WatchChange {
    pub async fn send(self, gateway: &BackendGateway, namespace: &str) -> GatewayResult<()> {
        match self {
            Self::Added => gateway.add_watched_namespace(namespace).await,
            Self::Removed => gateway.remove_watched_namespace(namespace).await,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WatchedNamespaces {
    namespaces: Vec<String>,
}

impl WatchedNamespaces {
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.namespaces.iter().any(|ns| ns == namespace)
    }

    pub fn replace(&mut self, namespaces: Vec<String>) {
        self.namespaces = namespaces;
    }

    pub fn planned_change(&self, namespace: &str) -> WatchChange {
        if self.contains(namespace) {
            WatchChange::Removed
        } else {
            WatchChange::Added
        }
    }

    pub fn apply(
        &mut self,
        namespace: &str,
        change: WatchChange,
        result: GatewayResult<()>,
    ) -> GatewayResult<WatchChange> {
        result?;
        match change {
            WatchChange::Added => {
                if !self.contains(namespace) {
                    self.namespaces.push(namespace.to_string());
                }
            }
            WatchChange::Removed => self.namespaces.retain(|ns| ns != namespace),
        }
        Ok(change)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub namespaces: NamespaceStore,
    pub watched: WatchedNamespaces,
}
