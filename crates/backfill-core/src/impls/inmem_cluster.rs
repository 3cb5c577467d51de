//! In-memory cluster registry.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use crate::ports::{ClusterRegistry, NodeRole, StoreError};

#[derive(Default)]
pub struct InMemoryCluster {
    nodes: Mutex<HashMap<NodeRole, BTreeSet<String>>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cluster with one master at `addr`.
    pub fn with_master(addr: impl Into<String>) -> Self {
        let cluster = Self::new();
        cluster.register(NodeRole::Master, addr);
        cluster
    }

    pub fn register(&self, role: NodeRole, addr: impl Into<String>) {
        let mut nodes = self.nodes.lock().unwrap_or_else(PoisonError::into_inner);
        nodes.entry(role).or_default().insert(addr.into());
    }

    pub fn deregister(&self, role: NodeRole, addr: &str) {
        let mut nodes = self.nodes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(set) = nodes.get_mut(&role) {
            set.remove(addr);
        }
    }
}

impl ClusterRegistry for InMemoryCluster {
    fn list_active_nodes(&self, role: NodeRole) -> Result<Vec<String>, StoreError> {
        let nodes = self
            .nodes
            .lock()
            .map_err(|_| StoreError::Poisoned("cluster"))?;
        Ok(nodes
            .get(&role)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}
