//! ClusterRegistry port - 稼働中ノードの一覧
//!
//! コアが使うのは master の存在確認（admission の前提条件）だけ。

use crate::domain::errors::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Master,
    Worker,
}

pub trait ClusterRegistry: Send + Sync {
    /// Addresses of the nodes currently registered and reachable for `role`.
    fn list_active_nodes(&self, role: NodeRole) -> Result<Vec<String>, StoreError>;
}
