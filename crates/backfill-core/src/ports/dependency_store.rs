//! DependencyStore port - ワークフロー間の依存（逆引き）

use crate::domain::errors::StoreError;
use crate::domain::{DefinitionCode, DependentEdge};

pub trait DependencyStore: Send + Sync {
    /// Edges of DEPENDENT-type tasks whose dependency references `code`.
    fn get_dependent_edges_referencing(
        &self,
        code: DefinitionCode,
    ) -> Result<Vec<DependentEdge>, StoreError>;
}
