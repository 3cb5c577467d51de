//! TenantStore port - テナント解決

use crate::domain::errors::StoreError;

pub trait TenantStore: Send + Sync {
    /// Resolve the tenant to run under.
    ///
    /// With `tenant_code = Some(..)` the tenant must exist; with `None` the tenant of
    /// `user_id` is returned. `Ok(None)` means nothing could be resolved.
    fn resolve_tenant(
        &self,
        tenant_code: Option<&str>,
        user_id: i64,
    ) -> Result<Option<String>, StoreError>;
}
