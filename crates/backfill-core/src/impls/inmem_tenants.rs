//! In-memory tenant store.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use crate::ports::{StoreError, TenantStore};

#[derive(Default)]
struct TenantState {
    tenants: HashSet<String>,
    user_tenant: HashMap<i64, String>,
}

#[derive(Default)]
pub struct InMemoryTenants {
    state: Mutex<TenantState>,
}

impl InMemoryTenants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tenant(&self, code: impl Into<String>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.tenants.insert(code.into());
    }

    /// Register `tenant` (if needed) and make it the tenant of `user_id`.
    pub fn assign_user(&self, user_id: i64, tenant: impl Into<String>) {
        let tenant = tenant.into();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.tenants.insert(tenant.clone());
        state.user_tenant.insert(user_id, tenant);
    }
}

impl TenantStore for InMemoryTenants {
    fn resolve_tenant(
        &self,
        tenant_code: Option<&str>,
        user_id: i64,
    ) -> Result<Option<String>, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Poisoned("tenants"))?;
        Ok(match tenant_code {
            Some(code) => state.tenants.contains(code).then(|| code.to_string()),
            None => state.user_tenant.get(&user_id).cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_tenant_must_exist() {
        let tenants = InMemoryTenants::new();
        tenants.add_tenant("etl");
        assert_eq!(tenants.resolve_tenant(Some("etl"), 1).unwrap().as_deref(), Some("etl"));
        assert_eq!(tenants.resolve_tenant(Some("nope"), 1).unwrap(), None);
    }

    #[test]
    fn owner_tenant_is_the_fallback() {
        let tenants = InMemoryTenants::new();
        tenants.assign_user(5, "bi");
        assert_eq!(tenants.resolve_tenant(None, 5).unwrap().as_deref(), Some("bi"));
        assert_eq!(tenants.resolve_tenant(None, 6).unwrap(), None);
    }
}
