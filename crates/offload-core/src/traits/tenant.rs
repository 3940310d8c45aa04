//! Tenant context switching.
//!
//! In a multi-site host, work for a job must run "as" the job's site. The
//! host implements [`TenantContext`]; the processor only ever switches
//! through [`TenantScope`], which restores the previous tenant when dropped,
//! including on early return and on error.

use std::fmt;

use crate::types::id::TenantId;

/// Host-side ability to act on behalf of a tenant.
pub trait TenantContext: Send + Sync + fmt::Debug + 'static {
    /// Make `tenant` the active tenant.
    fn switch_to(&self, tenant: TenantId);

    /// Return to the tenant that was active before the last `switch_to`.
    fn restore(&self);
}

/// Single-tenant hosts have nothing to switch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTenantContext;

impl TenantContext for NoopTenantContext {
    fn switch_to(&self, _tenant: TenantId) {}

    fn restore(&self) {}
}

/// Guard that keeps a tenant active for its lifetime.
#[must_use = "the tenant is restored as soon as the scope is dropped"]
pub struct TenantScope<'a> {
    context: &'a dyn TenantContext,
    tenant: TenantId,
}

impl<'a> TenantScope<'a> {
    /// Switch to `tenant` until the returned guard is dropped.
    pub fn enter(context: &'a dyn TenantContext, tenant: TenantId) -> Self {
        context.switch_to(tenant);
        tracing::trace!(tenant_id = %tenant, "Entered tenant scope");
        Self { context, tenant }
    }

    /// The tenant this scope activated.
    pub fn tenant(&self) -> TenantId {
        self.tenant
    }
}

impl Drop for TenantScope<'_> {
    fn drop(&mut self) {
        self.context.restore();
        tracing::trace!(tenant_id = %self.tenant, "Left tenant scope");
    }
}

impl fmt::Debug for TenantScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantScope")
            .field("tenant", &self.tenant)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    struct StackContext {
        stack: Mutex<Vec<TenantId>>,
    }

    impl TenantContext for StackContext {
        fn switch_to(&self, tenant: TenantId) {
            self.stack.lock().unwrap().push(tenant);
        }

        fn restore(&self) {
            self.stack.lock().unwrap().pop();
        }
    }

    fn work(ctx: &StackContext, fail: bool) -> Result<(), &'static str> {
        let _scope = TenantScope::enter(ctx, TenantId(9));
        assert_eq!(ctx.stack.lock().unwrap().last(), Some(&TenantId(9)));
        if fail {
            return Err("boom");
        }
        Ok(())
    }

    #[test]
    fn test_scope_restores_on_success_and_error() {
        let ctx = StackContext::default();
        assert!(work(&ctx, false).is_ok());
        assert!(ctx.stack.lock().unwrap().is_empty());

        assert!(work(&ctx, true).is_err());
        assert!(ctx.stack.lock().unwrap().is_empty());
    }
}
