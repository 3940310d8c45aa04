//! Public URL resolution for resources.

use std::sync::Arc;

use offload_core::result::AppResult;
use offload_core::traits::settings::SettingsProvider;
use offload_core::types::id::{ResourceId, TenantId};
use offload_database::store::ResourceStore;

/// Maps a resource to the URL it should be served from
#[derive(Debug, Clone)]
pub struct UrlResolver {
    resources: Arc<dyn ResourceStore>,
    settings: Arc<dyn SettingsProvider>,
}

impl UrlResolver {
    /// Create a new resolver
    pub fn new(resources: Arc<dyn ResourceStore>, settings: Arc<dyn SettingsProvider>) -> Self {
        Self {
            resources,
            settings,
        }
    }

    /// The resource's CDN URL once offloaded, otherwise `local_url`.
    pub async fn resolve_url(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        local_url: &str,
    ) -> AppResult<String> {
        let record = self.resources.find(tenant_id, resource_id).await?;
        let cdn_url = record
            .filter(|r| r.is_offloaded())
            .and_then(|r| r.cdn_url);

        Ok(match cdn_url {
            Some(url) => self.settings.snapshot().normalize_scheme(&url),
            None => local_url.to_string(),
        })
    }
}
