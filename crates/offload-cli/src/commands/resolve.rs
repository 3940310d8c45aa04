//! URL resolution command.

use clap::Args;
use serde::Serialize;

use offload_core::config::AppConfig;
use offload_core::error::AppError;
use offload_core::types::id::{ResourceId, TenantId};

use super::Context;
use crate::output::{self, OutputFormat, Tone};

/// Arguments for the resolve command
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Owning tenant
    #[arg(short, long)]
    pub tenant: TenantId,
    /// Resource to resolve
    #[arg(short, long)]
    pub resource: ResourceId,
    /// URL served when the resource is not on the CDN
    #[arg(long, default_value = "")]
    pub local_url: String,
}

#[derive(Debug, Serialize)]
struct Resolved<'a> {
    tenant_id: TenantId,
    resource_id: ResourceId,
    url: &'a str,
}

/// Execute the resolve command
pub async fn execute(
    args: &ResolveArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = Context::connect(config).await?;
    let url = ctx
        .resolver()
        .resolve_url(args.tenant, args.resource, &args.local_url)
        .await?;

    let resolved = Resolved {
        tenant_id: args.tenant,
        resource_id: args.resource,
        url: &url,
    };
    output::emit(&resolved, format, |r| {
        if r.url.is_empty() {
            output::notice(
                Tone::Attention,
                "Resource is not offloaded and no local URL was given.",
            );
        } else {
            println!("{}", r.url);
        }
    })?;

    ctx.db.close().await;
    Ok(())
}
