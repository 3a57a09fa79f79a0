use clap::Args;
use fireprox_gateway::{BulkDeleteOptions, GatewayBackend, ProxyManager};

use super::print_proxies;
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct DeleteAllArgs {
    /// Allow bulk deletion at all. Without it the command always fails.
    #[arg(long)]
    pub enable_bulk_delete: bool,

    /// Confirm deletion of every proxy in the region.
    #[arg(long, conflicts_with = "dry_run")]
    pub yes: bool,

    /// List what would be deleted without deleting anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl DeleteAllArgs {
    fn options(&self) -> BulkDeleteOptions {
        BulkDeleteOptions {
            confirm: self.yes,
            dry_run: self.dry_run,
        }
    }
}

pub async fn run<B: GatewayBackend>(
    manager: &ProxyManager<B>,
    args: &DeleteAllArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let proxies = manager.delete_all(args.options()).await?;
    if matches!(format, OutputFormat::Text) {
        let verb = if args.dry_run { "Would delete" } else { "Deleted" };
        println!("{verb} {} proxies in {}", proxies.len(), manager.region());
    }
    print_proxies(&proxies, format)
}
