use clap::Args;
use fireprox_gateway::{GatewayBackend, ProxyManager};

use super::{print_proxies, print_proxy};
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Origin URL every request is forwarded to.
    #[arg(long)]
    pub url: String,

    /// Owner tag to attach to the new proxy.
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show proxies whose owner matches this pattern.
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[arg(long)]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(long)]
    pub id: String,

    /// New origin URL.
    #[arg(long)]
    pub url: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(long)]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct TagArgs {
    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub owner: String,
}

pub async fn create<B: GatewayBackend>(
    manager: &ProxyManager<B>,
    args: &CreateArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let proxy = manager.create(&args.url, args.owner.as_deref()).await?;
    print_proxy(&proxy, format)
}

pub async fn list<B: GatewayBackend>(
    manager: &ProxyManager<B>,
    args: &ListArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let proxies = manager.list(args.owner.as_deref()).await?;
    print_proxies(&proxies, format)
}

pub async fn get<B: GatewayBackend>(
    manager: &ProxyManager<B>,
    args: &GetArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let proxy = manager.get(&args.id).await?;
    print_proxy(&proxy, format)
}

pub async fn update<B: GatewayBackend>(
    manager: &ProxyManager<B>,
    args: &UpdateArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let proxy = manager.update(&args.id, &args.url).await?;
    print_proxy(&proxy, format)
}

pub async fn delete<B: GatewayBackend>(
    manager: &ProxyManager<B>,
    args: &DeleteArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let proxy = manager.delete(&args.id).await?;
    print_proxy(&proxy, format)
}

pub async fn tag<B: GatewayBackend>(
    manager: &ProxyManager<B>,
    args: &TagArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    manager.tag(&args.id, &args.owner).await?;
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({ "id": args.id, "owner": args.owner });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => println!("Tagged {} with owner={}", args.id, args.owner),
    }
    Ok(())
}
