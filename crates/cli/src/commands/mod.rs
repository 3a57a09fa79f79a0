pub mod delete_all;
pub mod proxies;
pub mod whoami;

use fireprox_core::ProxyResource;

use crate::OutputFormat;

pub fn print_proxy(proxy: &ProxyResource, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(proxy)?),
        OutputFormat::Text => println!("{proxy}"),
    }
    Ok(())
}

pub fn print_proxies(proxies: &[ProxyResource], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(proxies)?),
        OutputFormat::Text => {
            if proxies.is_empty() {
                println!("No proxies found.");
            }
            for proxy in proxies {
                println!("{proxy}");
            }
        }
    }
    Ok(())
}
