use fireprox_gateway::{GatewayBackend, ProxyManager};

use crate::OutputFormat;

pub async fn run<B: GatewayBackend>(
    manager: &ProxyManager<B>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let account = manager.account_id().await?;
    let temporary = manager.test_auth().await?;
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "account": account,
                "region": manager.region(),
                "temporary_session": temporary,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            println!("Account:           {account}");
            println!("Region:            {}", manager.region());
            println!("Temporary session: {temporary}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use fireprox_gateway::{CallerIdentity, MemoryGateway};

    use super::*;

    #[tokio::test]
    async fn reports_identity() {
        let backend = MemoryGateway::new("us-east-1").with_identity(CallerIdentity {
            account: "210987654321".into(),
            arn: "arn:aws:sts::210987654321:assumed-role/r/botocore-session-1".into(),
            user_id: "AROAEXAMPLE".into(),
        });
        let manager = ProxyManager::new(backend);
        run(&manager, &OutputFormat::Json).await.unwrap();
        run(&manager, &OutputFormat::Text).await.unwrap();
    }
}
