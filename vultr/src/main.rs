use tfplug::Provider;
use tracing_subscriber::EnvFilter;
use vultr::VultrProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_env("TF_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let provider = VultrProvider::new();

    let mut resources: Vec<String> = provider.resource_schemas().into_keys().collect();
    resources.sort();
    let mut data_sources: Vec<String> = provider.data_source_schemas().into_keys().collect();
    data_sources.sort();

    tracing::info!(
        "{} provider with {} resources and {} data sources",
        provider.type_name(),
        resources.len(),
        data_sources.len()
    );
    for name in &resources {
        println!("resource    {}", name);
    }
    for name in &data_sources {
        println!("data source {}", name);
    }

    Ok(())
}
