use color_census_web::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Address, image directory and naming timeout from env or defaults
    let config = ServerConfig::from_env();
    start_server(config).await
}
