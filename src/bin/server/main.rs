use devices::config::Config;
use devices::domain::device::service::Service;
use devices::inbound::http::{HttpServer, HttpServerConfig};
use devices::outbound::sqlite::Sqlite;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let sqlite = Sqlite::new(&config.database_url).await?;
    let device_service = Service::new(sqlite);

    let server_config = HttpServerConfig {
        port: &config.server_port,
    };

    let http_server = HttpServer::new(device_service, server_config).await?;

    http_server.run().await
}
