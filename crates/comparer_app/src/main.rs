use comparer_app::AppConfig;
use log::LevelFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    comparer_logging::initialize(config.log_destination, LevelFilter::Info);
    comparer_app::run(config).await
}
