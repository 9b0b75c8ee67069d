use std::error::Error;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use greenwave::app::config::AppConfig;
use greenwave::app::App;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("greenwave=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_file(Path::new(&path))?,
        None => AppConfig::default(),
    };

    let mut app = App::start(config)?;

    let stop = app.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop requested, finishing the current cycle");
            stop.cancel();
        }
    });

    app.run().await?;
    Ok(())
}
