use graphd::config::Config;
use graphd::device::BlockDevice;
use graphd::durability::recovery::StartupMode;
use graphd::http;
use graphd::store::Store;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let device = match BlockDevice::open(&config.devfile, config.startup_mode == StartupMode::Format) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, path = %config.devfile.display(), "failed to open device");
            std::process::exit(1);
        }
    };

    let store = match Store::open(device, config.startup_mode) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "recovery failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = http::serve(config.port, store).await {
        tracing::error!(error = %e, "server exited");
        std::process::exit(1);
    }
}
