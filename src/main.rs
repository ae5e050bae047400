use rustfmseq::runtime::native;
use rustfmseq::EngineConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Optional first argument: path to a JSON config file.
    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => {
                info!("loaded config from {}", path);
                config
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    if let Err(e) = native::start(config) {
        error!("{}", e);
        std::process::exit(1);
    }
}
