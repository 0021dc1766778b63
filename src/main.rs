use tracing_subscriber::EnvFilter;

mod config;
mod decoder;
mod engine;
mod error;
mod events;
mod focus;
mod library;
mod metadata;
mod mpris;
mod playlist;
mod runtime;
mod store;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("encore=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    runtime::run()
}
