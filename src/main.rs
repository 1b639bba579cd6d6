use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;

use dropout_risk::api;
use dropout_risk::config::Config;
use dropout_risk::{ArtifactResolver, ModelBundle};

async fn start_api(bundle: ModelBundle, config: &Config) -> std::io::Result<()> {
    let bundle_data = web::Data::new(bundle);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(bundle_data.clone())
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!("Loading model artifacts from {}", config.artifact_dir.display());

    let bundle = ArtifactResolver::new(config.artifact_paths())
        .resolve_blocking()
        .await;
    if !bundle.is_ready() {
        log::warn!(
            "Serving without a model ({}); predictions will answer 503",
            bundle.status()
        );
    }
    if let Some(metrics) = bundle.performance_metrics() {
        if let (Some(accuracy), Some(f1)) = (metrics.accuracy(), metrics.f1_score()) {
            log::info!("Model accuracy {:.1}%, F1-score {:.3}", accuracy * 100.0, f1);
        }
    }

    log::info!("Starting Dropout Risk API on http://{}:{}", config.host, config.port);
    start_api(bundle, &config)
        .await
        .with_context(|| format!("server on {}:{} failed", config.host, config.port))?;

    Ok(())
}
