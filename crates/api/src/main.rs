use edgeguard_api::AppConfig;
use edgeguard_observability::LogFormat;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            edgeguard_observability::init(LogFormat::Json);
            tracing::error!(kind = %err.kind(), trace = %err.trace(), "invalid configuration: {}", err.message());
            std::process::exit(1);
        }
    };

    edgeguard_observability::init(config.environment.log_format());

    let app = match edgeguard_api::app::build_app(&config) {
        Ok(app) => app,
        Err(err) => {
            tracing::error!(kind = %err.kind(), "failed to build application: {}", err.message());
            std::process::exit(1);
        }
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    tracing::info!(
        environment = config.environment.as_str(),
        "listening on {}",
        config.bind_addr
    );

    axum::serve(listener, app).await.expect("server error");
}
