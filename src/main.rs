use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use genrelay::config::Config;
use genrelay::models::*;
use genrelay::routes;
use genrelay::services::{HttpDispatcher, JobService, JobStore, UuidV4Ids};

/// Limite dimensione corpo delle richieste (submit e callback)
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Genrelay API",
        version = "1.0.0",
        description = "Gateway per job di generazione asincroni eseguiti da processori esterni",
        license(name = "MIT"),
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::jobs::submit_job,
        crate::routes::jobs::job_callback,
        crate::routes::jobs::get_job_status,
        crate::routes::jobs::job_state_stream,
    ),
    components(schemas(
        HealthResponse,
        JobCreatedResponse,
        ErrorResponse,
        JobRecord,
        JobState,
    )),
    tags(
        (name = "Jobs", description = "Submit, callback e stato dei job"),
        (name = "Sistema", description = "Health check e info"),
    ),
    servers(
        (url = "http://localhost:4000", description = "Server locale"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Carica variabili da .env
    dotenvy::dotenv().ok();

    // Inizializza logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genrelay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Carica configurazione
    let config = Config::from_env();

    if config.workflows.is_empty() {
        tracing::warn!("Nessun workflow configurato (imposta GENRELAY_WORKFLOWS): ogni submit verrà rifiutato");
    }

    let dispatcher =
        match HttpDispatcher::new(Duration::from_secs(config.dispatch_timeout_secs)) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        };

    // Tabella job condivisa, creata una sola volta
    let store = JobStore::shared();
    let service = JobService::new(
        store.clone(),
        Arc::new(dispatcher),
        Arc::new(UuidV4Ids),
        config.workflows.clone(),
        config.public_url.clone(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(routes::create_router(service))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Indirizzo non valido {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    tracing::info!("========================================");
    tracing::info!("  Genrelay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("========================================");
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Callback base: {}", config.public_url);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    tracing::info!("----------------------------------------");
    tracing::info!("  POST /generate                - Crea job");
    tracing::info!("  POST /callback/:job_id        - Esito dal processore");
    tracing::info!("  GET  /status/:job_id          - Stato job");
    tracing::info!("  GET  /status/:job_id/stream   - SSE stato job");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("----------------------------------------");
    for name in config.workflows.names() {
        if let Some(endpoint) = config.workflows.resolve(&name) {
            tracing::info!("Workflow {} -> {}", name, endpoint);
        }
    }

    // Task background per rimozione job terminati (solo se configurata)
    if let Some(retention) = config.retention() {
        let interval = Duration::from_secs(config.cleanup_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let evicted = store.evict_older_than(retention).await;
                if evicted > 0 {
                    tracing::info!("Cleanup completato: {} job rimossi", evicted);
                }
            }
        });
    }

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Impossibile aprire {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Errore server: {}", e);
    }
}
