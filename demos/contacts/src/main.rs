//! Contact-list demo.
//!
//! Serves one page whose client-side state ships inside the HTML: the
//! handler declares what the `contacts` and `settings` containers should
//! fetch, and the payload lands in `window.bootstrapData` before the page
//! script runs. Run with `cargo run -p contacts-demo` and open
//! http://127.0.0.1:3000/.

mod render;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use preload_axum::{
    BootstrapConfig, BootstrapError, BootstrapRenderer, CarrierLayer, PayloadFormat,
    RequestCarrier,
};
use preload_core::{
    Carrier, CollectionContainer, DocumentSource, MemorySource, Record, StaticMapContainer,
};

use render::JinjaBackend;

struct AppState {
    renderer: BootstrapRenderer<JinjaBackend>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let contacts: Vec<Record> = serde_json::from_str(include_str!("../contacts.json"))?;
    let source: Arc<dyn DocumentSource> = Arc::new(MemorySource::new(contacts));

    let settings = match json!({
        "appName": "Contacts",
        "supportEmail": "support@example.com",
        "internalFlag": "not requested by the page"
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };

    let config = BootstrapConfig {
        format: PayloadFormat::ScriptTag,
        resolve_deadline: Some(Duration::from_secs(5)),
        ..BootstrapConfig::default()
    };
    let state = Arc::new(AppState {
        renderer: BootstrapRenderer::with_config(JinjaBackend::new()?, config),
    });

    let app = Router::new()
        .route("/", get(index))
        .layer(CarrierLayer::new(move || {
            Carrier::builder()
                .container("contacts", CollectionContainer::new(Arc::clone(&source)))
                .container("settings", StaticMapContainer::new(settings.clone()))
                .build()
        }))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index(
    State(state): State<Arc<AppState>>,
    carrier: RequestCarrier,
) -> Result<Html<String>, BootstrapError> {
    carrier
        .add(json!({
            "contacts": {
                "fields": ["firstName", "lastName"],
                "sort": [["lastName", "asc"]],
                "limit": 5
            },
            "settings": ["appName", "supportEmail"],
            "generatedBy": "contacts-demo"
        }))
        .await?;

    let html = state
        .renderer
        .render(&carrier, "index.html", Map::new())
        .await?;

    Ok(Html(html))
}
