use audit_trail_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, utils, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    utils::logging::init(config.log_format);

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);
    info!(
        fail_closed = config.audit_fail_closed,
        excluded = ?config.audit_excluded_entities,
        "audit trail enabled"
    );

    let app = routes::router(app_state, &config.jwt_secret)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
