mod db;
mod routes;
mod services;
mod state;

use services::auth::OAuthProviders;
use services::credentials::bcrypt_cost;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    // Providers without complete configuration are simply not offered.
    let oauth = OAuthProviders::from_env();
    for (name, config) in [("github", &oauth.github), ("google", &oauth.google)] {
        if config.is_some() {
            tracing::info!(provider = name, "oauth provider enabled");
        } else {
            tracing::warn!(provider = name, "oauth provider not configured");
        }
    }

    let state = state::AppState::new(pool, oauth, bcrypt_cost());

    let app = match routes::leptos_app(state.clone()) {
        Ok(app) => app,
        Err(e) => {
            tracing::warn!(error = %e, "leptos ssr disabled, serving API only");
            routes::app(state)
        }
    };

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "messenger listening");
    axum::serve(listener, app).await.expect("server failed");
}
