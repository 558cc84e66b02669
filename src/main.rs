use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;
mod router;

mod crypto {
    pub mod session_token;
    pub mod token;
}

mod models {
    pub mod recipe;
    pub mod session;
    pub mod user;
}

mod repositories {
    pub mod recipe;
    pub mod session;
    pub mod user;
}

mod services {
    pub mod auth;
    pub mod identity;
    pub mod recipes;
}

mod handlers {
    pub mod auth;
    pub mod recipes;
}

mod middleware_layer {
    pub mod auth;
}

mod validation {
    pub mod payload;
}

#[cfg(test)]
mod testing;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // `recipes-api hash-password <password>` prints a digest for the users table.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, password] = args.as_slice() {
        if command == "hash-password" {
            println!("{}", services::auth::hash_password(password)?);
            return Ok(());
        }
    }
    if !args.is_empty() {
        anyhow::bail!("usage: recipes-api [hash-password <password>]");
    }

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!(
        "✅ Configuration loaded successfully (auth mechanism: {})",
        config.auth.name()
    );

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    let app = router::build_router(state);

    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
