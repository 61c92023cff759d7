// Main entry point for the rembg-server application.
// Sets up the Tokio runtime, loads the model session, configures the Axum
// router, and starts the HTTP server.

use clap::Parser;
use std::{path::PathBuf, sync::Arc};

use rembg_server::{
    remover::{OnnxRemover, SharedRemover},
    shutdown_signal::shutdown_signal,
    web,
};

/// Command line arguments for rembg-server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct AppConfig {
    /// Hostname/IP to bind the server to.
    /// If this option is specified without value, it will default to "*", meaning the server will listen on all interfaces.
    #[arg(long, env = "REMBG_SERVER_HOST", default_value = "localhost", num_args = 0..=1, default_missing_value = "*")]
    host: String,

    /// Port number to listen on.
    #[arg(short, long, env = "REMBG_SERVER_PORT", default_value_t = 9000)]
    port: u16,

    /// Path to the pretrained segmentation model (ONNX format).
    #[arg(
        long,
        env = "REMBG_SERVER_MODEL_PATH",
        default_value = "models/isnet-general-use.onnx"
    )]
    model_path: PathBuf,
}

#[tokio::main]
async fn main() {
    // Parse command line args and environment variables
    let config = AppConfig::parse();

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting rembg-server...");
    tracing::info!("Model path set to: {}", config.model_path.display());

    // --- Load the model session ---
    // Created exactly once; every request handler shares this handle.
    let session: SharedRemover = match OnnxRemover::load(&config.model_path) {
        Ok(session) => Arc::new(session),
        Err(err) => {
            tracing::error!(
                "FATAL: Failed to load model session: {}. Server cannot operate without a model.",
                err
            );
            eprintln!("FATAL: Model initialization failed. See logs for details. Exiting.");
            std::process::exit(1);
        }
    };
    tracing::info!("Model session initialized and warmed up.");

    // --- Build Axum Application Router ---
    let app = web::create_app(session);
    tracing::info!("Axum router configured.");

    // --- Start HTTP Server ---
    let listener = match web::create_listener(&config.host, config.port).await {
        Ok((addr, l)) => {
            tracing::info!("Server successfully bound. Listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("FATAL: Failed to bind server: {}", e);
            eprintln!("FATAL: Could not bind server. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    // Run the server.
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server run error: {}", e);
        eprintln!("ERROR: Server shut down unexpectedly. Error: {}", e);
    }

    tracing::info!("rembg-server has shut down.");
}
