pub mod execution_id;

use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

/// Wrap a router with the layers every service shares: a JSON 404
/// fallback, request tracing and gzip/deflate compression.
pub fn with_default_layers(app: Router) -> Router {
    // Set up a trace layer
    let trace_layer = TraceLayer::new_for_http().on_request(
        |request: &Request<Body>, _: &tracing::Span| {
            tracing::info!(
                "received request: {method} {uri}",
                method = request.method(),
                uri = request.uri()
            );
        },
    );

    let compression_layer = CompressionLayer::new().gzip(true).deflate(true);

    app.fallback(|| async {
        (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            Json(json!({
                "message": "not found",
            })),
        )
    })
    .layer(trace_layer)
    .layer(compression_layer)
}

/// Runs an Axum router in either local development mode or Lambda runtime mode.
///
/// In debug builds (`#[cfg(debug_assertions)]`), the router is served on
/// `127.0.0.1:3030` using a standard Axum server.
///
/// In release builds, the router is wrapped with the Lambda runtime adapter
/// and executed as a Lambda function.
///
/// # Errors
///
/// Returns an error if:
/// - The local server fails to bind to the port (debug mode)
/// - The Lambda runtime fails to start (release mode)
pub async fn run_app(app: Router) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(debug_assertions)]
    {
        let addr = std::net::SocketAddr::from(([127, 0, 0, 1], 3030));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Starting local development server on http://{addr}");
        axum::serve(listener, app).await?;
    }

    #[cfg(not(debug_assertions))]
    {
        use lambda_http::tower;

        let app = tower::ServiceBuilder::new()
            .layer(axum_aws_lambda::LambdaLayer::default().trim_stage())
            .service(app);

        lambda_http::run(app).await?;
    }

    Ok(())
}
