/**
 * Entry point for the `avatar_video_lambda` function.
 *
 * Accepts a script and an avatar id over HTTP, then fetches the avatar,
 * synthesizes speech, runs the lip-sync model and publishes the result.
 */
use avatar_video_lambda::{AppContext, config::Config, router};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app_context =
        ta_app::create_app_context::<AppContext, Config>().await?;

    let app = router(Arc::new(app_context));

    ta_axum::run_app(app).await
}
