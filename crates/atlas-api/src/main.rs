use atlas_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    atlas_api::telemetry::init();

    let (state, router) = atlas_api::setup::initialize_app(config).await?;
    atlas_api::setup::server::serve(state, router).await?;

    Ok(())
}
