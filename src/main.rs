use fresnel_ar::{config::SceneConfig, FresnelArApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SceneConfig::from_env();
    log::info!(
        "Starting with model {} ({:?} camera)",
        config.model_path.display(),
        config.facing
    );
    FresnelArApp::new(config)?.run()
}
