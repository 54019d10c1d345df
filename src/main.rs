use anyhow::Context;

use haunted_house::{config::SceneConfig, HauntedApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SceneConfig::load().context("failed to load configuration")?;
    let app = HauntedApp::new(config).context("failed to set up the scene")?;
    app.run().context("renderer stopped with an error")?;

    log::info!("Goodbye");
    Ok(())
}
