use stagehand::{config::DEFAULT_CONFIG_PATH, EditorApp, EditorConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("stagehand=info"))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = EditorConfig::load_or_default(&config_path);

    EditorApp::new(config)?.run()?;
    Ok(())
}
