use std::fs;
use std::path::Path;

use anyhow::Context;

mod cli;

const DEFAULT_CONFIG_PATH: &str = "./steam-openid.toml";

fn main() -> anyhow::Result<()> {
    let cli_args = cli::args();
    let mut config = match cli_args.config_path.as_deref() {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_config(Path::new(DEFAULT_CONFIG_PATH))?
        },
        None => steam_openid_server::Config::default(),
    };

    cli_args.apply_to_config(&mut config);

    let _guard = if config.logging.enable {
        steam_openid_server::logging::init(&config.logging)
            .context("failed to initialize logging")?
    } else {
        None
    };

    steam_openid_server::run(config).context("failed to run server")
}

fn load_config(path: &Path) -> anyhow::Result<steam_openid_server::Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file `{}`", path.display()))?;

    toml::from_str(&text)
        .with_context(|| format!("failed to parse configuration file `{}`", path.display()))
}
