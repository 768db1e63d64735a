//! CLI argument handling.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use url::Url;

pub fn args() -> Args {
    Args::parse()
}

#[derive(Debug, Parser)]
pub struct Args {
    /// The IP address the HTTP server will listen on.
    ///
    /// This takes precedence over the value in the configuration file.
    #[arg(long = "ip")]
    pub ip_addr: Option<IpAddr>,

    /// The port the HTTP server will listen on.
    ///
    /// This takes precedence over the value in the configuration file.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the configuration file.
    ///
    /// Will default to `./steam-openid.toml` if unspecified.
    /// If that file does not exist, default configuration values will be used.
    #[arg(short, long = "config")]
    pub config_path: Option<PathBuf>,

    /// The URL Steam should redirect users back to.
    #[arg(long)]
    pub return_url: Option<Url>,

    /// Steam Web API key; enables fetching profiles.
    #[arg(long, env = "STEAM_WEB_API_KEY", hide_env_values = true)]
    pub web_api_key: Option<String>,

    /// Maximum age of a response nonce, in seconds.
    #[arg(long)]
    pub max_nonce_age: Option<u64>,
}

impl Args {
    /// Applies any overrides specified as CLI flags to the given config.
    pub fn apply_to_config(&self, config: &mut steam_openid_server::Config) {
        if let Some(ip_addr) = self.ip_addr {
            config.listen_addr.set_ip(ip_addr);
        }

        if let Some(port) = self.port {
            config.listen_addr.set_port(port);
        }

        if let Some(ref return_url) = self.return_url {
            config.steam_openid.return_url = return_url.clone();
        }

        if let Some(ref web_api_key) = self.web_api_key {
            config.steam_openid.fetch_profile = true;
            config.steam_openid.web_api_key = Some(web_api_key.clone());
        }

        if let Some(secs) = self.max_nonce_age {
            config.steam_openid.max_nonce_age = Some(std::time::Duration::from_secs(secs));
        }
    }
}
