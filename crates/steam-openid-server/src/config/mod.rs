use std::net::{Ipv4Addr, SocketAddr};

use url::Url;

mod http_client;
pub use http_client::HttpClientConfig;

mod logging;
pub use logging::LoggingConfig;

#[derive(Debug, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// The address the HTTP server listens on.
    pub listen_addr: SocketAddr,

    /// The HTTP client used to talk to Steam.
    pub http_client: HttpClientConfig,

    pub logging: LoggingConfig,

    pub steam_openid: steam_openid::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            http_client: HttpClientConfig::default(),
            logging: LoggingConfig::default(),
            steam_openid: steam_openid::Config::new(
                Url::parse("http://localhost:3000/auth/steam")
                    .expect("hard-coded URL should be valid"),
            ),
        }
    }
}
