use std::path::PathBuf;

#[derive(Debug, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoggingConfig {
    /// Whether to install a subscriber at all.
    pub enable: bool,

    /// Whether to color output on stderr.
    pub ansi: bool,

    /// Filter directives used when `RUST_LOG` is not set.
    pub filter: String,

    /// If set, logs are also written to daily rotated files in this directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable: true,
            ansi: true,
            filter: String::from("steam_openid=info,steam_openid_server=info,warn"),
            log_dir: None,
        }
    }
}
