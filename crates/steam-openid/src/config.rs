/* Copyright (C) 2024  AlphaKeks <alphakeks@dawn.sh>
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this repository.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use url::Url;

/// Configuration for [`SteamOpenId`].
///
/// [`SteamOpenId`]: crate::SteamOpenId
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// The URL Steam should redirect users back to after they logged in.
    ///
    /// Callbacks whose `openid.return_to` is not exactly this URL are rejected.
    #[debug("{:?}", return_url.as_str())]
    pub return_url: Url,

    /// Whether to fetch the user's profile after they have been verified.
    #[serde(default)]
    pub fetch_profile: bool,

    /// Steam Web API key, required if `fetch_profile` is set.
    #[debug("{}", if web_api_key.is_some() { "Some(*****)" } else { "None" })]
    #[serde(default)]
    pub web_api_key: Option<String>,

    /// How old a response nonce may be, in seconds.
    #[serde(default, deserialize_with = "deserialize_max_nonce_age")]
    pub max_nonce_age: Option<Duration>,
}

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("`web-api-key` is required when `fetch-profile` is enabled")]
    MissingWebApiKey,
}

impl Config {
    /// Creates a new [`Config`] that only resolves SteamIDs and never expires nonces.
    pub fn new(return_url: Url) -> Self {
        Self { return_url, fetch_profile: false, web_api_key: None, max_nonce_age: None }
    }

    /// Enables fetching profiles using the given Web API key.
    pub fn fetch_profile(self, web_api_key: impl Into<String>) -> Self {
        Self { fetch_profile: true, web_api_key: Some(web_api_key.into()), ..self }
    }

    pub fn max_nonce_age(self, max_nonce_age: Duration) -> Self {
        Self { max_nonce_age: Some(max_nonce_age), ..self }
    }
}

fn deserialize_max_nonce_age<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u64>::deserialize(deserializer).map(|secs| secs.map(Duration::from_secs))
}
