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

//! Fetching public profile information from Steam's Web API.

use bytes::Bytes;
use http_body::Body as HttpBody;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tower_service::Service;
use url::Url;

use crate::transport::{self, TransportError};
use crate::{BoxError, PLAYER_SUMMARY_URL, SteamId};

/// A user's public Steam profile, as returned by `GetPlayerSummaries`.
///
/// Steam omits most fields for private profiles, so everything except the SteamID is optional.
/// Attributes without a dedicated field end up in [`Profile::extra`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    #[serde(rename = "steamid")]
    pub steam_id: SteamId,

    #[serde(rename = "personaname", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "realname", default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,

    /// 1 = private, 3 = public.
    #[serde(rename = "communityvisibilitystate", default, skip_serializing_if = "Option::is_none")]
    pub visibility_state: Option<u8>,

    /// Whether the user has set up their community profile.
    #[serde(rename = "profilestate", default, skip_serializing_if = "Option::is_none")]
    pub profile_state: Option<u8>,

    #[serde(rename = "commentpermission", default, skip_serializing_if = "Option::is_none")]
    pub comment_permission: Option<u8>,

    /// 0 = offline, 1 = online, 2 = busy, …
    #[serde(rename = "personastate", default, skip_serializing_if = "Option::is_none")]
    pub persona_state: Option<u8>,

    #[serde(rename = "personastateflags", default, skip_serializing_if = "Option::is_none")]
    pub persona_state_flags: Option<u32>,

    #[debug("{:?}", profile_url.as_ref().map(Url::as_str))]
    #[serde(rename = "profileurl", default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<Url>,

    #[debug("{:?}", avatar_url.as_ref().map(Url::as_str))]
    #[serde(rename = "avatar", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Url>,

    #[debug("{:?}", avatar_medium_url.as_ref().map(Url::as_str))]
    #[serde(rename = "avatarmedium", default, skip_serializing_if = "Option::is_none")]
    pub avatar_medium_url: Option<Url>,

    #[debug("{:?}", avatar_full_url.as_ref().map(Url::as_str))]
    #[serde(rename = "avatarfull", default, skip_serializing_if = "Option::is_none")]
    pub avatar_full_url: Option<Url>,

    #[serde(rename = "avatarhash", default, skip_serializing_if = "Option::is_none")]
    pub avatar_hash: Option<String>,

    #[serde(rename = "primaryclanid", default, skip_serializing_if = "Option::is_none")]
    pub primary_clan_id: Option<String>,

    #[serde(rename = "loccountrycode", default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    #[serde(rename = "locstatecode", default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,

    #[serde(
        rename = "timecreated",
        default,
        with = "time::serde::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,

    #[serde(
        rename = "lastlogoff",
        default,
        with = "time::serde::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_logoff: Option<OffsetDateTime>,

    /// Everything else Steam sent along, e.g. `gameid` while the user is in-game.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Display, Error)]
pub enum ProfileError {
    #[display("{_0}")]
    Transport(TransportError),

    #[display("Steam returned a bad status ({status})")]
    BadStatus {
        #[error(ignore)]
        status: http::StatusCode,
    },

    /// Steam's response did not contain a list of players, or a player we could not make sense
    /// of.
    #[display("malformed response from Steam: {_0}")]
    MalformedResponse(serde_json::Error),

    /// Steam does not know about the user.
    #[display("profile for {steam_id} was not found")]
    NotFound {
        #[error(ignore)]
        steam_id: SteamId,
    },

    /// Steam returned someone else's profile.
    ///
    /// `received` is kept verbatim, since it need not be a valid [`SteamId`].
    #[display("requested profile for {requested} but received `{received}`")]
    SteamIdMismatch {
        #[error(ignore)]
        requested: SteamId,

        #[error(ignore)]
        received: String,
    },
}

/// Fetches `steam_id`'s profile.
///
/// The returned player's id is compared against `steam_id` before anything else about it is
/// looked at.
#[tracing::instrument(skip(http_client, web_api_key), err(level = "debug"))]
pub async fn fetch_profile<S, ResponseBody>(
    mut http_client: S,
    web_api_key: &str,
    steam_id: SteamId,
) -> Result<Profile, ProfileError>
where
    S: Service<http::Request<Bytes>, Response = http::Response<ResponseBody>>,
    S::Error: Into<BoxError>,
    ResponseBody: HttpBody<Error: Into<BoxError>>,
{
    #[derive(serde::Serialize)]
    struct Query<'a> {
        #[serde(rename = "steamids")]
        steam_id: SteamId,

        #[serde(rename = "key")]
        web_api_key: &'a str,
    }

    #[derive(serde::Deserialize)]
    struct ApiResponse {
        response: PlayerList,
    }

    #[derive(serde::Deserialize)]
    struct PlayerList {
        players: Vec<Value>,
    }

    let query = serde_urlencoded::to_string(Query { steam_id, web_api_key })
        .expect("query parameters should always serialize");

    let request = http::Request::get(format!("{PLAYER_SUMMARY_URL}?{query}"))
        .body(Bytes::new())
        .expect("hard-coded URL with valid query string should be a valid URI");

    tracing::debug!(url = PLAYER_SUMMARY_URL, "making http request to steam");

    let response = transport::send(&mut http_client, request)
        .await
        .map_err(ProfileError::Transport)?;

    if response.status() != http::StatusCode::OK {
        return Err(ProfileError::BadStatus { status: response.status() });
    }

    let ApiResponse { response: PlayerList { players } } =
        serde_json::from_slice(response.body()).map_err(malformed)?;

    let player = players
        .into_iter()
        .next()
        .ok_or(ProfileError::NotFound { steam_id })?;

    let received = match player.get("steamid") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        Some(_) | None => String::new(),
    };

    if received != steam_id.to_string() {
        return Err(ProfileError::SteamIdMismatch { requested: steam_id, received });
    }

    serde_json::from_value(player).map_err(malformed)
}

fn malformed(error: serde_json::Error) -> ProfileError {
    tracing::error!(%error, "Steam returned a malformed player summary");
    ProfileError::MalformedResponse(error)
}
