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

//! Helper functions & types for using Steam as an OpenID 2.0 provider.
//!
//! Steam only supports the "dumb mode" of OpenID 2.0, which means we never verify any signatures
//! ourselves. Instead, the whole procedure looks like this:
//!
//! 1. redirect the user to the URL returned by [`login_url()`]
//! 2. the user logs in on Steam's website
//! 3. Steam redirects the user back to our `return_to` URL, with an assertion encoded in the
//!    query parameters
//! 4. we check that the assertion looks like something Steam would send us
//!    (see [`QueryValidator`])
//! 5. we send the assertion back to Steam, which tells us whether it actually issued it
//!    (see [`verify_with_steam()`])
//! 6. we extract the user's SteamID, and optionally fetch their profile
//!    (see [`fetch_profile()`])
//!
//! [`SteamOpenId`] ties all of these steps together.

#[macro_use]
extern crate derive_more;

/// Steam's OpenID endpoint.
///
/// Users are redirected here for login, and assertions are sent back here for verification.
pub const LOGIN_URL: &str = "https://steamcommunity.com/openid/login";

/// The OpenID 2.0 namespace.
pub const NAMESPACE: &str = "http://specs.openid.net/auth/2.0";

/// Lets Steam choose the identifier, since we don't know who is logging in yet.
pub const IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";

/// Every claimed identifier issued by Steam starts with this.
pub const IDENTITY_ENDPOINT: &str = "https://steamcommunity.com/openid/id";

/// The only association handle Steam ever hands out.
pub const ASSOC_HANDLE: &str = "1234567890";

/// The fields Steam signs, in the order it lists them.
pub const SIGNED_FIELDS: &str =
    "signed,op_endpoint,claimed_id,identity,return_to,response_nonce,assoc_handle";

/// Steam Web API URL for fetching user profiles.
pub const PLAYER_SUMMARY_URL: &str =
    "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v2";

/// Type-erased error returned by HTTP clients.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

mod steam_id;
pub use steam_id::{ParseSteamIdError, SteamId};

mod query;
pub use query::{AssertionQuery, CallbackQuery, QueryShapeError};

mod validator;
pub use validator::{QueryRejection, QueryValidator, is_valid_identity};

mod login_url;
pub use login_url::login_url;

mod verify;
pub use verify::{is_steam_response_valid, verify_with_steam};

mod profile;
pub use profile::{Profile, ProfileError, fetch_profile};

mod config;
pub use config::{Config, ConfigError};

mod strategy;
pub use strategy::{AuthenticateError, ErrorKind, SteamOpenId, VerifiedUser, VerifyError};

mod transport;
pub use transport::TransportError;

#[cfg(test)]
mod testing;
