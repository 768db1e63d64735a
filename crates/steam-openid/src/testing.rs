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

//! Fixtures shared by the unit tests.

use std::convert::Infallible;

use bytes::Bytes;
use http_body_util::Full;
use time::OffsetDateTime;
use time::macros::format_description;
use url::Url;

use crate::{ASSOC_HANDLE, CallbackQuery, LOGIN_URL, NAMESPACE, SIGNED_FIELDS};

pub const RETURN_URL: &str = "http://localhost:3000/auth/steam";
pub const STEAM_ID: &str = "76561197960435530";
pub const CLAIMED_ID: &str = "https://steamcommunity.com/openid/id/76561197960435530";
pub const SIG: &str = "dc6e2a79de2c6aceac495ad5f4c6b6e0bfe30";
pub const VALID_RESPONSE: &str = "ns:http://specs.openid.net/auth/2.0\nis_valid:true\n";
pub const INVALID_RESPONSE: &str = "ns:http://specs.openid.net/auth/2.0\nis_valid:false\n";

pub const PLAYER: &str = r#"{
    "steamid": "76561197960435530",
    "communityvisibilitystate": 3,
    "profilestate": 1,
    "personaname": "Robin",
    "commentpermission": 1,
    "profileurl": "https://steamcommunity.com/id/robinwalker/",
    "avatar": "https://avatars.steamstatic.com/f1dd60a188883caf82d0cbfccfe6aba0af1732d4.jpg",
    "avatarmedium": "https://avatars.steamstatic.com/f1dd60a188883caf82d0cbfccfe6aba0af1732d4_medium.jpg",
    "avatarfull": "https://avatars.steamstatic.com/f1dd60a188883caf82d0cbfccfe6aba0af1732d4_full.jpg",
    "avatarhash": "f1dd60a188883caf82d0cbfccfe6aba0af1732d4",
    "personastate": 0,
    "realname": "Robin Walker",
    "primaryclanid": "103582791429521412",
    "timecreated": 1063407589,
    "personastateflags": 0,
    "loccountrycode": "US",
    "locstatecode": "WA"
}"#;

/// Wraps a single player object the way `GetPlayerSummaries` does.
pub fn player_summary(player: &str) -> String {
    format!(r#"{{"response":{{"players":[{player}]}}}}"#)
}

pub const KEYS: [&str; 10] = [
    "openid.ns",
    "openid.mode",
    "openid.op_endpoint",
    "openid.claimed_id",
    "openid.identity",
    "openid.return_to",
    "openid.response_nonce",
    "openid.assoc_handle",
    "openid.signed",
    "openid.sig",
];

pub fn return_url() -> Url {
    Url::parse(RETURN_URL).unwrap()
}

/// Builds a nonce the way Steam does: a second-precision UTC timestamp followed by random junk.
pub fn nonce_at(timestamp: OffsetDateTime) -> String {
    let timestamp = timestamp
        .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))
        .unwrap();

    format!("{timestamp}8df86bac92ad1addaf3735a5aabdc6e2a7")
}

fn pairs() -> Vec<(&'static str, String)> {
    vec![
        ("openid.ns", NAMESPACE.to_owned()),
        ("openid.mode", "id_res".to_owned()),
        ("openid.op_endpoint", LOGIN_URL.to_owned()),
        ("openid.claimed_id", CLAIMED_ID.to_owned()),
        ("openid.identity", CLAIMED_ID.to_owned()),
        ("openid.return_to", RETURN_URL.to_owned()),
        ("openid.response_nonce", nonce_at(OffsetDateTime::now_utc())),
        ("openid.assoc_handle", ASSOC_HANDLE.to_owned()),
        ("openid.signed", SIGNED_FIELDS.to_owned()),
        ("openid.sig", SIG.to_owned()),
    ]
}

/// A query Steam could have sent us just now.
pub fn valid_query() -> CallbackQuery {
    pairs().into_iter().collect()
}

/// [`valid_query()`] with the value of `key` replaced.
pub fn with(key: &str, value: &str) -> CallbackQuery {
    pairs()
        .into_iter()
        .map(|(k, v)| if k == key { (k, value.to_owned()) } else { (k, v) })
        .collect()
}

/// [`valid_query()`] without `key`.
pub fn without(key: &str) -> CallbackQuery {
    pairs().into_iter().filter(|&(k, _)| k != key).collect()
}

/// [`valid_query()`] with an additional parameter.
pub fn with_extra(key: &'static str, value: &str) -> CallbackQuery {
    pairs()
        .into_iter()
        .chain([(key, value.to_owned())])
        .collect()
}

pub fn text_response(status: u16, body: &'static str) -> http::Response<Full<Bytes>> {
    http::Response::builder()
        .status(status)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

/// A mock HTTP client that answers every verification request with `body`.
pub fn steam(
    status: u16,
    body: &'static str,
) -> impl tower_service::Service<
    http::Request<Bytes>,
    Response = http::Response<Full<Bytes>>,
    Error = Infallible,
> + Clone {
    tower::service_fn(move |request: http::Request<Bytes>| async move {
        assert_eq!(request.method(), http::Method::POST);
        assert_eq!(request.uri(), LOGIN_URL);

        Ok::<_, Infallible>(text_response(status, body))
    })
}
