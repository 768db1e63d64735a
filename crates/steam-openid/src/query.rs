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

use serde::de::value::{self, MapDeserializer};
use serde::{Deserialize, Serialize};

use crate::IDENTITY_ENDPOINT;

/// The query parameters of a request that hit our `return_to` URL, exactly as we received them.
///
/// Nothing about these has been checked yet; see [`QueryValidator`].
///
/// [`QueryValidator`]: crate::QueryValidator
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallbackQuery {
    pairs: Vec<(String, String)>,
}

impl CallbackQuery {
    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// Keys that occur multiple times are kept as-is.
    pub fn parse(query_string: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str::<Vec<(String, String)>>(query_string)
            .map(|pairs| Self { pairs })
    }

    /// Returns the first value for the given `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of `openid.mode`.
    pub fn mode(&self) -> Option<&str> {
        self.get("openid.mode")
    }

    /// Iterates over the pairs in the order they were received.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs, duplicates included.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the request had no query string at all.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CallbackQuery
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A [`CallbackQuery`] that contains exactly the ten fields of a positive assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertionQuery {
    #[serde(rename = "openid.ns")]
    pub ns: String,

    #[serde(rename = "openid.mode")]
    pub mode: String,

    #[serde(rename = "openid.op_endpoint")]
    pub op_endpoint: String,

    #[serde(rename = "openid.claimed_id")]
    pub claimed_id: String,

    #[serde(rename = "openid.identity")]
    pub identity: String,

    #[serde(rename = "openid.return_to")]
    pub return_to: String,

    #[serde(rename = "openid.response_nonce")]
    pub response_nonce: String,

    #[serde(rename = "openid.assoc_handle")]
    pub assoc_handle: String,

    #[serde(rename = "openid.signed")]
    pub signed: String,

    #[serde(rename = "openid.sig")]
    pub sig: String,
}

/// A key was missing, duplicated, or not part of an assertion at all.
#[derive(Debug, Display, Error)]
#[display("malformed assertion: {_0}")]
pub struct QueryShapeError(value::Error);

impl AssertionQuery {
    /// The mode we send to Steam when asking it to verify an assertion.
    pub const CHECK_AUTHENTICATION: &'static str = "check_authentication";

    pub fn from_callback(query: &CallbackQuery) -> Result<Self, QueryShapeError> {
        let deserializer = MapDeserializer::<'_, _, value::Error>::new(query.iter());

        Self::deserialize(deserializer).map_err(QueryShapeError)
    }

    /// Every field together with its query parameter name.
    pub fn fields(&self) -> [(&'static str, &str); 10] {
        [
            ("openid.ns", self.ns.as_str()),
            ("openid.mode", self.mode.as_str()),
            ("openid.op_endpoint", self.op_endpoint.as_str()),
            ("openid.claimed_id", self.claimed_id.as_str()),
            ("openid.identity", self.identity.as_str()),
            ("openid.return_to", self.return_to.as_str()),
            ("openid.response_nonce", self.response_nonce.as_str()),
            ("openid.assoc_handle", self.assoc_handle.as_str()),
            ("openid.signed", self.signed.as_str()),
            ("openid.sig", self.sig.as_str()),
        ]
    }

    /// Returns a copy of this assertion that asks Steam to verify it.
    pub fn to_verification_form(&self) -> Self {
        Self { mode: String::from(Self::CHECK_AUTHENTICATION), ..self.clone() }
    }

    /// Extracts the SteamID from `openid.claimed_id`.
    ///
    /// This does not check anything; the claimed identifier is expected to have been validated
    /// already.
    pub fn steam_id_str(&self) -> &str {
        let id = self
            .claimed_id
            .strip_prefix(IDENTITY_ENDPOINT)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.claimed_id);

        id.strip_suffix('/').unwrap_or(id)
    }
}
