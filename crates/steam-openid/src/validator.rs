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

//! Checks we can do locally before bothering Steam.

use std::time::Duration;

use lazy_regex::regex_is_match;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::{
    ASSOC_HANDLE,
    AssertionQuery,
    CallbackQuery,
    LOGIN_URL,
    NAMESPACE,
    QueryShapeError,
    SIGNED_FIELDS,
};

/// Length of the `YYYY-MM-DDTHH:MM:SSZ` prefix of a response nonce.
const NONCE_TIMESTAMP_LEN: usize = 20;

/// Returns whether `value` is a claimed identifier Steam could have issued.
pub fn is_valid_identity(value: &str) -> bool {
    regex_is_match!(r"^https://steamcommunity\.com/openid/id/7656119[0-9]{10}/?$", value)
}

/// The reason a [`CallbackQuery`] was rejected.
#[derive(Debug, Display, Error)]
pub enum QueryRejection {
    #[display("{_0}")]
    Malformed(QueryShapeError),

    #[display("`{field}` is empty")]
    EmptyField {
        #[error(ignore)]
        field: &'static str,
    },

    #[display("unexpected namespace")]
    NamespaceMismatch,

    #[display("unexpected OP endpoint")]
    OpEndpointMismatch,

    #[display("`openid.claimed_id` and `openid.identity` differ")]
    IdentityMismatch,

    #[display("`openid.claimed_id` is not a Steam identity")]
    InvalidIdentity,

    #[display("unexpected association handle")]
    AssocHandleMismatch,

    #[display("unexpected list of signed fields")]
    SignedFieldsMismatch,

    #[display("`openid.return_to` does not match our return URL")]
    ReturnToMismatch,
}

/// Decides whether a callback is worth verifying with Steam.
///
/// None of these checks do any I/O.
#[derive(Debug, Clone)]
pub struct QueryValidator {
    #[debug("{:?}", return_to.as_str())]
    return_to: Url,
    max_nonce_age: Option<Duration>,
}

impl QueryValidator {
    /// Creates a new [`QueryValidator`].
    ///
    /// `return_to` must be exactly the URL that was passed to [`login_url()`]. If `max_nonce_age`
    /// is `None`, nonces never expire.
    ///
    /// [`login_url()`]: crate::login_url()
    pub const fn new(return_to: Url, max_nonce_age: Option<Duration>) -> Self {
        Self { return_to, max_nonce_age }
    }

    /// The URL callbacks must be addressed to.
    pub fn return_to(&self) -> &Url {
        &self.return_to
    }

    /// How old a response nonce may be, if limited.
    pub const fn max_nonce_age(&self) -> Option<Duration> {
        self.max_nonce_age
    }

    /// Returns whether `query` is a response to an authentication request, as opposed to a user
    /// who still has to be sent to Steam.
    pub fn has_auth_query(&self, query: &CallbackQuery) -> bool {
        query.mode() == Some("id_res")
    }

    /// Shorthand for [`validate()`](Self::validate) when the reason does not matter.
    pub fn is_query_valid(&self, query: &CallbackQuery) -> bool {
        self.validate(query).is_ok()
    }

    /// Checks every field of `query` and turns it into an [`AssertionQuery`].
    #[tracing::instrument(level = "trace", skip_all, err(level = "debug"))]
    pub fn validate(&self, query: &CallbackQuery) -> Result<AssertionQuery, QueryRejection> {
        let assertion = AssertionQuery::from_callback(query).map_err(QueryRejection::Malformed)?;
        self.validate_assertion(&assertion)?;
        Ok(assertion)
    }

    /// Checks the field values of an [`AssertionQuery`].
    pub fn validate_assertion(&self, assertion: &AssertionQuery) -> Result<(), QueryRejection> {
        if let Some((field, _)) = assertion.fields().into_iter().find(|(_, v)| v.is_empty()) {
            return Err(QueryRejection::EmptyField { field });
        }

        if assertion.ns != NAMESPACE {
            return Err(QueryRejection::NamespaceMismatch);
        }

        if assertion.op_endpoint != LOGIN_URL {
            return Err(QueryRejection::OpEndpointMismatch);
        }

        if assertion.claimed_id != assertion.identity {
            return Err(QueryRejection::IdentityMismatch);
        }

        if !is_valid_identity(&assertion.claimed_id) {
            return Err(QueryRejection::InvalidIdentity);
        }

        if assertion.assoc_handle != ASSOC_HANDLE {
            return Err(QueryRejection::AssocHandleMismatch);
        }

        if assertion.signed != SIGNED_FIELDS {
            return Err(QueryRejection::SignedFieldsMismatch);
        }

        if assertion.return_to != self.return_to.as_str() {
            return Err(QueryRejection::ReturnToMismatch);
        }

        Ok(())
    }

    /// Returns whether `response_nonce` is older than the configured maximum age.
    pub fn has_nonce_expired(&self, response_nonce: &str) -> bool {
        self.has_nonce_expired_at(response_nonce, OffsetDateTime::now_utc())
    }

    /// Same as [`has_nonce_expired()`], but with a custom "now".
    ///
    /// A nonce without a parsable timestamp counts as expired.
    ///
    /// [`has_nonce_expired()`]: QueryValidator::has_nonce_expired
    pub fn has_nonce_expired_at(&self, response_nonce: &str, now: OffsetDateTime) -> bool {
        let Some(max_age) = self.max_nonce_age else {
            return false;
        };

        let issued_at = match response_nonce
            .get(..NONCE_TIMESTAMP_LEN)
            .map(|timestamp| OffsetDateTime::parse(timestamp, &Rfc3339))
        {
            Some(Ok(issued_at)) => issued_at,
            Some(Err(error)) => {
                tracing::debug!(%error, response_nonce, "failed to parse nonce timestamp");
                return true;
            },
            None => {
                tracing::debug!(response_nonce, "nonce is too short");
                return true;
            },
        };

        let elapsed = (now - issued_at).whole_seconds();
        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);

        elapsed > max_age
    }
}

#[cfg(test)]
mod tests {
    use time::ext::NumericalDuration;

    use super::*;
    use crate::testing;

    fn validator() -> QueryValidator {
        QueryValidator::new(testing::return_url(), None)
    }

    #[test]
    fn valid_query() {
        assert!(validator().is_query_valid(&testing::valid_query()));
    }

    #[test]
    fn has_auth_query() {
        let validator = validator();

        assert!(validator.has_auth_query(&testing::valid_query()));
        assert!(!validator.has_auth_query(&testing::with("openid.mode", "cancel")));
        assert!(!validator.has_auth_query(&testing::with("openid.mode", "ID_RES")));
        assert!(!validator.has_auth_query(&testing::without("openid.mode")));
        assert!(!validator.has_auth_query(&CallbackQuery::default()));
    }

    #[test]
    fn missing_keys() {
        let validator = validator();

        for key in testing::KEYS {
            assert!(!validator.is_query_valid(&testing::without(key)), "{key}");
        }
    }

    #[test]
    fn empty_values() {
        let validator = validator();

        for key in testing::KEYS {
            let result = validator.validate(&testing::with(key, ""));
            assert!(matches!(result, Err(QueryRejection::EmptyField { field }) if field == key));
        }
    }

    #[test]
    fn extra_keys() {
        let validator = validator();

        for key in ["openid.invalidate_handle", "foo", "openid.ns"] {
            assert!(!validator.is_query_valid(&testing::with_extra(key, "bar")), "{key}");
        }
    }

    #[test]
    fn corrupted_fields() {
        let validator = validator();
        let cases = [
            ("openid.ns", "http://specs.openid.net/auth/1.1"),
            ("openid.op_endpoint", "https://steamcommunity.com/openid/login/"),
            ("openid.claimed_id", "https://steamcommunity.com/openid/id/76561197960435531"),
            ("openid.identity", "https://steamcommunity.com/openid/id/76561197960435531"),
            ("openid.assoc_handle", "0987654321"),
            ("openid.signed", "signed,op_endpoint,claimed_id,identity,return_to,response_nonce"),
            ("openid.return_to", "http://localhost:3000/auth/steam/"),
            ("openid.return_to", "https://evil.example.com/auth/steam"),
        ];

        for (key, value) in cases {
            assert!(!validator.is_query_valid(&testing::with(key, value)), "{key}={value}");
        }
    }

    #[test]
    fn invalid_identity_shape() {
        let validator = validator();
        let identity = "https://steamcommunity.com/openid/id/12345678901234567";
        let query: CallbackQuery = testing::valid_query()
            .iter()
            .map(|(k, v)| match k {
                "openid.claimed_id" | "openid.identity" => (k, identity),
                _ => (k, v),
            })
            .collect();

        assert!(matches!(validator.validate(&query), Err(QueryRejection::InvalidIdentity)));
    }

    #[test]
    fn identity_pattern() {
        assert!(is_valid_identity("https://steamcommunity.com/openid/id/76561197960435530"));
        assert!(is_valid_identity("https://steamcommunity.com/openid/id/76561197960435530/"));

        assert!(!is_valid_identity("http://steamcommunity.com/openid/id/76561197960435530"));
        assert!(!is_valid_identity("https://steamcommunity.com/openid/id/7656119796043553"));
        assert!(!is_valid_identity("https://steamcommunity.com/openid/id/765611979604355300"));
        assert!(!is_valid_identity("https://steamcommunity.com/openid/id/76561197960435530//"));
        assert!(!is_valid_identity("https://steamcommunity.com/openid/id/12345678901234567"));
        assert!(!is_valid_identity("https://steamcommunityXcom/openid/id/76561197960435530"));
        assert!(!is_valid_identity("https://steamcommunity.com/openid/id/7656119796043553a"));
        assert!(!is_valid_identity(""));
    }

    #[test]
    fn nonce_never_expires_without_max_age() {
        let validator = validator();
        let ancient = testing::nonce_at(OffsetDateTime::UNIX_EPOCH);

        assert!(!validator.has_nonce_expired(&ancient));
        assert!(!validator.has_nonce_expired("garbage"));
    }

    #[test]
    fn nonce_expiry() {
        let validator = QueryValidator::new(testing::return_url(), Some(Duration::from_secs(60)));
        let now = OffsetDateTime::now_utc().replace_nanosecond(0).unwrap();

        assert!(!validator.has_nonce_expired_at(&testing::nonce_at(now), now));
        assert!(!validator.has_nonce_expired_at(&testing::nonce_at(now - 60.seconds()), now));
        assert!(validator.has_nonce_expired_at(&testing::nonce_at(now - 61.seconds()), now));
        assert!(!validator.has_nonce_expired_at(&testing::nonce_at(now + 1.hours()), now));
        assert!(!validator.has_nonce_expired(&testing::nonce_at(OffsetDateTime::now_utc())));
    }

    #[test]
    fn malformed_nonce_is_expired() {
        let validator = QueryValidator::new(testing::return_url(), Some(Duration::from_secs(60)));

        assert!(validator.has_nonce_expired("2024-01-01"));
        assert!(validator.has_nonce_expired("not a timestamp at all, but long enough"));
    }
}
