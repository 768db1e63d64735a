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

//! The full login flow.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http_body::Body as HttpBody;
use tower_service::Service;
use url::Url;

use crate::{
    BoxError,
    CallbackQuery,
    Config,
    ConfigError,
    ParseSteamIdError,
    Profile,
    ProfileError,
    QueryRejection,
    QueryValidator,
    SteamId,
    fetch_profile,
    login_url,
    verify_with_steam,
};

/// Logs users in via Steam.
///
/// `S` is the HTTP client used to talk to Steam. It is cloned for every request, so it should
/// be cheap to clone (e.g. a connection pool behind an [`Arc`]).
#[derive(Debug, Clone)]
pub struct SteamOpenId<S> {
    validator: QueryValidator,
    resolution: Resolution,

    #[debug(skip)]
    http_client: S,
}

/// What we turn a verified callback into.
#[derive(Debug, Clone)]
enum Resolution {
    Identity,
    Profile {
        #[debug(skip)]
        web_api_key: Arc<str>,
    },
}

/// A user who successfully logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifiedUser {
    Identity { steam_id: SteamId },
    Profile(Box<Profile>),
}

impl VerifiedUser {
    /// The SteamID of the user, regardless of whether their profile was fetched.
    pub fn steam_id(&self) -> SteamId {
        match *self {
            Self::Identity { steam_id } => steam_id,
            Self::Profile(ref profile) => profile.steam_id,
        }
    }
}

#[derive(Debug, Display, Error)]
pub enum VerifyError {
    /// The request is not an OpenID callback; the user should be sent to Steam.
    #[display("request is not an authentication response")]
    InvalidMode,

    #[display("invalid callback query: {_0}")]
    InvalidQuery(QueryRejection),

    #[display("response nonce has expired")]
    NonceExpired,

    /// Steam did not confirm the assertion.
    #[display("Steam could not verify the assertion")]
    Unauthorized,

    #[display("invalid SteamID: {_0}")]
    InvalidSteamId(ParseSteamIdError),

    #[display("failed to fetch profile: {_0}")]
    FetchProfile(ProfileError),
}

/// Coarse classification of a [`VerifyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidMode,
    InvalidQuery,
    NonceExpired,
    Unauthorized,
    InvalidSteamId,

    /// Something went wrong on our end or on Steam's; not the user's fault.
    Internal,
}

impl ErrorKind {
    /// Whether the user should be redirected to [`SteamOpenId::login_url()`].
    pub fn should_redirect(self) -> bool {
        self == Self::InvalidMode
    }

    /// Whether this is the user's problem (as opposed to ours).
    pub fn is_authentication_failure(self) -> bool {
        !matches!(self, Self::InvalidMode | Self::Internal)
    }
}

impl VerifyError {
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Self::InvalidMode => ErrorKind::InvalidMode,
            Self::InvalidQuery(_) => ErrorKind::InvalidQuery,
            Self::NonceExpired => ErrorKind::NonceExpired,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::InvalidSteamId(_) => ErrorKind::InvalidSteamId,
            Self::FetchProfile(ProfileError::NotFound { .. })
            | Self::FetchProfile(ProfileError::SteamIdMismatch { .. }) => ErrorKind::InvalidSteamId,
            Self::FetchProfile(ProfileError::Transport(_))
            | Self::FetchProfile(ProfileError::BadStatus { .. })
            | Self::FetchProfile(ProfileError::MalformedResponse(_)) => ErrorKind::Internal,
        }
    }

    /// Whether the user should be redirected to [`SteamOpenId::login_url()`].
    pub fn should_redirect(&self) -> bool {
        self.kind().should_redirect()
    }

    /// Whether this error is the user's problem (as opposed to ours).
    pub fn is_authentication_failure(&self) -> bool {
        self.kind().is_authentication_failure()
    }
}

/// Error returned by [`SteamOpenId::authenticate()`].
#[derive(Debug)]
pub enum AuthenticateError<E> {
    Verify(VerifyError),

    /// The callback accepted the login but did not return a user.
    NoUser,

    /// The callback itself failed.
    Callback(E),
}

impl<E> AuthenticateError<E> {
    /// A callback that refuses a user counts as [`ErrorKind::Unauthorized`], a callback that fails
    /// as [`ErrorKind::Internal`].
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Self::Verify(ref error) => error.kind(),
            Self::NoUser => ErrorKind::Unauthorized,
            Self::Callback(_) => ErrorKind::Internal,
        }
    }
}

impl<E: fmt::Display> fmt::Display for AuthenticateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Verify(ref error) => fmt::Display::fmt(error, f),
            Self::NoUser => f.write_str("no user was received from callback"),
            Self::Callback(ref error) => write!(f, "callback failed: {error}"),
        }
    }
}

impl<E> std::error::Error for AuthenticateError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Self::Verify(ref error) => Some(error),
            Self::NoUser => None,
            Self::Callback(ref error) => Some(error),
        }
    }
}

impl<S> SteamOpenId<S> {
    /// Creates a new [`SteamOpenId`] that talks to Steam using `http_client`.
    pub fn new(config: Config, http_client: S) -> Result<Self, ConfigError> {
        let resolution = match (config.fetch_profile, config.web_api_key) {
            (false, _) => Resolution::Identity,
            (true, Some(web_api_key)) if !web_api_key.is_empty() => {
                Resolution::Profile { web_api_key: web_api_key.into() }
            },
            (true, _) => return Err(ConfigError::MissingWebApiKey),
        };

        Ok(Self {
            validator: QueryValidator::new(config.return_url, config.max_nonce_age),
            resolution,
            http_client,
        })
    }

    /// The URL users should be redirected to for logging in.
    pub fn login_url(&self) -> Url {
        login_url(self.validator.return_to())
    }

    /// The validator used for incoming callbacks.
    pub fn validator(&self) -> &QueryValidator {
        &self.validator
    }

    /// Whether [`verify()`](Self::verify) returns [`VerifiedUser::Profile`]s.
    pub fn fetches_profiles(&self) -> bool {
        matches!(self.resolution, Resolution::Profile { .. })
    }

    /// Verifies a callback from Steam.
    ///
    /// Checks run in order and stop at the first failure. At most two requests are made: one to
    /// verify the assertion, and one to fetch the user's profile if configured.
    #[tracing::instrument(
        skip_all,
        fields(steam_id = tracing::field::Empty),
        err(level = "debug"),
    )]
    pub async fn verify<ResponseBody>(
        &self,
        query: &CallbackQuery,
    ) -> Result<VerifiedUser, VerifyError>
    where
        S: Service<http::Request<Bytes>, Response = http::Response<ResponseBody>> + Clone,
        S::Error: Into<BoxError>,
        ResponseBody: HttpBody<Error: Into<BoxError>>,
    {
        if !self.validator.has_auth_query(query) {
            return Err(VerifyError::InvalidMode);
        }

        let assertion = self.validator.validate(query).map_err(VerifyError::InvalidQuery)?;

        if self.validator.has_nonce_expired(&assertion.response_nonce) {
            return Err(VerifyError::NonceExpired);
        }

        if !verify_with_steam(&assertion, self.http_client.clone()).await {
            return Err(VerifyError::Unauthorized);
        }

        let steam_id =
            SteamId::parse(assertion.steam_id_str()).map_err(VerifyError::InvalidSteamId)?;

        tracing::Span::current().record("steam_id", tracing::field::display(steam_id));

        match self.resolution {
            Resolution::Identity => Ok(VerifiedUser::Identity { steam_id }),
            Resolution::Profile { ref web_api_key } => {
                fetch_profile(self.http_client.clone(), web_api_key, steam_id)
                    .await
                    .map(|profile| VerifiedUser::Profile(Box::new(profile)))
                    .map_err(VerifyError::FetchProfile)
            },
        }
    }

    /// Verifies a callback and hands the user to `on_verified`, which decides who they are in
    /// the application.
    ///
    /// `on_verified` is only called once [`verify()`](Self::verify) succeeded. Returning
    /// `Ok(None)` rejects the login.
    pub async fn authenticate<ResponseBody, F, Fut, User, E>(
        &self,
        query: &CallbackQuery,
        on_verified: F,
    ) -> Result<User, AuthenticateError<E>>
    where
        S: Service<http::Request<Bytes>, Response = http::Response<ResponseBody>> + Clone,
        S::Error: Into<BoxError>,
        ResponseBody: HttpBody<Error: Into<BoxError>>,
        F: FnOnce(VerifiedUser) -> Fut,
        Fut: Future<Output = Result<Option<User>, E>>,
    {
        let verified = self.verify(query).await.map_err(AuthenticateError::Verify)?;
        let steam_id = verified.steam_id();

        match on_verified(verified).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                tracing::debug!(%steam_id, "callback did not return a user");
                Err(AuthenticateError::NoUser)
            },
            Err(error) => Err(AuthenticateError::Callback(error)),
        }
    }
}
