//! Steam login endpoints.

use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use http_body::Body as HttpBody;
use steam_openid::{BoxError, CallbackQuery, ErrorKind, SteamOpenId, VerifiedUser};
use tower::Service;

use crate::response::ErrorResponse;

/// Returns a router with two routes:
///
/// - `/steam` for Steam to redirect users back to
/// - `/steam/login` for sending users to Steam
pub fn router<S, ResponseBody>(steam_openid: SteamOpenId<S>) -> Router
where
    S: Service<http::Request<Bytes>, Response = http::Response<ResponseBody>>,
    S: Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    ResponseBody: HttpBody<Data = Bytes, Error: Into<BoxError>> + Send + 'static,
{
    Router::new()
        .route("/steam", routing::get(steam_callback::<S, ResponseBody>))
        .route("/steam/login", routing::get(login::<S>))
        .with_state(Arc::new(steam_openid))
}

#[tracing::instrument(skip_all)]
async fn login<S>(State(steam_openid): State<Arc<SteamOpenId<S>>>) -> Redirect {
    Redirect::to(steam_openid.login_url().as_str())
}

#[tracing::instrument(skip_all)]
async fn steam_callback<S, ResponseBody>(
    State(steam_openid): State<Arc<SteamOpenId<S>>>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, ErrorResponse>
where
    S: Service<http::Request<Bytes>, Response = http::Response<ResponseBody>>,
    S: Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    ResponseBody: HttpBody<Data = Bytes, Error: Into<BoxError>> + Send + 'static,
{
    let query = CallbackQuery::parse(raw_query.as_deref().unwrap_or_default()).map_err(|err| {
        debug!(%err, "failed to parse callback query");
        ErrorResponse::bad_request()
    })?;

    let user = match steam_openid.verify(&query).await {
        Ok(user) => user,
        Err(error) => {
            return match error.kind() {
                ErrorKind::InvalidMode => {
                    Ok(Redirect::to(steam_openid.login_url().as_str()).into_response())
                },
                ErrorKind::Internal => Err(ErrorResponse::internal_server_error(error)),
                kind => {
                    debug!(?kind, %error, "rejecting login");
                    Err(ErrorResponse::unauthorized())
                },
            };
        },
    };

    info!(steam_id = %user.steam_id(), "user logged in");

    Ok(match user {
        VerifiedUser::Identity { steam_id } => format!("Authenticated as {steam_id}").into_response(),
        VerifiedUser::Profile(profile) => Json(profile).into_response(),
    })
}
