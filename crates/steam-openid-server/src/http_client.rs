//! The HTTP client we hand to [`SteamOpenId`].
//!
//! [`SteamOpenId`]: steam_openid::SteamOpenId

use bytes::Bytes;
use reqwest::redirect;
use tower::ServiceBuilder;
use tower::util::{MapRequest, MapResponse};

use crate::config::HttpClientConfig;

type IntoReqwestRequest = fn(http::Request<Bytes>) -> reqwest::Request;
type FromReqwestResponse = fn(reqwest::Response) -> http::Response<reqwest::Body>;

/// [`reqwest::Client`] speaking [`http`] types.
pub type SteamHttpClient =
    MapRequest<MapResponse<reqwest::Client, FromReqwestResponse>, IntoReqwestRequest>;

/// Builds a client that never follows redirects and gives up after the configured timeout.
pub fn build(config: &HttpClientConfig) -> reqwest::Result<SteamHttpClient> {
    let client = reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()?;

    Ok(ServiceBuilder::new()
        .map_request(into_reqwest_request as IntoReqwestRequest)
        .map_response(http::Response::<reqwest::Body>::from as FromReqwestResponse)
        .service(client))
}

fn into_reqwest_request(request: http::Request<Bytes>) -> reqwest::Request {
    reqwest::Request::try_from(request).expect("uri should be valid")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn converts_requests() {
        let request = http::Request::post(steam_openid::LOGIN_URL)
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Bytes::from_static(b"openid.mode=check_authentication"))
            .unwrap();

        let request = into_reqwest_request(request);

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), steam_openid::LOGIN_URL);
        assert_eq!(
            request.headers()[http::header::CONTENT_TYPE],
            "application/x-www-form-urlencoded",
        );
        assert_eq!(
            request.body().and_then(reqwest::Body::as_bytes),
            Some(&b"openid.mode=check_authentication"[..]),
        );
    }

    #[tokio::test]
    async fn does_not_follow_redirects() {
        use axum::{Router, routing};
        use tower::ServiceExt;

        let router = Router::new()
            .route(
                "/",
                routing::get(|| async {
                    (http::StatusCode::FOUND, [(http::header::LOCATION, "/elsewhere")])
                }),
            )
            .route("/elsewhere", routing::get(|| async { "followed" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let request = http::Request::get(format!("http://{addr}/"))
            .body(Bytes::new())
            .unwrap();

        let response = build(&HttpClientConfig::default())
            .unwrap()
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::FOUND);
        assert_eq!(response.headers()[http::header::LOCATION], "/elsewhere");
    }

    #[test]
    fn builds() {
        let config = HttpClientConfig {
            timeout: Duration::from_secs(1),
            user_agent: String::from("test"),
        };

        assert!(build(&config).is_ok());
    }
}
