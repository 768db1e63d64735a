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

use std::str;

use bytes::Bytes;
use http_body::Body as HttpBody;
use lazy_regex::regex_captures;
use tower_service::Service;

use crate::{AssertionQuery, BoxError, LOGIN_URL, NAMESPACE, transport};

/// Asks Steam whether it actually issued `assertion`.
///
/// Anything that prevents us from getting a clear "yes" out of Steam, including network errors
/// and unexpected status codes, results in `false`.
#[tracing::instrument(skip_all, fields(claimed_id = %assertion.claimed_id), ret(level = "debug"))]
pub async fn verify_with_steam<S, ResponseBody>(
    assertion: &AssertionQuery,
    mut http_client: S,
) -> bool
where
    S: Service<http::Request<Bytes>, Response = http::Response<ResponseBody>>,
    S::Error: Into<BoxError>,
    ResponseBody: HttpBody<Error: Into<BoxError>>,
{
    let payload = match serde_urlencoded::to_string(assertion.to_verification_form()) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::debug!(%error, "failed to serialize assertion");
            return false;
        },
    };

    let request = match http::Request::post(LOGIN_URL)
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
        .body(Bytes::from(payload))
    {
        Ok(request) => request,
        Err(error) => {
            tracing::debug!(%error, "failed to build verification request");
            return false;
        },
    };

    let response = match transport::send(&mut http_client, request).await {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(%error, "failed to verify assertion");
            return false;
        },
    };

    if response.status() != http::StatusCode::OK {
        tracing::debug!(
            status = response.status().as_u16(),
            body = str::from_utf8(response.body()).ok(),
            "Steam returned bad status",
        );

        return false;
    }

    if !is_steam_response_valid(response.body()) {
        tracing::debug!(body = ?response.body(), "Steam rejected assertion");
        return false;
    }

    true
}

/// Checks whether Steam's response to a verification request says the assertion is valid.
///
/// The response must look exactly like this:
///
/// ```text
/// ns:http://specs.openid.net/auth/2.0
/// is_valid:true
/// ```
///
/// including the trailing newline.
pub fn is_steam_response_valid(body: &[u8]) -> bool {
    let Ok(body) = str::from_utf8(body) else {
        return false;
    };

    let Some((_, ns, is_valid)) = regex_captures!(r"^ns:(.+)\nis_valid:(.+)\n$", body) else {
        return false;
    };

    ns == NAMESPACE && is_valid == "true"
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    use http_body_util::Full;

    use super::*;
    use crate::testing;

    fn assertion() -> AssertionQuery {
        AssertionQuery::from_callback(&testing::valid_query()).unwrap()
    }

    #[test]
    fn valid_response() {
        assert!(is_steam_response_valid(b"ns:http://specs.openid.net/auth/2.0\nis_valid:true\n"));
    }

    #[test]
    fn invalid_responses() {
        for body in [
            "ns:http://specs.openid.net/auth/2.0\nis_valid:false\n",
            "ns:http://specs.openid.net/auth/1.1\nis_valid:true\n",
            "ns:http://specs.openid.net/auth/2.0\nis_valid:true",
            "ns:http://specs.openid.net/auth/2.0\nis_valid:True\n",
            "ns:http://specs.openid.net/auth/2.0\nis_valid: true\n",
            "ns:http://specs.openid.net/auth/2.0\r\nis_valid:true\r\n",
            "ns:http://specs.openid.net/auth/2.0\nis_valid:true\n\n",
            "ns:http://specs.openid.net/auth/2.0\nis_valid:true\nfoo:bar\n",
            "is_valid:true\n",
            "",
        ] {
            assert!(!is_steam_response_valid(body.as_bytes()), "{body:?}");
        }

        assert!(!is_steam_response_valid(b"ns:\xff\nis_valid:true\n"));
    }

    #[tokio::test]
    async fn sends_check_authentication() {
        let seen = Arc::new(Mutex::new(None));
        let http_client = tower::service_fn({
            let seen = Arc::clone(&seen);
            move |request: http::Request<Bytes>| {
                *seen.lock().unwrap() = Some(request);
                async { Ok::<_, Infallible>(testing::text_response(200, testing::VALID_RESPONSE)) }
            }
        });

        let assertion = assertion();

        assert!(verify_with_steam(&assertion, http_client).await);

        let request = seen.lock().unwrap().take().unwrap();
        assert_eq!(request.method(), http::Method::POST);
        assert_eq!(request.uri(), LOGIN_URL);
        assert_eq!(
            request.headers()[http::header::CONTENT_TYPE],
            "application/x-www-form-urlencoded",
        );

        let form = serde_urlencoded::from_bytes::<AssertionQuery>(request.body()).unwrap();
        assert_eq!(form, assertion.to_verification_form());
        assert_eq!(assertion.mode, "id_res");
    }

    #[tokio::test]
    async fn steam_says_no() {
        let http_client = testing::steam(200, testing::INVALID_RESPONSE);
        assert!(!verify_with_steam(&assertion(), http_client).await);
    }

    #[tokio::test]
    async fn bad_status() {
        for status in [204, 302, 401, 500, 503] {
            let http_client = testing::steam(status, testing::VALID_RESPONSE);
            assert!(!verify_with_steam(&assertion(), http_client).await, "{status}");
        }
    }

    #[tokio::test]
    async fn transport_error() {
        let http_client = tower::service_fn(|_: http::Request<Bytes>| async {
            Err::<http::Response<Full<Bytes>>, _>(std::io::Error::other("connection reset"))
        });

        assert!(!verify_with_steam(&assertion(), http_client).await);
    }
}
