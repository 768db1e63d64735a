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

//! Glue between us and whatever HTTP client the caller hands us.
//!
//! Any [`Service`] that accepts `http::Request<Bytes>` and returns an `http::Response` with some
//! [`http_body::Body`] will do.

use std::{error, fmt, future};

use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use tower_service::Service;

use crate::BoxError;

/// We failed to talk to Steam at all.
#[derive(Debug)]
pub struct TransportError {
    context: &'static str,
    source: BoxError,
}

impl TransportError {
    fn new(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self { context, source: source.into() }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}: {}", self.context, self.source)
    }
}

impl error::Error for TransportError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&*self.source)
    }
}

/// Sends `request` and buffers the whole response body.
pub(crate) async fn send<S, ResponseBody>(
    http_client: &mut S,
    request: http::Request<Bytes>,
) -> Result<http::Response<Bytes>, TransportError>
where
    S: Service<http::Request<Bytes>, Response = http::Response<ResponseBody>>,
    S::Error: Into<BoxError>,
    ResponseBody: HttpBody<Error: Into<BoxError>>,
{
    future::poll_fn(|cx| http_client.poll_ready(cx))
        .await
        .map_err(|err| TransportError::new("HTTP client is not ready", err))?;

    let (response, body) = http_client
        .call(request)
        .await
        .map_err(|err| TransportError::new("failed to make HTTP request to Steam", err))?
        .into_parts();

    let body = body
        .collect()
        .await
        .map_err(|err| TransportError::new("failed to buffer response body", err))?
        .to_bytes();

    Ok(http::Response::from_parts(response, body))
}
