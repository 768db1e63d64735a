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

//! A small HTTP server that lets users log in with Steam.

#[macro_use]
extern crate derive_more;

#[macro_use(debug, info, warn, error)]
extern crate tracing;

use std::io;

use axum::{Router, routing};
use steam_openid::SteamOpenId;
use tokio::signal;

pub mod config;
pub use config::Config;

pub mod http_client;
pub mod logging;

mod auth;
mod response;

#[derive(Debug, Display, Error, From)]
pub enum Error {
    #[display("failed to initialize runtime: {_0}")]
    #[from(ignore)]
    InitializeRuntime(io::Error),

    #[display("invalid configuration: {_0}")]
    Config(steam_openid::ConfigError),

    #[display("failed to build HTTP client: {_0}")]
    HttpClient(reqwest::Error),

    #[display("failed to run server: {_0}")]
    #[from(ignore)]
    RunServer(io::Error),
}

/// Run the server.
///
/// This function will initialize its own [`tokio`] runtime and **block** until the server shuts
/// down.
pub fn run(config: Config) -> Result<(), Error> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::InitializeRuntime)?
        .block_on(serve(config))
}

async fn serve(config: Config) -> Result<(), Error> {
    let http_client = http_client::build(&config.http_client)?;
    let steam_openid = SteamOpenId::new(config.steam_openid, http_client)?;

    if !steam_openid.validator().return_to().path().starts_with("/auth/steam") {
        warn!(
            return_url = %steam_openid.validator().return_to(),
            "return URL does not point at `/auth/steam`; Steam will redirect users elsewhere",
        );
    }

    let router = Router::new()
        .route("/", routing::get("(͡ ͡° ͜ つ ͡͡°)"))
        .nest("/auth", auth::router(steam_openid));

    let socket = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .map_err(Error::RunServer)?;

    let addr = socket.local_addr().map_err(Error::RunServer)?;

    info!("Listening on {addr}");

    axum::serve(socket, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::RunServer)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(error) => {
                error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(error) = result {
                error!(%error, "failed to listen for ctrl-c");
                return;
            }
        },
        () = terminate => {},
    }

    warn!("shutting down");
}
