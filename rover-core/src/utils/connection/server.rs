//! HTTP / WebSocket Server Module
//!
//! This module defines the operator-facing server using the `picoserve`
//! framework. Two transports feed the drive loop through
//! [`intake::submit`](crate::utils::controllers::intake::submit):
//!
//! - `GET /joy?x=<f>&y=<f>`: polled by the page; missing or unparseable axes
//!   read as `0.0`.
//! - `GET /ws`: WebSocket carrying `"<x>,<y>"` text frames (or a JSON object
//!   `{"x":..,"y":..}`).
//!
//! The static control page is served at `/`.

extern crate alloc;

use alloc::string::String;

use embassy_net::Stack;
use embassy_time::Duration;
use embedded_io_async::Read;
use picoserve::{
    extract::FromRequest,
    io::embedded_io_async as embedded_aio,
    request::{RequestBody, RequestParts},
    response::{
        ws::{Message, ReadMessageError, SocketRx, SocketTx, WebSocketCallback, WebSocketUpgrade},
        StatusCode,
    },
    url_encoded::{deserialize_form, UrlEncodedString},
    Router,
};
use serde::Deserialize;

use crate::utils::{
    controllers::intake::{self, parse_axis},
    frontend::HTML,
    math::drive::SteeringVector,
};

/// WebSocket sub-protocol the control page asks for.
pub const WS_PROTOCOL: &str = "drive";

/// Streams steering frames from one WebSocket client into the drive loop.
pub struct DriveSocket;

impl WebSocketCallback for DriveSocket {
    async fn run<Reader, Writer>(
        self,
        mut rx: SocketRx<Reader>,
        mut tx: SocketTx<Writer>,
    ) -> Result<(), Writer::Error>
    where
        Reader: embedded_aio::Read,
        Writer: embedded_aio::Write<Error = Reader::Error>,
    {
        let mut buffer = [0; 256];

        let close_reason = loop {
            match rx.next_message(&mut buffer).await {
                Ok(Message::Pong(_)) => continue,
                Ok(Message::Ping(data)) => tx.send_pong(data).await?,
                Ok(Message::Close(reason)) => {
                    tracing::info!(?reason, "websocket closed");
                    break None;
                }
                Ok(Message::Text(data)) => match intake::decode_message(data) {
                    Ok(vector) => intake::submit(vector),
                    Err(error) => tracing::warn!(%error, frame = data, "dropping drive frame"),
                },
                Ok(Message::Binary(data)) => match intake::decode_bytes(data) {
                    Ok(vector) => intake::submit(vector),
                    Err(error) => tracing::warn!(%error, "dropping binary drive frame"),
                },
                Err(error) => {
                    tracing::error!(?error, "websocket error");
                    let code = match error {
                        ReadMessageError::TextIsNotUtf8 => 1007,
                        ReadMessageError::ReservedOpcode(_) => 1003,
                        ReadMessageError::ReadFrameError(_)
                        | ReadMessageError::UnexpectedMessageStart
                        | ReadMessageError::MessageStartsWithContinuation => 1002,
                        ReadMessageError::Io(err) => return Err(err),
                    };
                    break Some((code, "Websocket Error"));
                }
            };
        };

        tx.close(close_reason).await
    }
}

/// Raw `x`/`y` query fields. Kept as text so a bad number can fall back to zero
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JoyQuery {
    x: String,
    y: String,
}

impl JoyQuery {
    pub fn vector(&self) -> SteeringVector {
        SteeringVector::new(parse_axis(&self.x), parse_axis(&self.y))
    }
}

/// Steering vector extracted from `/joy`. Never rejects.
pub struct JoyParams {
    pub vector: SteeringVector,
}

impl JoyParams {
    /// Decode the request query. A missing or malformed query is `(0, 0)`.
    pub fn from_query(query: Option<UrlEncodedString<'_>>) -> Self {
        let query = query
            .and_then(|q| deserialize_form::<JoyQuery>(q).ok())
            .unwrap_or_default();

        JoyParams {
            vector: query.vector(),
        }
    }
}

impl<'r, S> FromRequest<'r, S> for JoyParams {
    type Rejection = &'static str;

    async fn from_request<R: Read>(
        _state: &'r S,
        parts: RequestParts<'r>,
        _body: RequestBody<'r, R>,
    ) -> Result<Self, Self::Rejection> {
        Ok(JoyParams::from_query(parts.query()))
    }
}

/// Serve the control page, `/joy` and `/ws` on `port`.
pub async fn run(
    id: usize,
    port: u16,
    stack: Stack<'static>,
    config: Option<&'static picoserve::Config<Duration>>,
) -> ! {
    let default_config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        persistent_start_read_request: None,
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
    });

    let config = config.unwrap_or(&default_config);

    let router = Router::new()
        .route(
            "/",
            picoserve::routing::get(|| async {
                picoserve::response::Response::new(StatusCode::OK, HTML)
                    .with_headers([("Content-Type", "text/html; charset=utf-8")])
            }),
        )
        .route(
            "/joy",
            picoserve::routing::get(|params: JoyParams| async move {
                intake::submit(params.vector);
                "OK"
            }),
        )
        .route(
            "/ws",
            picoserve::routing::get(|upgrade: WebSocketUpgrade| async move {
                tracing::info!("new drive websocket");
                upgrade.on_upgrade(DriveSocket).with_protocol(WS_PROTOCOL)
            }),
        );

    if let Some(ip_cfg) = stack.config_v4() {
        tracing::info!("Starting server at {}:{}", ip_cfg.address, port);
    } else {
        tracing::warn!("Starting server on port {port}, but no IPv4 address is assigned yet!");
    }

    let (mut rx_buffer, mut tx_buffer, mut http_buffer) = ([0; 1024], [0; 1024], [0; 2048]);

    picoserve::listen_and_serve_with_state(
        id,
        &router,
        config,
        stack,
        port,
        &mut rx_buffer,
        &mut tx_buffer,
        &mut http_buffer,
        &(),
    )
    .await
}
