//! WebSocket transport for the venue's request/response API

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::common::errors::{Result, TraderError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A single websocket connection to the venue
///
/// Requests are tagged with an increasing `req_id` and answered one at a
/// time; frames belonging to other requests are skipped.
pub struct VenueWebSocket {
    stream: WsStream,
    next_req_id: u64,
    request_timeout: Duration,
    is_connected: bool,
}

impl VenueWebSocket {
    /// Build the endpoint URL carrying the registered application id
    pub fn endpoint(base_url: &str, app_id: &str) -> Result<Url> {
        let mut url = Url::parse(base_url)
            .map_err(|e| TraderError::Configuration(format!("invalid websocket url: {}", e)))?;
        url.query_pairs_mut().append_pair("app_id", app_id);
        Ok(url)
    }

    /// Open a connection, bounded by `request_timeout`
    #[instrument(skip_all, fields(host = url.host_str().unwrap_or_default()))]
    pub async fn connect(url: &Url, request_timeout: Duration) -> Result<Self> {
        debug!("Connecting to venue WebSocket");

        let (stream, _response) = timeout(request_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                TraderError::Timeout(format!("connect after {:?}", request_timeout))
            })?
            .map_err(|e| TraderError::WebSocketConnection(e.to_string()))?;

        info!("Venue WebSocket connection established");

        Ok(Self {
            stream,
            next_req_id: 1,
            request_timeout,
            is_connected: true,
        })
    }

    /// Send `payload` and wait for the response with the matching `req_id`
    pub async fn request<T: Serialize>(&mut self, payload: &T) -> Result<Value> {
        let req_id = self.next_req_id;
        self.next_req_id += 1;

        let mut value = serde_json::to_value(payload)?;
        let object = value.as_object_mut().ok_or_else(|| {
            TraderError::InvalidResponse("request payload is not a JSON object".to_string())
        })?;
        object.insert("req_id".to_string(), Value::from(req_id));

        let limit = self.request_timeout;
        match timeout(limit, self.exchange(req_id, value.to_string())).await {
            Ok(result) => result,
            Err(_) => {
                self.is_connected = false;
                Err(TraderError::Timeout(format!(
                    "request {} after {:?}",
                    req_id, limit
                )))
            }
        }
    }

    async fn exchange(&mut self, req_id: u64, text: String) -> Result<Value> {
        if let Err(e) = self.stream.send(Message::Text(text)).await {
            self.is_connected = false;
            return Err(e.into());
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let response: Value = serde_json::from_str(&text)?;
                    if response.get("req_id").and_then(Value::as_u64) == Some(req_id) {
                        return Ok(response);
                    }
                    debug!("Skipping frame for another request: {}", text);
                }
                Some(Ok(Message::Ping(_))) => {
                    // Pong is queued by tungstenite and flushed on the next write
                    debug!("Received Ping");
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("Venue closed WebSocket: {:?}", frame);
                    self.is_connected = false;
                    return Err(TraderError::WebSocketCommunication(
                        "connection closed by venue".to_string(),
                    ));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error: {}", e);
                    self.is_connected = false;
                    return Err(e.into());
                }
                None => {
                    self.is_connected = false;
                    return Err(TraderError::WebSocketCommunication(
                        "stream ended".to_string(),
                    ));
                }
            }
        }
    }

    /// Close the connection, bounded by `request_timeout`; failures are only logged
    pub async fn close(&mut self) {
        if self.is_connected {
            match timeout(self.request_timeout, self.stream.close(None)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("Error while closing WebSocket: {}", e),
                Err(_) => warn!("WebSocket close timed out after {:?}", self.request_timeout),
            }
        }
        self.is_connected = false;
    }
}
