//! Venue module - client implementation for the binary-options websocket API

pub mod client;
pub mod messages;
pub mod websocket;

pub use client::{WebSocketConnector, WebSocketVenueClient};
pub use websocket::VenueWebSocket;
