//! # Ports
//!
//! - `inbound`: what a node answers (`PeerRequestHandler`)
//! - `outbound`: how a node reaches its peers (`PeerTransport`)

pub mod inbound;
pub mod outbound;

pub use inbound::PeerRequestHandler;
pub use outbound::{expect_response, MockPeerTransport, PeerTransport, SentGossip};
