use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Transport peer of the request, when the server was started with connect
/// info. Absent peers are not an error; the client address then falls back
/// to forwarded headers or stays empty.
#[derive(Debug, Clone, Copy)]
pub struct ClientPeer(pub Option<SocketAddr>);

impl<S> FromRequestParts<S> for ClientPeer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientPeer(peer))
    }
}
