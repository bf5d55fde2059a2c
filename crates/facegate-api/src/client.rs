//! Extractor for the transport-level facts recorded with every scan.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{header::USER_AGENT, request::Parts},
};
use facegate_core::scan::ClientInfo;

/// Peer address and `User-Agent` of the calling station.
///
/// The peer address is only known when the server was started with
/// `into_make_service_with_connect_info`; otherwise it is left empty.
#[derive(Debug, Clone, Default)]
pub struct Client(pub ClientInfo);

impl<S: Send + Sync> FromRequestParts<S> for Client {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let origin = parts
      .extensions
      .get::<ConnectInfo<SocketAddr>>()
      .map(|ConnectInfo(addr)| addr.ip().to_string());
    let agent = parts
      .headers
      .get(USER_AGENT)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    Ok(Self(ClientInfo { origin, agent, location: None }))
  }
}
