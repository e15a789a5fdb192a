//! Connection & communication with a broker.
//!
//! # Network Module
//!
//! Kafka uses a binary protocol over TCP. The protocol defines all APIs as
//! request response message pairs. All messages are size delimited and are
//! made up of the primitive types found in the encode and parser modules.
//!
//! The server guarantees that on a single TCP connection, requests will
//! be processed in the order they are sent and responses will return in
//! that order as well. Describing groups only ever needs one request in
//! flight per connection: the bootstrap connection serialises coordinator
//! lookups, and each coordinator gets a connection of its own for its
//! single describe request.
//!
//! Two transports are provided, plain [`tcp`] and [`tls`]. Anything
//! implementing [`BrokerConnection`] can be plugged into a
//! [`Cluster`](crate::cluster::Cluster).
use std::{fmt, str::FromStr};

use async_trait::async_trait;
use bytes::BytesMut;

use crate::{
    encode::ToByte,
    error::{Error, Result},
};

pub mod tcp;
pub mod tls;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for BrokerAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidBrokerAddress(s.to_owned()))?;
        if host.is_empty() {
            return Err(Error::InvalidBrokerAddress(s.to_owned()));
        }
        let port = port
            .parse()
            .map_err(|_| Error::InvalidBrokerAddress(s.to_owned()))?;
        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }
}

#[async_trait]
pub trait BrokerConnection: Send + Sized + 'static {
    type ConnConfig: Clone + fmt::Debug + Send + Sync + 'static;

    async fn send_request<R: ToByte + Sync + Send>(&mut self, req: &R) -> Result<()>;
    async fn receive_response(&mut self) -> Result<BytesMut>;
    /// Connect to the first reachable broker of the configuration.
    async fn new(p: Self::ConnConfig) -> Result<Self>;
    /// Connect to a specific broker, reusing the rest of the configuration.
    async fn from_addr(p: Self::ConnConfig, addr: BrokerAddress) -> Result<Self>;
}
