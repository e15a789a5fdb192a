use std::io;
use std::io::ErrorKind;

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tokio::net::TcpStream;
use tracing::instrument;

use crate::{
    encode::ToByte,
    error::{Error, Result},
};

use super::{BrokerAddress, BrokerConnection};

/// Plain TCP connection to a Kafka/Redpanda broker.
///
/// The cluster keeps one of these to the bootstrap broker for
/// coordinator lookups and opens one per coordinator when it
/// describes the groups that coordinator owns.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
}

impl TcpConnection {
    /// Connect to the first reachable Kafka/Redpanda broker.
    ///
    /// ### Example
    /// ```rust,ignore
    /// let bootstrap_addrs = vec!["localhost:9092".parse()?];
    /// let conn = samsa_groups::prelude::TcpConnection::connect(bootstrap_addrs).await?;
    /// ```
    pub async fn connect(bootstrap_addrs: Vec<BrokerAddress>) -> Result<Self> {
        let mut propagated_err: Option<Error> = None;
        for bootstrap_addr in bootstrap_addrs.iter() {
            tracing::debug!("Connecting to {}", bootstrap_addr);
            match TcpStream::connect((bootstrap_addr.host.as_str(), bootstrap_addr.port)).await {
                Ok(stream) => return Ok(Self { stream }),
                Err(e) => {
                    tracing::warn!("Could not connect to {}: {:?}", bootstrap_addr, e);
                    propagated_err = Some(Error::IoError(e.kind()));
                }
            }
        }
        Err(propagated_err.unwrap_or(Error::IoError(ErrorKind::NotFound)))
    }

    #[instrument(name = "network-read", level = "trace", skip(self))]
    async fn read(&mut self, size: usize) -> Result<BytesMut> {
        let mut buf = BytesMut::zeroed(size);
        let mut index = 0_usize;
        while index != size {
            // Wait for the socket to be readable
            self.stream.readable().await?;

            // Try to read data, this may still fail with `WouldBlock`
            // if the readiness event is a false positive.
            match self.stream.try_read(&mut buf[index..]) {
                Ok(0) => {
                    tracing::error!("ERROR: Socket closed with {} bytes left", size - index);
                    return Err(Error::IoError(ErrorKind::UnexpectedEof));
                }
                Ok(n) => {
                    index += n;
                    tracing::trace!("Read {} bytes, {} left", n, size - index);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    tracing::trace!("WouldBlock on read");
                }
                Err(e) => {
                    tracing::error!("ERROR: Reading on Socket {:?}", e);
                    return Err(Error::IoError(e.kind()));
                }
            }
        }
        Ok(buf)
    }

    #[instrument(name = "network-write", level = "trace", skip(self, buf))]
    async fn write(&mut self, buf: &[u8]) -> Result<()> {
        let mut index = 0_usize;
        while index != buf.len() {
            // Wait for the socket to be writable
            self.stream.writable().await?;

            match self.stream.try_write(&buf[index..]) {
                Ok(n) => {
                    index += n;
                    tracing::trace!("Wrote {} bytes, {} left", n, buf.len() - index);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    tracing::trace!("WouldBlock on write");
                }
                Err(e) => {
                    tracing::error!("ERROR: Writing to Socket {:?}", e);
                    return Err(Error::IoError(e.kind()));
                }
            }
        }
        Ok(())
    }
}

/// Prefix an encoded request with its size.
pub(crate) fn frame<R: ToByte>(req: &R) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(64);

    buffer.extend_from_slice(&[0, 0, 0, 0]);
    req.encode(&mut buffer)?;

    let size = i32::try_from(buffer.len() - 4).map_err(|_| Error::EncodingError)?;
    size.encode(&mut &mut buffer[..])?;

    Ok(buffer)
}

#[async_trait]
impl BrokerConnection for TcpConnection {
    type ConnConfig = Vec<BrokerAddress>;

    /// Serialize a request and send it to the broker.
    ///
    /// Responses come back in the order requests are sent, so every
    /// call should be followed by a [`receive_response`](Self::receive_response).
    async fn send_request<R: ToByte + Sync + Send>(&mut self, req: &R) -> Result<()> {
        let buffer = frame(req)?;
        tracing::trace!("Sending bytes {}", buffer.len());
        self.write(&buffer).await
    }

    /// Pull one size delimited response off the socket as raw bytes.
    async fn receive_response(&mut self) -> Result<BytesMut> {
        // figure out the message size
        let mut size = self.read(4).await?;

        let length = size.get_u32();
        tracing::trace!("Reading {} bytes", length);
        self.read(length as usize).await
    }

    async fn new(p: Self::ConnConfig) -> Result<Self> {
        Self::connect(p).await
    }

    async fn from_addr(_: Self::ConnConfig, addr: BrokerAddress) -> Result<Self> {
        Self::connect(vec![addr]).await
    }
}
