use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, rustls, TlsConnector};

use crate::{
    encode::ToByte,
    error::{Error, Result},
};

use super::{tcp::frame, BrokerAddress, BrokerConnection};

/// TLS connection to a Kafka/Redpanda broker.
pub struct TlsConnection {
    stream: TlsStream<TcpStream>,
}

#[derive(Clone, Debug, Default)]
pub struct TlsConnectionOptions {
    pub broker_addresses: Vec<BrokerAddress>,
    /// CA bundle to trust. The webpki roots are used when missing.
    pub cafile: Option<PathBuf>,
    /// Client certificate chain, for brokers that require mutual TLS.
    pub cert: Option<PathBuf>,
    /// Private key belonging to `cert`.
    pub key: Option<PathBuf>,
}

impl TlsConnectionOptions {
    pub fn new(broker_addresses: Vec<BrokerAddress>) -> Self {
        Self {
            broker_addresses,
            ..Default::default()
        }
    }

    fn client_config(&self) -> Result<rustls::ClientConfig> {
        let mut root_cert_store = rustls::RootCertStore::empty();
        if let Some(cafile) = &self.cafile {
            for cert in load_certs(cafile)? {
                root_cert_store
                    .add(cert)
                    .map_err(|err| Error::TlsError(err.to_string()))?;
            }
        } else {
            root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        let builder = rustls::ClientConfig::builder().with_root_certificates(root_cert_store);
        match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => builder
                .with_client_auth_cert(load_certs(cert)?, load_key(key)?)
                .map_err(|err| Error::TlsError(err.to_string())),
            (None, None) => Ok(builder.with_no_client_auth()),
            _ => Err(Error::TlsError(
                "client certificate and key must be given together".to_owned(),
            )),
        }
    }
}

impl TlsConnection {
    pub async fn connect(options: TlsConnectionOptions) -> Result<Self> {
        tracing::debug!(
            "Starting TLS connection to {} brokers",
            options.broker_addresses.len()
        );
        let connector = TlsConnector::from(Arc::new(options.client_config()?));

        let mut propagated_err: Option<Error> = None;
        for addr in options.broker_addresses.iter() {
            tracing::debug!("Connecting to {}", addr);
            let tcp = match TcpStream::connect((addr.host.as_str(), addr.port)).await {
                Ok(tcp) => tcp,
                Err(e) => {
                    tracing::warn!("Could not connect to {}: {:?}", addr, e);
                    propagated_err = Some(Error::IoError(e.kind()));
                    continue;
                }
            };

            let domain = ServerName::try_from(addr.host.clone())
                .map_err(|_| Error::InvalidBrokerAddress(addr.to_string()))?;
            let stream = connector.connect(domain, tcp).await?;
            tracing::debug!("TLS session established with {}", addr);

            return Ok(Self { stream });
        }

        Err(propagated_err.unwrap_or(Error::IoError(ErrorKind::NotFound)))
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut BufReader::new(File::open(path)?))
        .collect::<std::io::Result<Vec<_>>>()?;
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut BufReader::new(File::open(path)?))?.ok_or_else(|| {
        Error::TlsError(format!("no private key found in {}", path.display()))
    })
}

#[async_trait]
impl BrokerConnection for TlsConnection {
    type ConnConfig = TlsConnectionOptions;

    async fn send_request<R: ToByte + Sync + Send>(&mut self, req: &R) -> Result<()> {
        let buffer = frame(req)?;
        tracing::trace!("Sending bytes {}", buffer.len());
        self.stream.write_all(&buffer).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn receive_response(&mut self) -> Result<BytesMut> {
        // figure out the message size
        let length = self.stream.read_u32().await?;

        tracing::trace!("Reading {} bytes", length);
        let mut buffer = BytesMut::zeroed(length as usize);
        self.stream.read_exact(&mut buffer).await?;

        Ok(buffer)
    }

    async fn new(p: Self::ConnConfig) -> Result<Self> {
        Self::connect(p).await
    }

    async fn from_addr(p: Self::ConnConfig, addr: BrokerAddress) -> Result<Self> {
        Self::connect(TlsConnectionOptions {
            broker_addresses: vec![addr],
            ..p
        })
        .await
    }
}
