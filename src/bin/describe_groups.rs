use std::{path::PathBuf, time::Duration};

use clap::Parser;
use samsa_groups::prelude::{
    BrokerAddress, BrokerConnection, ClusterBuilder, Error, GroupDescription, TcpConnection,
    TlsConnection, TlsConnectionOptions,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Describe Kafka consumer groups as JSON.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Bootstrap brokers as host:port
    #[arg(long, env = "KAFKA_BROKERS", value_delimiter = ',', required = true)]
    brokers: Vec<BrokerAddress>,

    #[arg(long, default_value = "samsa-groups")]
    client_id: String,

    /// Give up after this many milliseconds, connecting and lookups included
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// CA bundle to trust, enables TLS
    #[arg(long)]
    tls_ca_file: Option<PathBuf>,

    /// Client certificate, enables TLS
    #[arg(long, requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// Client private key, enables TLS
    #[arg(long, requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Consumer groups to describe
    #[arg(required = true)]
    group_ids: Vec<String>,
}

impl Cli {
    fn uses_tls(&self) -> bool {
        self.tls_ca_file.is_some() || self.tls_cert.is_some() || self.tls_key.is_some()
    }
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        // Display source code file paths
        .with_file(true)
        // Display source code line numbers
        .with_line_number(true)
        // Display the thread ID an event was recorded on
        .with_thread_ids(true)
        // Don't display the event's target (module path)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        let timeout = args.timeout_ms.map(Duration::from_millis);
        tokio::spawn(async move {
            match timeout {
                Some(timeout) => {
                    tokio::select! {
                        _ = tokio::time::sleep(timeout) => {
                            tracing::warn!("Timed out after {:?}", timeout)
                        }
                        _ = tokio::signal::ctrl_c() => tracing::warn!("Interrupted"),
                    }
                }
                None => {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::warn!("Interrupted");
                }
            }
            cancel.cancel();
        });
    }

    let descriptions = if args.uses_tls() {
        let options = TlsConnectionOptions {
            cafile: args.tls_ca_file.clone(),
            cert: args.tls_cert.clone(),
            key: args.tls_key.clone(),
            ..TlsConnectionOptions::new(args.brokers.clone())
        };
        describe::<TlsConnection>(options, &args, &cancel).await
    } else {
        describe::<TcpConnection>(args.brokers.clone(), &args, &cancel).await
    }
    .map_err(|err| tracing::error!("{}", err))?;

    let json = serde_json::to_string_pretty(&descriptions)
        .map_err(|err| tracing::error!("{:?}", err))?;
    println!("{json}");

    Ok(())
}

async fn describe<T: BrokerConnection>(
    config: T::ConnConfig,
    args: &Cli,
    cancel: &CancellationToken,
) -> Result<Vec<GroupDescription>, Error> {
    let cluster = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        cluster = ClusterBuilder::<T>::new(config)
            .client_id(args.client_id.clone())
            .build() => cluster?,
    };

    tracing::info!("Describing {} groups", args.group_ids.len());
    cluster.describe_consumer_groups(&args.group_ids, cancel).await
}
