//! # Samsa Groups
//! Rust-native discovery of Kafka consumer groups.
//!
//! Given a set of consumer group ids, this crate finds the coordinator
//! broker of every group, asks each coordinator about all of its groups in
//! a single request, and hands back one normalized description per group:
//! its state, protocol type and members along with the topic partitions
//! each member was assigned. It speaks the Kafka protocol directly, with
//! no librdkafka underneath.
//!
//! ## Goals
//! - One round trip per coordinator, all coordinators queried at once
//! - All-or-nothing results, never a partial listing
//! - Stable output: the same cluster state always yields the same result
//! - Leverage best in class libraries such as Tokio, Nom to do the heavy lifting
//!
//! ## Table of contents
//! - [Getting started](#getting-started)
//!     - [Describing groups](#describing-groups)
//!     - [Command line](#command-line)
//! - [Resources](#resources)
//!
//! ## Getting started
//! Include the following snippet in your `Cargo.toml` dependencies:
//! ```toml
//! samsa-groups = "0.1"
//! ```
//!
//! ### Describing groups
//! Start with a [`ClusterBuilder`](prelude::ClusterBuilder) to connect to the
//! cluster, then describe any number of groups. The call can be abandoned
//! at any point by cancelling the token.
//! ```rust,ignore
//! let bootstrap_addrs = vec!["127.0.0.1:9092".parse()?];
//!
//! let cluster = samsa_groups::prelude::ClusterBuilder::<TcpConnection>::new(bootstrap_addrs)
//!     .build()
//!     .await?;
//!
//! let cancel = tokio_util::sync::CancellationToken::new();
//! let groups = vec!["orders".to_string(), "payments".to_string()];
//! for group in cluster.describe_consumer_groups(&groups, &cancel).await? {
//!     println!("{} is {} with {} members", group.group_id, group.state, group.members.len());
//! }
//! ```
//!
//! ### Command line
//! The `describe-groups` binary prints the descriptions as JSON.
//! ```text
//! KAFKA_BROKERS=127.0.0.1:9092 describe-groups orders payments --timeout-ms 5000
//! ```
//!
//! ## Resources
//! - [Kafka Protocol Spec](https://kafka.apache.org/protocol.html)
//! - [Confluence Docs](https://cwiki.apache.org/confluence/display/KAFKA/A+Guide+To+The+Kafka+Protocol)

mod cluster;
mod encode;
mod error;
mod group;
mod network;
mod parser;
mod protocol;
mod query;
mod utils;

const DEFAULT_CORRELATION_ID: i32 = 1;
const DEFAULT_CLIENT_ID: &str = "samsa-groups";

pub mod prelude {
    //! Main export of various structures and methods
    //!
    //! # Describing groups
    //!
    //! [`Cluster::describe_consumer_groups`] is the usual entry point. It is
    //! a thin wrapper over [`describe_consumer_groups`], which works with
    //! anything implementing [`CoordinatorResolver`]. The steps it is built
    //! from are exported as well:
    //! - [`bucket_by_coordinator`] resolves groups and batches them per broker
    //! - [`query_coordinators`] describes every batch concurrently
    //!
    //! # Connections
    //! [`TcpConnection`] and [`TlsConnection`] implement [`BrokerConnection`].
    //!
    //! # Protocol
    //! For those looking to handle the specific requests and responses
    //! themselves, visit the [protocol module](protocol).
    //!
    //! ### Find Coordinator
    //! [`find_coordinator`] asks a broker which broker coordinates a group.
    //! #### Example
    //! ```rust,ignore
    //! let coordinator = find_coordinator(&mut conn, correlation_id, client_id, group_id).await?;
    //! let addr = coordinator.coordinator_addr()?;
    //! ```
    pub use crate::cluster::{find_coordinator, Cluster, ClusterBuilder, Coordinator};
    pub use crate::error::{Error, KafkaCode, Result};
    pub use crate::group::{
        GroupDescription, GroupMemberAssignment, GroupMemberDescription, ProtocolType,
        CONSUMER_PROTOCOL_TYPE,
    };
    pub use crate::network::{
        tcp::TcpConnection,
        tls::{TlsConnection, TlsConnectionOptions},
        BrokerAddress, BrokerConnection,
    };
    pub use crate::query::{
        bucket_by_coordinator, describe_consumer_groups, query_coordinators, CoordinatorBatch,
        CoordinatorResolver, GroupCoordinator,
    };

    pub use bytes;

    pub mod encode {
        pub use crate::encode::*;
    }

    pub mod protocol {
        pub use crate::protocol::*;
    }
}
