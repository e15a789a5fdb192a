//! Cluster handle used to look up and talk to group coordinators.
//!
//! A [`Cluster`] holds a single connection to a bootstrap broker which is
//! used for every coordinator lookup. Lookups are issued one at a time on
//! that connection, each under a fresh correlation id. A lookup that fails
//! on the wire or is abandoned part way takes the connection down with it,
//! and the next lookup reconnects. The [`Coordinator`]s it hands out are
//! plain addresses: each of them opens its own connection when asked to
//! describe groups, so every coordinator can be queried concurrently.
//!
//! ### Example
//! ```rust,ignore
//! let bootstrap_addrs = vec!["127.0.0.1:9092".parse()?];
//! let cluster = ClusterBuilder::<TcpConnection>::new(bootstrap_addrs)
//!     .client_id("ops-dashboard".to_owned())
//!     .build()
//!     .await?;
//!
//! let groups = vec!["orders".to_owned()];
//! let descriptions = cluster
//!     .describe_consumer_groups(&groups, &CancellationToken::new())
//!     .await?;
//! ```
use std::{
    marker::PhantomData,
    sync::atomic::{AtomicI32, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    error::Result,
    group::GroupDescription,
    network::{BrokerAddress, BrokerConnection},
    protocol,
    query::{self, CoordinatorResolver, GroupCoordinator},
    DEFAULT_CLIENT_ID, DEFAULT_CORRELATION_ID,
};

pub struct ClusterBuilder<T: BrokerConnection> {
    pub connection_params: T::ConnConfig,
    pub correlation_id: i32,
    pub client_id: String,
}

impl<T: BrokerConnection> ClusterBuilder<T> {
    /// Start a cluster builder. To complete, use the [`build`](Self::build) method.
    pub fn new(connection_params: T::ConnConfig) -> Self {
        Self {
            connection_params,
            correlation_id: DEFAULT_CORRELATION_ID,
            client_id: DEFAULT_CLIENT_ID.to_owned(),
        }
    }

    /// First correlation id handed out. Every request after it takes the next one.
    pub fn correlation_id(mut self, correlation_id: i32) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn client_id(mut self, client_id: String) -> Self {
        self.client_id = client_id;
        self
    }

    /// Connect to the first reachable bootstrap broker.
    pub async fn build(self) -> Result<Cluster<T>> {
        let conn = T::new(self.connection_params.clone()).await?;
        Ok(Cluster {
            connection_params: self.connection_params,
            bootstrap_conn: Mutex::new(Some(conn)),
            correlation_id: AtomicI32::new(self.correlation_id),
            client_id: self.client_id,
        })
    }
}

pub struct Cluster<T: BrokerConnection> {
    connection_params: T::ConnConfig,
    // None while a lookup is in flight or after one went wrong
    bootstrap_conn: Mutex<Option<T>>,
    correlation_id: AtomicI32,
    client_id: String,
}

impl<T: BrokerConnection> Cluster<T> {
    /// Describe consumer groups, see [`query::describe_consumer_groups`].
    pub async fn describe_consumer_groups(
        &self,
        group_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<GroupDescription>> {
        query::describe_consumer_groups(self, group_ids, cancel).await
    }

    fn next_correlation_id(&self) -> i32 {
        self.correlation_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl<T: BrokerConnection> CoordinatorResolver for Cluster<T> {
    type Coordinator = Coordinator<T>;

    #[instrument(level = "debug", skip(self))]
    async fn resolve_coordinator(&self, group_id: &str) -> Result<Coordinator<T>> {
        let mut bootstrap_conn = self.bootstrap_conn.lock().await;
        let mut conn = match bootstrap_conn.take() {
            Some(conn) => conn,
            None => {
                tracing::debug!("Reconnecting to the bootstrap brokers");
                T::new(self.connection_params.clone()).await?
            }
        };

        let correlation_id = self.next_correlation_id();
        let coordinator =
            find_coordinator(&mut conn, correlation_id, &self.client_id, group_id).await?;
        *bootstrap_conn = Some(conn);
        coordinator.is_error()?;

        Ok(Coordinator {
            node_id: coordinator.node_id,
            addr: coordinator.coordinator_addr()?,
            connection_params: self.connection_params.clone(),
            correlation_id: self.next_correlation_id(),
            client_id: self.client_id.clone(),
            conn: PhantomData,
        })
    }
}

/// A broker acting as group coordinator.
#[derive(Debug)]
pub struct Coordinator<T: BrokerConnection> {
    pub node_id: i32,
    pub addr: BrokerAddress,
    connection_params: T::ConnConfig,
    correlation_id: i32,
    client_id: String,
    conn: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: BrokerConnection> GroupCoordinator for Coordinator<T> {
    fn broker_id(&self) -> i32 {
        self.node_id
    }

    async fn describe_groups(&self, group_ids: &[String]) -> Result<Vec<protocol::DescribedGroup>> {
        tracing::debug!("Connecting to coordinator {} at {}", self.node_id, self.addr);
        let mut conn = T::from_addr(self.connection_params.clone(), self.addr.clone()).await?;

        let mut describe_groups_request =
            protocol::DescribeGroupsRequest::new(self.correlation_id, &self.client_id);
        for group_id in group_ids.iter() {
            describe_groups_request.add(group_id);
        }
        conn.send_request(&describe_groups_request).await?;

        let describe_groups_response = conn.receive_response().await?;
        let response =
            protocol::DescribeGroupsResponse::try_from(describe_groups_response.freeze())?;
        response.header.answers(self.correlation_id)?;

        Ok(response.groups)
    }
}

/// Ask the broker behind `conn` which broker coordinates `group_id`.
///
/// A response that does not answer `correlation_id` is an error: the
/// connection is out of step and should not be reused.
pub async fn find_coordinator<T: BrokerConnection>(
    conn: &mut T,
    correlation_id: i32,
    client_id: &str,
    group_id: &str,
) -> Result<protocol::FindCoordinatorResponse> {
    let find_coordinator_request =
        protocol::FindCoordinatorRequest::new(correlation_id, client_id, group_id);
    conn.send_request(&find_coordinator_request).await?;

    let find_coordinator_response = conn.receive_response().await?;

    let response = protocol::FindCoordinatorResponse::try_from(find_coordinator_response.freeze())?;
    response.header.answers(correlation_id)?;
    Ok(response)
}

#[cfg(test)]
mod test {
    use std::{
        collections::{HashMap, VecDeque},
        io::ErrorKind,
        sync::{
            atomic::{AtomicBool, AtomicUsize},
            Arc, Mutex as StdMutex,
        },
        time::Duration,
    };

    use bytes::{Buf, BufMut, Bytes, BytesMut};

    use super::*;
    use crate::{
        encode::ToByte,
        error::{Error, KafkaCode},
        group::fixtures::assignment,
        network::tcp::frame,
    };

    const BOOTSTRAP: &str = "bootstrap:9092";

    /// Canned broker answers keyed by the address they were sent to.
    #[derive(Clone, Debug, Default)]
    struct FakeWire {
        coordinators: HashMap<String, (KafkaCode, i32, &'static str, i32)>,
        groups: HashMap<String, Bytes>,
        sent: Arc<StdMutex<Vec<(String, i16, Vec<u8>)>>>,
        /// Bootstrap connections opened so far.
        connects: Arc<AtomicUsize>,
        /// The first lookup of this group never gets an answer.
        stall: Arc<StdMutex<Option<String>>>,
        /// The next lookup fails on the wire.
        reset: Arc<AtomicBool>,
        /// The next lookup is answered under another correlation id.
        skew: Arc<AtomicBool>,
    }

    /// Answers requests in the order they were sent, echoing their correlation id.
    #[derive(Debug)]
    struct FakeConnection {
        addr: String,
        wire: FakeWire,
        pending: VecDeque<Vec<u8>>,
    }

    #[async_trait]
    impl BrokerConnection for FakeConnection {
        type ConnConfig = FakeWire;

        async fn send_request<R: ToByte + Sync + Send>(&mut self, req: &R) -> Result<()> {
            let framed = frame(req)?;
            let mut body = &framed[4..];
            let api_key = body.get_i16();
            self.wire
                .sent
                .lock()
                .unwrap()
                .push((self.addr.clone(), api_key, framed.clone()));
            self.pending.push_back(framed);
            Ok(())
        }

        async fn receive_response(&mut self) -> Result<BytesMut> {
            let framed = self
                .pending
                .front()
                .cloned()
                .ok_or(Error::IoError(ErrorKind::UnexpectedEof))?;
            let mut body = &framed[4..];
            let api_key = body.get_i16();
            body.advance(2);
            let mut correlation_id = body.get_i32();

            if api_key == 10 {
                let group_id = last_string(&framed);
                let stalled = {
                    let mut stall = self.wire.stall.lock().unwrap();
                    if stall.as_deref() == Some(group_id.as_str()) {
                        stall.take()
                    } else {
                        None
                    }
                };
                if stalled.is_some() {
                    std::future::pending::<()>().await;
                }
                if self.wire.reset.swap(false, Ordering::SeqCst) {
                    self.pending.pop_front();
                    return Err(Error::IoError(ErrorKind::ConnectionReset));
                }
                if self.wire.skew.swap(false, Ordering::SeqCst) {
                    correlation_id += 100;
                }
            }
            self.pending.pop_front();

            let mut response = BytesMut::new();
            response.put_i32(correlation_id);
            if api_key == 10 {
                let group_id = last_string(&framed);
                let (code, node_id, host, port) = self.wire.coordinators[&group_id];
                response.put_i16(code as i16);
                response.put_i32(node_id);
                host.encode(&mut response)?;
                response.put_i32(port);
            } else {
                response.put_slice(&self.wire.groups[&self.addr]);
            }
            Ok(response)
        }

        async fn new(p: Self::ConnConfig) -> Result<Self> {
            p.connects.fetch_add(1, Ordering::SeqCst);
            Self::from_addr(p, BOOTSTRAP.parse()?).await
        }

        async fn from_addr(p: Self::ConnConfig, addr: BrokerAddress) -> Result<Self> {
            Ok(Self {
                addr: addr.to_string(),
                wire: p,
                pending: VecDeque::new(),
            })
        }
    }

    fn correlation_id(framed: &[u8]) -> i32 {
        let mut body = &framed[8..];
        body.get_i32()
    }

    // The group id is the trailing string of a find coordinator request.
    fn last_string(framed: &[u8]) -> String {
        let mut body = &framed[4..];
        body.advance(8);
        let client_len = body.get_u16() as usize;
        body.advance(client_len);
        let len = body.get_u16() as usize;
        String::from_utf8(body[..len].to_vec()).unwrap()
    }

    fn describe_groups_body(groups: &[(&str, &str, Bytes)]) -> Bytes {
        let mut buffer = BytesMut::new();
        buffer.put_i32(0);
        buffer.put_i32(groups.len() as i32);
        for (group_id, member_id, member_assignment) in groups {
            buffer.put_i16(0);
            group_id.encode(&mut buffer).unwrap();
            "Stable".encode(&mut buffer).unwrap();
            "consumer".encode(&mut buffer).unwrap();
            "range".encode(&mut buffer).unwrap();
            buffer.put_i32(1);
            for field in [*member_id, "client", "/10.0.0.9"] {
                field.encode(&mut buffer).unwrap();
            }
            buffer.put_i32(-1);
            member_assignment.as_ref().encode(&mut buffer).unwrap();
        }
        buffer.freeze()
    }

    fn wire() -> FakeWire {
        let mut wire = FakeWire::default();
        wire.coordinators
            .insert("orders".to_owned(), (KafkaCode::None, 1, "broker-1", 9092));
        wire.coordinators
            .insert("payments".to_owned(), (KafkaCode::None, 2, "broker-2", 9092));
        wire.coordinators
            .insert("refunds".to_owned(), (KafkaCode::None, 1, "broker-1", 9092));
        wire.coordinators.insert(
            "loading".to_owned(),
            (KafkaCode::CoordinatorLoadInProgress, -1, "", -1),
        );
        wire.groups.insert(
            "broker-1:9092".to_owned(),
            describe_groups_body(&[
                ("orders", "m1", assignment(&[("orders", &[1, 0])])),
                ("refunds", "m2", assignment(&[("refunds", &[0])])),
            ]),
        );
        wire.groups.insert(
            "broker-2:9092".to_owned(),
            describe_groups_body(&[("payments", "m3", Bytes::new())]),
        );
        wire
    }

    #[tokio::test]
    async fn resolve_coordinator() {
        let cluster = ClusterBuilder::<FakeConnection>::new(wire())
            .client_id("tests".to_owned())
            .build()
            .await
            .unwrap();

        let coordinator = cluster.resolve_coordinator("payments").await.unwrap();

        assert_eq!(coordinator.broker_id(), 2);
        assert_eq!(coordinator.addr.to_string(), "broker-2:9092");
    }

    #[tokio::test]
    async fn resolve_coordinator_error() {
        let cluster = ClusterBuilder::<FakeConnection>::new(wire())
            .build()
            .await
            .unwrap();

        let err = cluster.resolve_coordinator("loading").await.unwrap_err();

        assert_eq!(
            err,
            Error::KafkaError(KafkaCode::CoordinatorLoadInProgress)
        );
    }

    #[tokio::test]
    async fn describe_across_coordinators() {
        let wire = wire();
        let sent = wire.sent.clone();
        let cluster = ClusterBuilder::<FakeConnection>::new(wire)
            .build()
            .await
            .unwrap();

        let groups = vec![
            "refunds".to_owned(),
            "payments".to_owned(),
            "orders".to_owned(),
        ];
        let described = cluster
            .describe_consumer_groups(&groups, &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<&str> = described.iter().map(|d| d.group_id.as_str()).collect();
        assert_eq!(ids, vec!["orders", "payments", "refunds"]);
        assert_eq!(described[0].members[0].assignments[0].partition_ids, vec![0, 1]);
        assert!(described[1].members[0].assignments.is_empty());

        let sent = sent.lock().unwrap();
        let lookups = sent.iter().filter(|(addr, key, _)| addr == BOOTSTRAP && *key == 10);
        assert_eq!(lookups.count(), 3);
        let mut describes: Vec<&str> = sent
            .iter()
            .filter(|(_, key, _)| *key == 15)
            .map(|(addr, _, _)| addr.as_str())
            .collect();
        describes.sort();
        assert_eq!(describes, vec!["broker-1:9092", "broker-2:9092"]);

        let mut correlation_ids: Vec<i32> = sent
            .iter()
            .map(|(_, _, framed)| correlation_id(framed))
            .collect();
        correlation_ids.sort();
        correlation_ids.dedup();
        assert_eq!(correlation_ids.len(), sent.len());
    }

    #[tokio::test]
    async fn abandoned_lookup_does_not_answer_the_next() {
        let wire = wire();
        *wire.stall.lock().unwrap() = Some("orders".to_owned());
        let connects = wire.connects.clone();
        let cluster = ClusterBuilder::<FakeConnection>::new(wire)
            .build()
            .await
            .unwrap();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), cluster.resolve_coordinator("orders"))
                .await;
        assert!(abandoned.is_err());

        let coordinator = cluster.resolve_coordinator("payments").await.unwrap();
        assert_eq!(coordinator.broker_id(), 2);
        assert_eq!(coordinator.addr.to_string(), "broker-2:9092");
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reconnects_after_io_error() {
        let wire = wire();
        wire.reset.store(true, Ordering::SeqCst);
        let connects = wire.connects.clone();
        let cluster = ClusterBuilder::<FakeConnection>::new(wire)
            .build()
            .await
            .unwrap();

        let err = cluster.resolve_coordinator("orders").await.unwrap_err();
        assert_eq!(err, Error::IoError(ErrorKind::ConnectionReset));

        let coordinator = cluster.resolve_coordinator("orders").await.unwrap();
        assert_eq!(coordinator.broker_id(), 1);
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn kafka_error_keeps_the_connection() {
        let wire = wire();
        let connects = wire.connects.clone();
        let cluster = ClusterBuilder::<FakeConnection>::new(wire)
            .build()
            .await
            .unwrap();

        assert!(cluster.resolve_coordinator("loading").await.is_err());
        assert!(cluster.resolve_coordinator("orders").await.is_ok());
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejects_mismatched_correlation_id() {
        let wire = wire();
        wire.skew.store(true, Ordering::SeqCst);
        let connects = wire.connects.clone();
        let cluster = ClusterBuilder::<FakeConnection>::new(wire)
            .correlation_id(7)
            .build()
            .await
            .unwrap();

        let err = cluster.resolve_coordinator("orders").await.unwrap_err();
        assert_eq!(
            err,
            Error::CorrelationIdMismatch {
                expected: 7,
                received: 107
            }
        );

        let coordinator = cluster.resolve_coordinator("payments").await.unwrap();
        assert_eq!(coordinator.broker_id(), 2);
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }
}
