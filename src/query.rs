//! Describe consumer groups across every coordinator that owns them.
//!
//! Each group is owned by exactly one coordinator broker. Describing a set
//! of groups therefore goes through three steps:
//!
//! 1. resolve every group to its coordinator and bucket the groups by
//!    broker, so each broker is asked exactly once;
//! 2. fire one describe request per broker concurrently, consuming the
//!    answers as they arrive while watching the caller's cancellation token;
//! 3. normalize and order everything once all brokers have answered.
//!
//! Any failure along the way (a lookup, a broker request, a group level
//! error code or cancellation) fails the whole call. Nothing partial is
//! ever returned. The cancellation token is watched from the first lookup
//! on. When the call bails out early the remaining lookups and broker
//! requests are abandoned.
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    error::{Error, Result},
    group::{normalize_groups, sort_descriptions, GroupDescription},
    protocol::DescribedGroup,
};

/// A broker coordinating one or more consumer groups.
#[async_trait]
pub trait GroupCoordinator: Send + Sync + 'static {
    fn broker_id(&self) -> i32;

    /// Describe the given groups with a single request.
    async fn describe_groups(&self, group_ids: &[String]) -> Result<Vec<DescribedGroup>>;
}

/// Finds the coordinator of a consumer group.
#[async_trait]
pub trait CoordinatorResolver: Send + Sync {
    type Coordinator: GroupCoordinator;

    async fn resolve_coordinator(&self, group_id: &str) -> Result<Self::Coordinator>;
}

/// The groups that a single broker will be asked about.
#[derive(Debug)]
pub struct CoordinatorBatch<C> {
    pub broker_id: i32,
    pub coordinator: C,
    pub group_ids: Vec<String>,
}

/// Resolve each group to its coordinator and batch the groups by broker.
///
/// Repeated group ids are only resolved once. The first failed lookup is
/// returned as is. Batches come back ordered by broker id with the group
/// ids in the order they were first requested.
#[instrument(level = "debug", skip(resolver))]
pub async fn bucket_by_coordinator<R: CoordinatorResolver>(
    resolver: &R,
    group_ids: &[String],
) -> Result<Vec<CoordinatorBatch<R::Coordinator>>> {
    let mut batches: BTreeMap<i32, CoordinatorBatch<R::Coordinator>> = BTreeMap::new();
    let mut seen = HashSet::new();

    for group_id in group_ids.iter() {
        if !seen.insert(group_id.as_str()) {
            continue;
        }

        let coordinator = resolver.resolve_coordinator(group_id).await?;
        let broker_id = coordinator.broker_id();
        tracing::debug!("Group {} is coordinated by broker {}", group_id, broker_id);

        batches
            .entry(broker_id)
            .or_insert_with(|| CoordinatorBatch {
                broker_id,
                coordinator,
                group_ids: vec![],
            })
            .group_ids
            .push(group_id.clone());
    }

    Ok(batches.into_values().collect())
}

/// Send every batch to its coordinator concurrently.
///
/// Outcomes are normalized in the order they complete. The cancellation
/// token is checked before every outcome so a fired token always wins,
/// even over answers that are already waiting. Returning drops the
/// [`JoinSet`], which aborts the requests that are still in flight.
#[instrument(level = "debug", skip_all)]
pub async fn query_coordinators<C: GroupCoordinator>(
    batches: Vec<CoordinatorBatch<C>>,
    cancel: &CancellationToken,
) -> Result<Vec<GroupDescription>> {
    let mut set = JoinSet::new();

    for batch in batches.into_iter() {
        set.spawn(async move {
            let CoordinatorBatch {
                broker_id,
                coordinator,
                group_ids,
            } = batch;
            tracing::debug!(
                "Describing {} groups on broker {}",
                group_ids.len(),
                broker_id
            );
            let groups = coordinator.describe_groups(&group_ids).await;
            (broker_id, group_ids, groups)
        });
    }

    let mut descriptions = vec![];
    loop {
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Cancelled with {} brokers outstanding", set.len());
                return Err(Error::Cancelled);
            }
            joined = set.join_next() => joined,
        };

        let Some(joined) = joined else { break };
        let (broker_id, group_ids, groups) =
            joined.map_err(|err| Error::WorkerFailed(err.to_string()))?;

        let described = groups
            .and_then(|groups| normalize_groups(broker_id, &group_ids, groups))
            .map_err(|err| {
                tracing::error!("ERROR: Broker {} failed: {}", broker_id, err);
                Error::BrokerRequestFailed {
                    broker_id,
                    source: Box::new(err),
                }
            })?;
        descriptions.extend(described);
    }

    Ok(descriptions)
}

/// Describe the given consumer groups, wherever they are coordinated.
///
/// The result holds one description per distinct group id, ordered by
/// group id. An empty input returns an empty result without contacting
/// the cluster. Cancelling the token interrupts the coordinator lookups as
/// well as the describe requests.
///
/// ### Example
/// ```rust,ignore
/// let cancel = CancellationToken::new();
/// let groups = vec!["orders".to_owned(), "payments".to_owned()];
/// let descriptions = describe_consumer_groups(&cluster, &groups, &cancel).await?;
/// ```
pub async fn describe_consumer_groups<R: CoordinatorResolver>(
    resolver: &R,
    group_ids: &[String],
    cancel: &CancellationToken,
) -> Result<Vec<GroupDescription>> {
    if group_ids.is_empty() {
        return Ok(vec![]);
    }

    let batches = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("Cancelled while looking up coordinators");
            return Err(Error::Cancelled);
        }
        batches = bucket_by_coordinator(resolver, group_ids) => batches?,
    };
    tracing::debug!(
        "Describing {} groups across {} coordinators",
        group_ids.len(),
        batches.len()
    );

    let mut descriptions = query_coordinators(batches, cancel).await?;
    sort_descriptions(&mut descriptions);

    Ok(descriptions)
}
