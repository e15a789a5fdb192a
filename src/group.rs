//! Normalized consumer group descriptions.
//!
//! Raw [`DescribedGroup`] records coming back from a coordinator are
//! turned into [`GroupDescription`]s here. Member assignments are only
//! decoded for groups using the `consumer` protocol type, since other
//! protocol types (e.g. schema registry or connect clusters) do not follow
//! the consumer assignment schema.
//!
//! Everything produced by this module is fully ordered: members by id,
//! assignments by topic name and partitions ascending. Groups are ordered
//! once every coordinator has answered, see [`sort_descriptions`].
use serde_derive::Serialize;

use crate::{
    error::{Error, KafkaCode, Result},
    protocol::{DescribedGroup, DescribedGroupMember},
    utils::to_string,
};

pub const CONSUMER_PROTOCOL_TYPE: &str = "consumer";

/// A consumer group as seen by its coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDescription {
    pub group_id: String,
    pub state: String,
    pub protocol_type: String,
    /// The assignor in use (e.g. `range`). Not part of the serialized form.
    #[serde(skip)]
    pub protocol: String,
    pub members: Vec<GroupMemberDescription>,
}

/// A member (e.g. a connected client) of a consumer group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberDescription {
    pub id: String,
    pub client_id: String,
    pub client_host: String,
    pub assignments: Vec<GroupMemberAssignment>,
}

/// Partitions of one topic assigned to a group member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberAssignment {
    pub topic_name: String,
    pub partition_ids: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolType {
    Consumer,
    Other(String),
}

impl From<&str> for ProtocolType {
    fn from(protocol_type: &str) -> Self {
        match protocol_type {
            CONSUMER_PROTOCOL_TYPE => ProtocolType::Consumer,
            other => ProtocolType::Other(other.to_owned()),
        }
    }
}

impl ProtocolType {
    fn assignments(
        &self,
        member: &DescribedGroupMember,
        member_id: &str,
        client_id: &str,
    ) -> Vec<GroupMemberAssignment> {
        match self {
            ProtocolType::Consumer => decode_assignments(member, member_id, client_id),
            ProtocolType::Other(_) => vec![],
        }
    }
}

/// Convert the groups one broker described into their normalized form.
///
/// `requested` are the group ids that were sent to this broker. A group
/// reporting an error code, or one that was never asked for, fails the
/// whole batch.
pub fn normalize_groups(
    broker_id: i32,
    requested: &[String],
    groups: Vec<DescribedGroup>,
) -> Result<Vec<GroupDescription>> {
    groups
        .iter()
        .map(|group| {
            let description = normalize_group(group)?;
            if !requested.contains(&description.group_id) {
                tracing::error!(
                    "Broker {} described group {} which was not requested",
                    broker_id,
                    description.group_id
                );
                return Err(Error::UnrequestedGroup {
                    broker_id,
                    group_id: description.group_id,
                });
            }
            Ok(description)
        })
        .collect()
}

fn normalize_group(group: &DescribedGroup) -> Result<GroupDescription> {
    let group_id = to_string(&group.group_id)?;
    if group.error_code != KafkaCode::None {
        tracing::error!("Group {} reported {:?}", group_id, group.error_code);
        return Err(Error::GroupError {
            group_id,
            code: group.error_code,
        });
    }

    let protocol_type = to_string(&group.protocol_type)?;
    let members = normalize_members(
        &group.members,
        &ProtocolType::from(protocol_type.as_str()),
    )?;

    Ok(GroupDescription {
        group_id,
        state: to_string(&group.group_state)?,
        protocol_type,
        protocol: to_string(&group.protocol_data)?,
        members,
    })
}

fn normalize_members(
    members: &[DescribedGroupMember],
    protocol_type: &ProtocolType,
) -> Result<Vec<GroupMemberDescription>> {
    let mut described = members
        .iter()
        .map(|member| {
            let id = to_string(&member.member_id)?;
            let client_id = to_string(&member.client_id)?;
            let assignments = protocol_type.assignments(member, &id, &client_id);
            Ok(GroupMemberDescription {
                client_host: to_string(&member.client_host)?,
                id,
                client_id,
                assignments,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    described.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(described)
}

// A payload that does not decode leaves the member without assignments
// rather than failing the group.
fn decode_assignments(
    member: &DescribedGroupMember,
    member_id: &str,
    client_id: &str,
) -> Vec<GroupMemberAssignment> {
    // members that are still rebalancing have nothing assigned yet
    if member.member_assignment.is_empty() {
        tracing::debug!(member_id, client_id, "member has no assignment");
        return vec![];
    }

    let topics = member
        .decode_assignment()
        .and_then(|assignment| assignment.topic_partitions());
    match topics {
        Ok(topics) => topics
            .into_iter()
            .map(|(topic_name, mut partition_ids)| {
                partition_ids.sort_unstable();
                GroupMemberAssignment {
                    topic_name,
                    partition_ids,
                }
            })
            .collect(),
        Err(err) => {
            tracing::warn!(
                member_id,
                client_id,
                "failed to decode member assignments: {}",
                err
            );
            vec![]
        }
    }
}

/// Order groups by id.
pub fn sort_descriptions(descriptions: &mut Vec<GroupDescription>) {
    descriptions.sort_by(|a, b| a.group_id.cmp(&b.group_id));
    descriptions.dedup_by(|a, b| a.group_id == b.group_id);
}
