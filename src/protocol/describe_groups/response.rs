//! Parsing and processing for Describe Groups responses.
//!
//! The coordinator answers with one entry per requested group, each
//! carrying its own error code. Members are only reported for groups
//! that have any; their metadata and assignment are left as raw bytes
//! since their schema depends on the protocol type of the group.
//!
//! ### Example
//! ```rust,ignore
//! let response_bytes = conn.receive_response().await?;
//! let describe_groups_response = protocol::DescribeGroupsResponse::try_from(response_bytes.freeze())?;
//! ```
//!
//! ### Protocol Def
//! ```text
//! DescribeGroups Response (Version: 1) => throttle_time_ms [groups]
//!   throttle_time_ms => INT32
//!   groups => error_code group_id group_state protocol_type protocol_data [members]
//!     error_code => INT16
//!     group_id => STRING
//!     group_state => STRING
//!     protocol_type => STRING
//!     protocol_data => STRING
//!     members => member_id client_id client_host member_metadata member_assignment
//!       member_id => STRING
//!       client_id => STRING
//!       client_host => STRING
//!       member_metadata => BYTES
//!       member_assignment => BYTES
//! ```
//!
//! Note we are using version 1 of the response.

use bytes::Bytes;
use nom::{number::complete::be_i32, IResult};
use nombytes::NomBytes;

use crate::{
    error::{Error, KafkaCode, Result},
    parser,
    protocol::{parse_header_response, ConsumerAssignment, HeaderResponse},
};

/// The base Describe Groups response object.
#[derive(Debug, PartialEq)]
pub struct DescribeGroupsResponse {
    pub header: HeaderResponse,
    /// The duration in milliseconds for which the request was throttled due to a quota violation, or zero if the request did not violate any quota.
    pub throttle_time_ms: i32,
    /// Each described group.
    pub groups: Vec<DescribedGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescribedGroup {
    /// The describe error, or 0 if there was no error.
    pub error_code: KafkaCode,
    pub group_id: Bytes,
    /// The group state string, or the empty string.
    pub group_state: Bytes,
    /// The group protocol type, or the empty string.
    pub protocol_type: Bytes,
    /// The group protocol data (the selected assignor), or the empty string.
    pub protocol_data: Bytes,
    pub members: Vec<DescribedGroupMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescribedGroupMember {
    /// The member ID assigned by the group coordinator.
    pub member_id: Bytes,
    /// The client ID used in the member's latest join group request.
    pub client_id: Bytes,
    /// The client host.
    pub client_host: Bytes,
    /// The metadata corresponding to the current group protocol in use.
    pub member_metadata: Bytes,
    /// The current assignment provided by the group leader.
    pub member_assignment: Bytes,
}

impl DescribedGroupMember {
    /// Decode the member assignment using the consumer protocol schema.
    ///
    /// Only meaningful for groups whose protocol type is `consumer`.
    pub fn decode_assignment(&self) -> Result<ConsumerAssignment> {
        ConsumerAssignment::try_from(self.member_assignment.clone())
    }
}

impl TryFrom<Bytes> for DescribeGroupsResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        tracing::trace!("Parsing DescribeGroupsResponse {:?}", s);
        let (_, describe_groups) = parse_describe_groups_response(NomBytes::new(s.clone()))
            .map_err(|err| {
                tracing::error!("ERROR: Failed parsing DescribeGroupsResponse {:?}", err);
                tracing::error!("ERROR: DescribeGroupsResponse Bytes {:?}", s);
                Error::ParsingError(s)
            })?;
        tracing::trace!("Parsed DescribeGroupsResponse {:?}", describe_groups);
        Ok(describe_groups)
    }
}

pub fn parse_describe_groups_response(s: NomBytes) -> IResult<NomBytes, DescribeGroupsResponse> {
    let (s, header) = parse_header_response(s)?;
    let (s, throttle_time_ms) = be_i32(s)?;
    let (s, groups) = parser::parse_array(parse_group)(s)?;

    Ok((
        s,
        DescribeGroupsResponse {
            header,
            throttle_time_ms,
            groups,
        },
    ))
}

fn parse_group(s: NomBytes) -> IResult<NomBytes, DescribedGroup> {
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, group_id) = parser::parse_string(s)?;
    let (s, group_state) = parser::parse_string(s)?;
    let (s, protocol_type) = parser::parse_string(s)?;
    let (s, protocol_data) = parser::parse_string(s)?;
    let (s, members) = parser::parse_array(parse_member)(s)?;

    Ok((
        s,
        DescribedGroup {
            error_code,
            group_id,
            group_state,
            protocol_type,
            protocol_data,
            members,
        },
    ))
}

fn parse_member(s: NomBytes) -> IResult<NomBytes, DescribedGroupMember> {
    let (s, member_id) = parser::parse_string(s)?;
    let (s, client_id) = parser::parse_string(s)?;
    let (s, client_host) = parser::parse_string(s)?;
    let (s, member_metadata) = parser::parse_bytes(s)?;
    let (s, member_assignment) = parser::parse_bytes(s)?;

    Ok((
        s,
        DescribedGroupMember {
            member_id,
            client_id,
            client_host,
            member_metadata,
            member_assignment,
        },
    ))
}
