//! Encoding and creation for Describe Groups requests.
//!
//! A describe groups request has to be sent to the coordinator of every
//! group it names. Several groups sharing a coordinator can be described
//! with a single request.
//!
//! ### Example
//! ```rust,ignore
//! let mut describe_groups_request =
//!     protocol::DescribeGroupsRequest::new(CORRELATION_ID, CLIENT_ID);
//! describe_groups_request.add(group_id);
//! conn.send_request(&describe_groups_request).await?;
//! ```
//!
//! ### Protocol Def
//! ```text
//! DescribeGroups Request (Version: 1) => [groups]
//!   groups => STRING
//! ```
//!
//! Note we are using version 1 of the request.

use bytes::BufMut;

use crate::{
    encode::{AsStrings, ToByte},
    error::Result,
    protocol::HeaderRequest,
};

const API_KEY_DESCRIBE_GROUPS: i16 = 15;
const API_VERSION: i16 = 1;

/// The base Describe Groups request object.
#[derive(Debug)]
pub struct DescribeGroupsRequest<'a> {
    pub header: HeaderRequest<'a>,
    /// The names of the groups to describe.
    pub groups: Vec<&'a str>,
}

impl<'a> DescribeGroupsRequest<'a> {
    pub fn new(correlation_id: i32, client_id: &'a str) -> Self {
        let header = HeaderRequest::new(
            API_KEY_DESCRIBE_GROUPS,
            API_VERSION,
            correlation_id,
            client_id,
        );
        Self {
            header,
            groups: vec![],
        }
    }

    pub fn add(&mut self, group_id: &'a str) {
        self.groups.push(group_id);
    }
}

impl<'a> ToByte for DescribeGroupsRequest<'a> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        tracing::trace!("Encoding DescribeGroupsRequest {:?}", self);
        self.header.encode(buffer)?;
        AsStrings(&self.groups).encode(buffer)?;
        Ok(())
    }
}
