//! Bytecode protocol requests & responses.
//!
//! This module implements the slice of the bytecode protocol outlined in
//! the [Kafka Documentation](https://kafka.apache.org/protocol.html)
//! that is needed to discover and describe consumer groups.
//!
//! Each message pair lives in its own module holding two files, one for
//! the request and one for the response. The request files hold the
//! logic for creating and encoding structs that will be sent to the
//! broker. The response files hold the logic for parsing the messages
//! coming back from the broker.
//!
//! [`assignment`] is not a message of its own: it is the consumer
//! protocol schema embedded in the member assignment bytes of a
//! Describe Groups response.

pub mod assignment;
pub mod describe_groups;
pub mod find_coordinator;

use bytes::BufMut;
use nom::{number::complete::be_i32, IResult};
use nombytes::NomBytes;

// re exporting these for ease
pub use self::{
    assignment::{ConsumerAssignment, TopicAssignment},
    describe_groups::{
        request::DescribeGroupsRequest,
        response::{DescribeGroupsResponse, DescribedGroup, DescribedGroupMember},
    },
    find_coordinator::{request::FindCoordinatorRequest, response::FindCoordinatorResponse},
};
use crate::{
    encode::ToByte,
    error::{Error, Result},
};

#[derive(Debug, Clone)]
pub struct HeaderRequest<'a> {
    /// The API key of this request.
    pub api_key: i16,
    /// The API version of this request.
    pub api_version: i16,
    /// The correlation ID of this request.
    pub correlation_id: i32,
    /// The client ID string.
    pub client_id: &'a str,
}

impl<'a> HeaderRequest<'a> {
    /// Create new header request.
    ///
    /// This goes at the beginning of every single request.
    pub fn new(api_key: i16, api_version: i16, correlation_id: i32, client_id: &'a str) -> Self {
        HeaderRequest {
            api_key,
            api_version,
            correlation_id,
            client_id,
        }
    }
}

impl<'a> ToByte for HeaderRequest<'a> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.api_key.encode(buffer)?;
        self.api_version.encode(buffer)?;
        self.correlation_id.encode(buffer)?;
        self.client_id.encode(buffer)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct HeaderResponse {
    /// The correlation ID of this response.
    pub correlation_id: i32,
}

impl HeaderResponse {
    /// Fail unless this response answers the request sent with `correlation_id`.
    pub fn answers(&self, correlation_id: i32) -> Result<()> {
        if self.correlation_id != correlation_id {
            tracing::error!(
                "ERROR: Response carries correlation id {} but {} was sent",
                self.correlation_id,
                correlation_id
            );
            return Err(Error::CorrelationIdMismatch {
                expected: correlation_id,
                received: self.correlation_id,
            });
        }
        Ok(())
    }
}

pub fn parse_header_response(s: NomBytes) -> IResult<NomBytes, HeaderResponse> {
    let (s, correlation_id) = be_i32(s)?;
    Ok((s, HeaderResponse { correlation_id }))
}
