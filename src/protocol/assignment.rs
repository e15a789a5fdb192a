//! Consumer protocol member assignment.
//!
//! The group membership API treats assignments as opaque bytes. Clients
//! that join with the `consumer` protocol type embed the standard schema
//! below, which is what the Kafka tooling (and this crate) expects when
//! displaying which partitions a member owns. Groups with any other
//! protocol type are free to put whatever they like in there.
//!
//! ### Protocol Def
//! ```text
//! MemberAssignment => Version PartitionAssignment UserData
//!   Version => int16
//!   PartitionAssignment => [Topic [Partition]]
//!     Topic => string
//!     Partition => int32
//!   UserData => bytes
//! ```

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes};
use nom::{
    number::complete::{be_i16, be_i32},
    IResult,
};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, Result},
    parser,
    utils::to_string,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerAssignment {
    pub version: i16,
    pub topics: Vec<TopicAssignment>,
    pub user_data: Option<Bytes>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicAssignment {
    pub topic_name: Bytes,
    pub partitions: Vec<i32>,
}

impl TopicAssignment {
    pub fn new(topic_name: impl Into<Bytes>, partitions: Vec<i32>) -> Self {
        Self {
            topic_name: topic_name.into(),
            partitions,
        }
    }
}

impl ConsumerAssignment {
    /// Topic to partitions mapping held by this assignment.
    ///
    /// A topic listed more than once keeps the partitions of its last entry.
    pub fn topic_partitions(&self) -> Result<BTreeMap<String, Vec<i32>>> {
        self.topics
            .iter()
            .map(|topic| Ok((to_string(&topic.topic_name)?, topic.partitions.clone())))
            .collect()
    }
}

impl TryFrom<Bytes> for ConsumerAssignment {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        tracing::trace!("Parsing ConsumerAssignment {:?}", s);
        let (rest, assignment) =
            parse_consumer_assignment(NomBytes::new(s.clone())).map_err(|err| {
                tracing::debug!("Failed parsing ConsumerAssignment {:?}", err);
                Error::ParsingError(s.clone())
            })?;
        if !rest.to_bytes().is_empty() {
            tracing::debug!("ConsumerAssignment has {} trailing bytes", rest.to_bytes().len());
            return Err(Error::ParsingError(s));
        }
        Ok(assignment)
    }
}

pub fn parse_consumer_assignment(s: NomBytes) -> IResult<NomBytes, ConsumerAssignment> {
    let (s, version) = be_i16(s)?;
    let (s, topics) = parser::parse_array(parse_topic_assignment)(s)?;
    let (s, user_data) = parser::parse_nullable_bytes(s)?;

    Ok((
        s,
        ConsumerAssignment {
            version,
            topics,
            user_data,
        },
    ))
}

fn parse_topic_assignment(s: NomBytes) -> IResult<NomBytes, TopicAssignment> {
    let (s, topic_name) = parser::parse_string(s)?;
    let (s, partitions) = parser::parse_array(be_i32)(s)?;

    Ok((
        s,
        TopicAssignment {
            topic_name,
            partitions,
        },
    ))
}

impl ToByte for ConsumerAssignment {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.version.encode(buffer)?;
        self.topics.encode(buffer)?;
        self.user_data.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for TopicAssignment {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        to_string(&self.topic_name)?.encode(buffer)?;
        self.partitions.encode(buffer)?;
        Ok(())
    }
}
