//! Errors raised while talking to the cluster or describing groups.
use bytes::Bytes;
use num_derive::FromPrimitive;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("could not encode the request")]
    EncodingError,

    #[error("could not parse the broker response")]
    ParsingError(Bytes),

    #[error("could not decode bytes as utf8")]
    DecodingUtf8Error,

    #[error("broker returned error code {0:?}")]
    KafkaError(KafkaCode),

    #[error("io error: {0:?}")]
    IoError(std::io::ErrorKind),

    #[error("malformed broker address '{0}'")]
    InvalidBrokerAddress(String),

    #[error("tls setup failed: {0}")]
    TlsError(String),

    #[error("expected a response to request {expected} but got one to {received}")]
    CorrelationIdMismatch { expected: i32, received: i32 },

    #[error("broker with id '{broker_id}' failed to describe the consumer groups: {source}")]
    BrokerRequestFailed { broker_id: i32, source: Box<Error> },

    #[error("group '{group_id}' could not be described: {code:?}")]
    GroupError { group_id: String, code: KafkaCode },

    #[error("broker with id '{broker_id}' described group '{group_id}' which was not requested from it")]
    UnrequestedGroup { broker_id: i32, group_id: String },

    #[error("describe worker did not complete: {0}")]
    WorkerFailed(String),

    #[error("context has been cancelled")]
    Cancelled,
}

/// Error codes returned by the broker.
///
/// See the [protocol docs](https://kafka.apache.org/protocol.html#protocol_error_codes)
/// for the meaning of each.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum KafkaCode {
    /// Any code this client does not know about.
    Unknown = -1,
    None = 0,
    OffsetOutOfRange = 1,
    CorruptMessage = 2,
    UnknownTopicOrPartition = 3,
    InvalidMessageSize = 4,
    LeaderNotAvailable = 5,
    NotLeaderForPartition = 6,
    RequestTimedOut = 7,
    BrokerNotAvailable = 8,
    ReplicaNotAvailable = 9,
    MessageSizeTooLarge = 10,
    StaleControllerEpoch = 11,
    OffsetMetadataTooLarge = 12,
    NetworkException = 13,
    CoordinatorLoadInProgress = 14,
    CoordinatorNotAvailable = 15,
    NotCoordinator = 16,
    InvalidTopicException = 17,
    RecordListTooLarge = 18,
    NotEnoughReplicas = 19,
    NotEnoughReplicasAfterAppend = 20,
    InvalidRequiredAcks = 21,
    IllegalGeneration = 22,
    InconsistentGroupProtocol = 23,
    InvalidGroupId = 24,
    UnknownMemberId = 25,
    InvalidSessionTimeout = 26,
    RebalanceInProgress = 27,
    InvalidCommitOffsetSize = 28,
    TopicAuthorizationFailed = 29,
    GroupAuthorizationFailed = 30,
    ClusterAuthorizationFailed = 31,
    InvalidTimestamp = 32,
    UnsupportedSaslMechanism = 33,
    IllegalSaslState = 34,
    UnsupportedVersion = 35,
    TopicAlreadyExists = 36,
    InvalidPartitions = 37,
    InvalidReplicationFactor = 38,
    InvalidReplicaAssignment = 39,
    InvalidConfig = 40,
    NotController = 41,
    InvalidRequest = 42,
    UnsupportedForMessageFormat = 43,
    PolicyViolation = 44,
    OutOfOrderSequenceNumber = 45,
    DuplicateSequenceNumber = 46,
    InvalidProducerEpoch = 47,
    InvalidTxnState = 48,
    InvalidProducerIdMapping = 49,
    InvalidTransactionTimeout = 50,
    ConcurrentTransactions = 51,
    TransactionCoordinatorFenced = 52,
    TransactionalIdAuthorizationFailed = 53,
    SecurityDisabled = 54,
    OperationNotAttempted = 55,
    KafkaStorageError = 56,
    LogDirNotFound = 57,
    SaslAuthenticationFailed = 58,
    UnknownProducerId = 59,
    ReassignmentInProgress = 60,
    DelegationTokenAuthDisabled = 61,
    DelegationTokenNotFound = 62,
    DelegationTokenOwnerMismatch = 63,
    DelegationTokenRequestNotAllowed = 64,
    DelegationTokenAuthorizationFailed = 65,
    DelegationTokenExpired = 66,
    InvalidPrincipalType = 67,
    NonEmptyGroup = 68,
    GroupIdNotFound = 69,
    FetchSessionIdNotFound = 70,
    InvalidFetchSessionEpoch = 71,
    ListenerNotFound = 72,
    TopicDeletionDisabled = 73,
    FencedLeaderEpoch = 74,
    UnknownLeaderEpoch = 75,
    UnsupportedCompressionType = 76,
    StaleBrokerEpoch = 77,
    OffsetNotAvailable = 78,
    MemberIdRequired = 79,
    PreferredLeaderNotAvailable = 80,
    GroupMaxSizeReached = 81,
    FencedInstanceId = 82,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.kind())
    }
}
