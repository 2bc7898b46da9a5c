//! Error types

use thiserror::Error;

/// An error related to field scalars.
#[non_exhaustive]
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum FieldError {
    /// The encoding of a field scalar was malformed.
    #[error("Malformed scalar encoding.")]
    MalformedScalar,
    /// This scalar MUST NOT be zero.
    #[error("Invalid for this scalar to be zero.")]
    InvalidZeroScalar,
}

/// An error related to group elements.
#[non_exhaustive]
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum GroupError {
    /// The encoding of a group element was malformed.
    #[error("Malformed group element encoding.")]
    MalformedElement,
}

/// An error raised by the algebra, commitment and encoding layers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// The party count is invalid.
    #[error("parties must be at least 2")]
    InvalidParties,
    /// The polynomial degree is invalid for the party count.
    #[error("degree must be at least 1 and smaller than the number of parties")]
    InvalidDegree,
    /// A party index outside `1..=parties` was used.
    #[error("Party index {index} is out of range.")]
    InvalidPartyIndex {
        /// The offending index.
        index: u16,
    },
    /// Two interpolation points share the same x-coordinate.
    #[error("Duplicated interpolation point.")]
    DuplicatePoint,
    /// Fewer than `degree + 1` points were given to interpolation.
    #[error("Not enough points to interpolate.")]
    NotEnoughPoints,
    /// A division that was required to be exact left a remainder.
    #[error("Polynomial division left a non-zero remainder.")]
    InexactDivision,
    /// The divisor polynomial is zero.
    #[error("Division by the zero polynomial.")]
    DivisionByZero,
    /// The polynomial degree exceeds the commitment key.
    #[error("Polynomial degree exceeds the commitment key size.")]
    PolynomialTooLarge,
    /// The commitment key has no powers.
    #[error("Commitment key must contain at least one power.")]
    EmptyCommitmentKey,
    /// Error in scalar Field.
    #[error("Error in scalar Field.")]
    FieldError(#[from] FieldError),
    /// Error in elliptic curve Group.
    #[error("Error in elliptic curve Group.")]
    GroupError(#[from] GroupError),
    /// The number of node addresses does not match the party count.
    #[error("Expected {expected} node addresses, got {actual}.")]
    IncorrectNumberOfAddresses {
        /// The configured party count.
        expected: u16,
        /// The number of addresses found.
        actual: usize,
    },
    /// A node was given the wrong number of share slots.
    #[error("Expected {expected} share slots, got {actual}.")]
    IncorrectNumberOfShares {
        /// The configured party count.
        expected: u16,
        /// The number of slots found.
        actual: usize,
    },
    /// The configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Error serializing value.
    #[error("Error serializing value.")]
    SerializationError,
    /// Error deserializing value.
    #[error("Error deserializing value.")]
    DeserializationError,
}

/// A fatal condition raised while running an epoch.
///
/// Every variant aborts the epoch on the node that observes it. Verification
/// failures name the party whose data did not check out.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ProtocolError {
    /// An algebra, commitment or encoding error.
    #[error(transparent)]
    Crypto(#[from] Error),
    /// A peer or the bulletin board could not be reached, or replied with an error.
    #[error("transport failure talking to {peer}: {reason}")]
    Transport {
        /// The unreachable endpoint.
        peer: String,
        /// What went wrong.
        reason: String,
    },
    /// A reconstruction share did not verify against the old commitment.
    #[error("reconstruction share from party {sender} failed verification")]
    ReconstructionVerification {
        /// The sender of the bad share.
        sender: u16,
    },
    /// The Lagrange-weighted product of zero-share commitments is not the identity.
    #[error("zero-share commitments do not sum to zero")]
    ZeroSumMismatch,
    /// A zero polynomial commitment lacks a valid witness for `P(0) = 0`.
    #[error("zero polynomial of party {party} does not evaluate to zero")]
    ZeroWitnessInvalid {
        /// The party that posted the commitment.
        party: u16,
    },
    /// `new != old + mid` for some party's commitment.
    #[error("new commitment of party {party} is inconsistent with the old one")]
    CommitmentMismatch {
        /// The party that posted the commitment.
        party: u16,
    },
    /// A redistributed share failed verification against its new commitment.
    #[error("redistributed share from party {party} failed verification")]
    ShareVerification {
        /// The party that produced the share.
        party: u16,
    },
    /// The same sender delivered two messages for one phase slot.
    #[error("duplicate message from party {sender}")]
    DuplicateMessage {
        /// The repeated sender.
        sender: u16,
    },
    /// A request arrived that the current state cannot serve.
    #[error("unexpected request: {0}")]
    UnexpectedPhase(&'static str),
    /// The bulletin board does not yet hold a full set of commitments.
    #[error("bulletin board is missing the post of party {party}")]
    MissingPost {
        /// The party whose slot is empty.
        party: u16,
    },
    /// The node aborted an earlier epoch and no longer serves requests.
    #[error("node aborted: {0}")]
    Aborted(String),
}

impl From<FieldError> for ProtocolError {
    fn from(e: FieldError) -> Self {
        ProtocolError::Crypto(e.into())
    }
}

impl From<GroupError> for ProtocolError {
    fn from(e: GroupError) -> Self {
        ProtocolError::Crypto(e.into())
    }
}
