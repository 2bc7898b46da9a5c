//! Messages exchanged between nodes and with the bulletin board.
//!
//! Payload fields are opaque byte strings: scalars use the variable-length
//! big-endian encoding and group elements their compressed encoding, see
//! [`crate::serialization`]. Whole messages are encoded with `postcard`.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    commitment::{PolyCommitment, ShareCommitment, Witness},
    serialization::{scalar_from_bytes, scalar_to_bytes},
    share::ShareRecord,
    Error, FieldOf, PairingSuite, Scalar,
};

/// A witnessed evaluation `(x, y, witness)` sent point-to-point in phases 1
/// and 3.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointMessage {
    /// The sending party.
    pub sender: u16,
    /// The evaluation point, a party index.
    pub x: u16,
    /// The evaluation.
    #[serde(with = "crate::serialization::bytes")]
    pub y: Vec<u8>,
    /// The witness for `y`.
    #[serde(with = "crate::serialization::bytes")]
    pub witness: Vec<u8>,
}

impl PointMessage {
    /// Encodes a share record.
    pub fn new<C: PairingSuite>(sender: u16, record: &ShareRecord<C>) -> Self {
        Self {
            sender,
            x: record.index,
            y: scalar_to_bytes::<FieldOf<C>>(&record.value),
            witness: record.witness.serialize(),
        }
    }

    /// Decodes the carried share record.
    pub fn to_record<C: PairingSuite>(&self) -> Result<ShareRecord<C>, Error> {
        Ok(ShareRecord::new(
            self.x,
            scalar_from_bytes::<FieldOf<C>>(&self.y)?,
            Witness::deserialize(&self.witness)?,
        ))
    }
}

/// A share of the sender's zero-sharing, sent in phase 2.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZeroShareMessage {
    /// The sending party.
    pub sender: u16,
    /// The zero-share.
    #[serde(with = "crate::serialization::bytes")]
    pub share: Vec<u8>,
}

impl ZeroShareMessage {
    /// Encodes a zero-share.
    pub fn new<C: PairingSuite>(sender: u16, share: &Scalar<C>) -> Self {
        Self {
            sender,
            share: scalar_to_bytes::<FieldOf<C>>(share),
        }
    }

    /// Decodes the zero-share.
    pub fn to_scalar<C: PairingSuite>(&self) -> Result<Scalar<C>, Error> {
        scalar_from_bytes::<FieldOf<C>>(&self.share)
    }
}

/// A polynomial commitment posted to the board in phases 1 and 3.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitmentPost {
    /// The posting party.
    pub sender: u16,
    /// The commitment.
    #[serde(with = "crate::serialization::bytes")]
    pub commitment: Vec<u8>,
}

impl CommitmentPost {
    /// Encodes a commitment.
    pub fn new<C: PairingSuite>(sender: u16, commitment: &PolyCommitment<C>) -> Self {
        Self {
            sender,
            commitment: commitment.serialize(),
        }
    }

    /// Decodes the commitment.
    pub fn to_commitment<C: PairingSuite>(&self) -> Result<PolyCommitment<C>, Error> {
        PolyCommitment::deserialize(&self.commitment)
    }
}

/// The phase 2 triple: commitment to the summed zero-share, commitment to the
/// zero polynomial, and the witness that it vanishes at zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Phase2Post {
    /// The posting party.
    pub sender: u16,
    /// `g^{z}` for the summed zero-share `z`.
    #[serde(with = "crate::serialization::bytes")]
    pub share_commitment: Vec<u8>,
    /// Commitment to the zero polynomial `Q`.
    #[serde(with = "crate::serialization::bytes")]
    pub poly_commitment: Vec<u8>,
    /// Witness for `Q(0) = 0`.
    #[serde(with = "crate::serialization::bytes")]
    pub zero_witness: Vec<u8>,
}

impl Phase2Post {
    /// Encodes the triple.
    pub fn new<C: PairingSuite>(
        sender: u16,
        share_commitment: &ShareCommitment<C>,
        poly_commitment: &PolyCommitment<C>,
        zero_witness: &Witness<C>,
    ) -> Self {
        Self {
            sender,
            share_commitment: share_commitment.serialize(),
            poly_commitment: poly_commitment.serialize(),
            zero_witness: zero_witness.serialize(),
        }
    }

    /// Decodes the triple.
    #[allow(clippy::type_complexity)]
    pub fn decode<C: PairingSuite>(
        &self,
    ) -> Result<(ShareCommitment<C>, PolyCommitment<C>, Witness<C>), Error> {
        Ok((
            ShareCommitment::deserialize(&self.share_commitment)?,
            PolyCommitment::deserialize(&self.poly_commitment)?,
            Witness::deserialize(&self.zero_witness)?,
        ))
    }
}

/// A call addressed to a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRequest {
    /// Begin a new epoch with phase 1.
    StartEpoch,
    /// A reconstruction share.
    SharePhase1(PointMessage),
    /// A zero-share.
    SharePhase2(ZeroShareMessage),
    /// All phase 2 triples are on the board.
    StartVerifPhase2,
    /// A redistributed share.
    SharePhase3(PointMessage),
    /// All phase 3 commitments are on the board.
    StartVerifPhase3,
}

/// A call addressed to the bulletin board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardRequest {
    /// Ask the board to start an epoch on every node.
    StartEpoch,
    /// Post an initial commitment.
    WritePhase1(CommitmentPost),
    /// Read the current commitments.
    ReadPhase1,
    /// Post a phase 2 triple.
    WritePhase2(Phase2Post),
    /// Read all phase 2 triples.
    ReadPhase2,
    /// Post a new commitment.
    WritePhase3(CommitmentPost),
    /// Read all new commitments.
    ReadPhase3,
}

/// The board's reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardResponse {
    /// A write was accepted.
    Ack,
    /// One commitment per party, in party order.
    Commitments(Vec<CommitmentPost>),
    /// One phase 2 triple per party, in party order.
    Phase2(Vec<Phase2Post>),
}

macro_rules! impl_wire {
    ($($name:ident),*) => {
        $(
            impl $name {
                /// Serialize the message into a Vec.
                pub fn serialize(&self) -> Result<Vec<u8>, Error> {
                    crate::serialization::Serialize::serialize(self)
                }

                /// Deserialize the message from a slice of bytes.
                pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
                    crate::serialization::Deserialize::deserialize(bytes)
                }

                /// Size of the encoded message in bytes.
                pub fn encoded_len(&self) -> usize {
                    self.serialize().map_or(0, |bytes| bytes.len())
                }
            }
        )*
    };
}

impl_wire!(NodeRequest, BoardRequest, BoardResponse);

impl NodeRequest {
    /// The request name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            NodeRequest::StartEpoch => "StartEpoch",
            NodeRequest::SharePhase1(_) => "SharePhase1",
            NodeRequest::SharePhase2(_) => "SharePhase2",
            NodeRequest::StartVerifPhase2 => "StartVerifPhase2",
            NodeRequest::SharePhase3(_) => "SharePhase3",
            NodeRequest::StartVerifPhase3 => "StartVerifPhase3",
        }
    }
}

impl fmt::Display for NodeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl BoardRequest {
    /// The request name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            BoardRequest::StartEpoch => "StartEpoch",
            BoardRequest::WritePhase1(_) => "WritePhase1",
            BoardRequest::ReadPhase1 => "ReadPhase1",
            BoardRequest::WritePhase2(_) => "WritePhase2",
            BoardRequest::ReadPhase2 => "ReadPhase2",
            BoardRequest::WritePhase3(_) => "WritePhase3",
            BoardRequest::ReadPhase3 => "ReadPhase3",
        }
    }
}

impl fmt::Display for BoardRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl BoardResponse {
    /// Unwraps a commitment list.
    pub fn into_commitments(self) -> Result<Vec<CommitmentPost>, Error> {
        match self {
            BoardResponse::Commitments(posts) => Ok(posts),
            _ => Err(Error::DeserializationError),
        }
    }

    /// Unwraps a list of phase 2 triples.
    pub fn into_phase2(self) -> Result<Vec<Phase2Post>, Error> {
        match self {
            BoardResponse::Phase2(posts) => Ok(posts),
            _ => Err(Error::DeserializationError),
        }
    }
}
