#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc = document_features::document_features!()]

use bls12_381::{G1Affine, G1Projective, G2Affine, G2Projective, Gt, Scalar};
use ff::Field as FFField;
use rand_core::{CryptoRng, RngCore};


pub use mpss_core::{
    config, lagrange_coefficients_at_zero, lagrange_interpolate, messages,
    reconstruct_secret, BoardService, EpochMetrics, Error, Field, FieldError, Group, GroupError,
    InMemoryNetwork, NetworkConfig, NodeService, NodeStatus, PairingSuite, Phase, ProtocolConfig,
    ProtocolError, Transport,
};

#[derive(Clone, Copy)]
/// An implementation of the BLS12-381 scalar field.
pub struct Bls12381ScalarField;

impl Field for Bls12381ScalarField {
    type Scalar = Scalar;

    type Serialization = [u8; 32];

    fn zero() -> Self::Scalar {
        Scalar::zero()
    }

    fn one() -> Self::Scalar {
        Scalar::one()
    }

    fn from_u64(value: u64) -> Self::Scalar {
        Scalar::from(value)
    }

    fn invert(scalar: &Self::Scalar) -> Result<Self::Scalar, FieldError> {
        Option::from(scalar.invert()).ok_or(FieldError::InvalidZeroScalar)
    }

    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self::Scalar {
        <Scalar as FFField>::random(rng)
    }

    /// `bls12_381` encodes scalars little-endian; the wire format is
    /// big-endian.
    fn serialize(scalar: &Self::Scalar) -> Self::Serialization {
        let mut bytes = scalar.to_bytes();
        bytes.reverse();
        bytes
    }

    fn deserialize(buf: &Self::Serialization) -> Result<Self::Scalar, FieldError> {
        let mut bytes = *buf;
        bytes.reverse();
        Option::from(Scalar::from_bytes(&bytes)).ok_or(FieldError::MalformedScalar)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
/// An implementation of the BLS12-381 G1 group.
pub struct G1Group;

impl Group for G1Group {
    type Field = Bls12381ScalarField;

    type Element = G1Projective;

    /// The compressed encoding of a G1 point takes 48 bytes. The top three
    /// bits of the first byte flag compression, the point at infinity and the
    /// sign of `y`.
    type Serialization = [u8; 48];

    fn identity() -> Self::Element {
        G1Projective::identity()
    }

    fn generator() -> Self::Element {
        G1Projective::generator()
    }

    fn serialize(element: &Self::Element) -> Self::Serialization {
        G1Affine::from(element).to_compressed()
    }

    fn deserialize(buf: &Self::Serialization) -> Result<Self::Element, GroupError> {
        Option::<G1Affine>::from(G1Affine::from_compressed(buf))
            .map(G1Projective::from)
            .ok_or(GroupError::MalformedElement)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
/// An implementation of the BLS12-381 G2 group.
pub struct G2Group;

impl Group for G2Group {
    type Field = Bls12381ScalarField;

    type Element = G2Projective;

    /// The compressed encoding of a G2 point takes 96 bytes, with the same
    /// flag bits as G1.
    type Serialization = [u8; 96];

    fn identity() -> Self::Element {
        G2Projective::identity()
    }

    fn generator() -> Self::Element {
        G2Projective::generator()
    }

    fn serialize(element: &Self::Element) -> Self::Serialization {
        G2Affine::from(element).to_compressed()
    }

    fn deserialize(buf: &Self::Serialization) -> Result<Self::Element, GroupError> {
        Option::<G2Affine>::from(G2Affine::from_compressed(buf))
            .map(G2Projective::from)
            .ok_or(GroupError::MalformedElement)
    }
}

/// Suite ID string, used in logs.
const SUITE_ID: &str = "MPSS-BLS12-381";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
/// The BLS12-381 pairing suite: commitments and witnesses in G1, the
/// commitment key's trapdoor power in G2.
pub struct Bls12381;

impl PairingSuite for Bls12381 {
    const ID: &'static str = SUITE_ID;

    type G1 = G1Group;

    type G2 = G2Group;

    type Gt = Gt;

    fn pair(p: &G1Projective, q: &G2Projective) -> Gt {
        bls12_381::pairing(&G1Affine::from(p), &G2Affine::from(q))
    }
}

type B = Bls12381;

/// A polynomial over the BLS12-381 scalar field.
pub type Polynomial = mpss_core::Polynomial<Bls12381ScalarField>;

/// A Kate commitment key for BLS12-381.
pub type CommitmentKey = mpss_core::CommitmentKey<B>;

/// A commitment to a polynomial.
pub type PolyCommitment = mpss_core::PolyCommitment<B>;

/// A discrete-log commitment to a single scalar.
pub type ShareCommitment = mpss_core::ShareCommitment<B>;

/// A witness that a committed polynomial evaluates to a value.
pub type Witness = mpss_core::Witness<B>;

/// A share held by a node, with its witness.
pub type ShareRecord = mpss_core::ShareRecord<B>;

/// A resharing node over BLS12-381.
pub type Node = mpss_core::Node<B>;

/// The bulletin board coordinating the nodes.
pub type BulletinBoard = mpss_core::BulletinBoard;

/// Deals one polynomial shared by every party.
///
/// See [`mpss_core::deal_replicated`].
pub fn deal_replicated<R: RngCore + CryptoRng>(
    config: &ProtocolConfig,
    key: &CommitmentKey,
    secret: Scalar,
    rng: &mut R,
) -> Result<mpss_core::share::Dealing<B>, Error> {
    mpss_core::deal_replicated::<B, R>(config, key, secret, rng)
}

/// Deals one reduced polynomial of a bivariate polynomial per party.
///
/// See [`mpss_core::deal_bivariate`].
pub fn deal_bivariate<R: RngCore + CryptoRng>(
    config: &ProtocolConfig,
    key: &CommitmentKey,
    secret: Scalar,
    rng: &mut R,
) -> Result<mpss_core::share::Dealing<B>, Error> {
    mpss_core::deal_bivariate::<B, R>(config, key, secret, rng)
}

/// Recovers the secret from the shares of every node.
///
/// See [`mpss_core::recover_secret`].
pub fn recover_secret(
    config: &ProtocolConfig,
    shares: &std::collections::BTreeMap<u16, Vec<ShareRecord>>,
) -> Result<Scalar, Error> {
    mpss_core::recover_secret::<B>(config, shares)
}
