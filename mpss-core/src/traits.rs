//! Traits used to abstract the pairing backend.

use core::{
    fmt::Debug,
    ops::{Add, Mul, Neg, Sub},
};

use rand_core::{CryptoRng, RngCore};

use crate::{FieldError, GroupError};

/// A prime order finite field GF(p) over which all polynomials, shares and
/// exponents are defined.
///
/// This trait does not have to be implemented for a finite field scalar itself, it can be a
/// pass-through, implemented for a type just for the backend, and calls through to another
/// implementation underneath, so that this trait does not have to be implemented for types you
/// don't own.
pub trait Field: Copy + Clone + Send + Sync + 'static {
    /// An element of the scalar field GF(p).
    /// The Eq/PartialEq implementation MUST be constant-time.
    type Scalar: Add<Output = Self::Scalar>
        + Copy
        + Clone
        + Debug
        + Eq
        + Mul<Output = Self::Scalar>
        + Neg<Output = Self::Scalar>
        + PartialEq
        + Send
        + Sync
        + Sub<Output = Self::Scalar>;

    /// A unique byte array buf of fixed length N, big-endian.
    type Serialization: AsRef<[u8]> + Debug + TryFrom<Vec<u8>>;

    /// Returns the zero element of the field, the additive identity.
    fn zero() -> Self::Scalar;

    /// Returns the one element of the field, the multiplicative identity.
    fn one() -> Self::Scalar;

    /// Maps a small integer (e.g. a party index) into the field.
    fn from_u64(value: u64) -> Self::Scalar;

    /// Computes the multiplicative inverse of an element of the scalar field, failing if the
    /// element is zero.
    fn invert(scalar: &Self::Scalar) -> Result<Self::Scalar, FieldError>;

    /// Generate a random scalar from the entire space [0, p-1].
    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self::Scalar;

    /// Maps a [`Scalar`] to its canonical fixed-length big-endian encoding.
    ///
    /// [`Scalar`]: Field::Scalar
    fn serialize(scalar: &Self::Scalar) -> Self::Serialization;

    /// Attempts to map a fixed-length big-endian encoding back to a [`Scalar`].
    ///
    /// Fails if the encoding is not reduced modulo the field order.
    ///
    /// [`Scalar`]: Field::Scalar
    fn deserialize(buf: &Self::Serialization) -> Result<Self::Scalar, FieldError>;
}

/// A prime-order group (or subgroup) in which commitments and witnesses live.
///
/// The group law is written additively: `a + b` is the group operation and
/// `a * x` raises `a` to the scalar `x`. A commitment `g^{P(α)}` is therefore
/// computed as `generator() * P(α)`.
pub trait Group: Copy + Clone + PartialEq + Send + Sync + 'static {
    /// The scalar field of the group.
    type Field: Field;

    /// An element of our group that we will be computing over.
    type Element: Add<Output = Self::Element>
        + Copy
        + Clone
        + Debug
        + Eq
        + Mul<<Self::Field as Field>::Scalar, Output = Self::Element>
        + Neg<Output = Self::Element>
        + PartialEq
        + Send
        + Sync
        + Sub<Output = Self::Element>;

    /// A unique byte array buf of fixed length N, the compressed encoding of
    /// an element.
    type Serialization: AsRef<[u8]> + Debug + TryFrom<Vec<u8>>;

    /// Additive identity of the group.
    fn identity() -> Self::Element;

    /// The fixed generator element of the group.
    fn generator() -> Self::Element;

    /// Maps an [`Element`] to its compressed encoding. The identity is a
    /// valid input; zero-valued witnesses are encodable.
    ///
    /// [`Element`]: Group::Element
    fn serialize(element: &Self::Element) -> Self::Serialization;

    /// Attempts to map a compressed encoding back to an [`Element`], failing
    /// if the bytes are not a valid point of the prime-order subgroup.
    ///
    /// [`Element`]: Group::Element
    fn deserialize(buf: &Self::Serialization) -> Result<Self::Element, GroupError>;
}

/// A bilinear pairing `e: G1 x G2 -> Gt` together with its source groups.
///
/// Symmetric backends set `G2 = G1`. Protocol code only ever touches the
/// backend through this trait, so swapping curves does not affect the node or
/// bulletin board logic.
pub trait PairingSuite: Copy + Clone + PartialEq + Eq + Debug + Send + Sync + 'static {
    /// The suite ID string, used in logs and to tag serialized keys.
    const ID: &'static str;

    /// The group holding commitments and witnesses.
    type G1: Group;

    /// The second source group of the pairing, over the same scalar field.
    type G2: Group<Field = <Self::G1 as Group>::Field>;

    /// The pairing target group. Only equality is needed by verification.
    type Gt: Copy + Clone + Debug + Eq + PartialEq;

    /// Computes the pairing `e(p, q)`.
    fn pair(p: &<Self::G1 as Group>::Element, q: &<Self::G2 as Group>::Element) -> Self::Gt;
}

/// The scalar [`Field`] of a [`PairingSuite`].
pub type FieldOf<C> = <<C as PairingSuite>::G1 as Group>::Field;

/// An element of the [`PairingSuite`] `C`'s scalar [`Field`].
pub type Scalar<C> = <FieldOf<C> as Field>::Scalar;

/// An element of the [`PairingSuite`] `C`'s first source group.
pub type G1Element<C> = <<C as PairingSuite>::G1 as Group>::Element;

/// An element of the [`PairingSuite`] `C`'s second source group.
pub type G2Element<C> = <<C as PairingSuite>::G2 as Group>::Element;
