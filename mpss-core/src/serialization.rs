//! Serialization support.
//!
//! Field scalars travel as variable-length big-endian magnitudes (leading zero
//! bytes stripped); group elements travel in their fixed-size compressed
//! encoding. Structured messages are encoded with `postcard`.

use crate::{Error, Field, FieldError, Group, GroupError};

/// Encodes a scalar as its big-endian magnitude without leading zeros.
///
/// Zero encodes to the empty byte string.
pub fn scalar_to_bytes<F: Field>(scalar: &F::Scalar) -> Vec<u8> {
    let fixed = F::serialize(scalar);
    let bytes = fixed.as_ref();
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

/// Decodes a big-endian magnitude produced by [`scalar_to_bytes`].
///
/// Rejects inputs longer than the field encoding and values not reduced
/// modulo the field order.
pub fn scalar_from_bytes<F: Field>(bytes: &[u8]) -> Result<F::Scalar, Error> {
    let len = F::serialize(&F::zero()).as_ref().len();
    if bytes.len() > len {
        return Err(FieldError::MalformedScalar.into());
    }
    let mut padded = vec![0u8; len - bytes.len()];
    padded.extend_from_slice(bytes);
    let serialization =
        F::Serialization::try_from(padded).map_err(|_| FieldError::MalformedScalar)?;
    Ok(F::deserialize(&serialization)?)
}

/// Encodes a group element in its compressed form.
pub fn element_to_bytes<G: Group>(element: &G::Element) -> Vec<u8> {
    G::serialize(element).as_ref().to_vec()
}

/// Decodes a compressed group element, checking its length and validity.
pub fn element_from_bytes<G: Group>(bytes: &[u8]) -> Result<G::Element, Error> {
    let serialization =
        G::Serialization::try_from(bytes.to_vec()).map_err(|_| GroupError::MalformedElement)?;
    Ok(G::deserialize(&serialization)?)
}

/// Serde adapter for opaque byte fields: hex in human-readable formats, raw
/// bytes otherwise.
pub(crate) mod bytes {
    pub(crate) fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serdect::slice::serialize_hex_lower_or_bin(&value, serializer)
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serdect::slice::deserialize_hex_or_bin_vec(deserializer)
    }
}

// Default byte-oriented serialization for structs that need to be communicated.
//
// Note that we still manually implement these methods in each applicable type,
// instead of making these traits `pub` and asking users to import the traits.

pub(crate) trait Serialize {
    /// Serialize the struct into a Vec.
    fn serialize(&self) -> Result<Vec<u8>, Error>;
}

pub(crate) trait Deserialize {
    /// Deserialize the struct from a slice of bytes.
    fn deserialize(bytes: &[u8]) -> Result<Self, Error>
    where
        Self: core::marker::Sized;
}

impl<T: serde::Serialize> Serialize for T {
    fn serialize(&self) -> Result<Vec<u8>, Error> {
        postcard::to_allocvec(self).map_err(|_| Error::SerializationError)
    }
}

impl<T: for<'de> serde::Deserialize<'de>> Deserialize for T {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        postcard::from_bytes(bytes).map_err(|_| Error::DeserializationError)
    }
}
