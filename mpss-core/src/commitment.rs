//! Commitments: the discrete-log commitment `g^x` and the Kate polynomial
//! commitment `g^{P(α)}` with evaluation witnesses.

use core::{
    fmt::{self, Debug},
    ops::Add,
};

use crate::{
    serialization::{element_from_bytes, element_to_bytes},
    Error, G1Element, Group, PairingSuite,
};

pub mod dl;
pub mod kate;

macro_rules! g1_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq)]
        pub struct $name<C: PairingSuite>(pub(crate) G1Element<C>);

        impl<C> $name<C>
        where
            C: PairingSuite,
        {
            /// Wraps a group element.
            #[cfg_attr(feature = "internals", visibility::make(pub))]
            #[cfg_attr(docsrs, doc(cfg(feature = "internals")))]
            pub(crate) fn new(element: G1Element<C>) -> Self {
                Self(element)
            }

            /// Returns the inner group element.
            pub fn to_element(&self) -> G1Element<C> {
                self.0
            }

            /// Serialize to the compressed encoding.
            pub fn serialize(&self) -> Vec<u8> {
                element_to_bytes::<C::G1>(&self.0)
            }

            /// Deserialize from the compressed encoding.
            pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
                Ok(Self(element_from_bytes::<C::G1>(bytes)?))
            }
        }

        impl<C> Add for $name<C>
        where
            C: PairingSuite,
        {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl<C> Debug for $name<C>
        where
            C: PairingSuite,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&hex::encode(self.serialize()))
                    .finish()
            }
        }
    };
}

g1_newtype!(
    /// A Kate commitment `g^{P(α)}` to a polynomial `P`.
    ///
    /// Commitments are additively homomorphic: the sum of two commitments is
    /// the commitment to the sum of the polynomials.
    PolyCommitment
);

g1_newtype!(
    /// A witness `g^{Q(α)}` for the quotient `Q(x) = (P(x) - P(x0)) / (x - x0)`,
    /// proving a claimed evaluation of a committed polynomial.
    Witness
);

g1_newtype!(
    /// A discrete-log commitment `g^x` to a single scalar.
    ShareCommitment
);

impl<C> PolyCommitment<C>
where
    C: PairingSuite,
{
    /// The commitment to the zero polynomial, i.e. the group identity.
    pub fn identity() -> Self {
        Self(<C::G1>::identity())
    }
}

impl<C> From<ShareCommitment<C>> for PolyCommitment<C>
where
    C: PairingSuite,
{
    /// `g^x` is also the Kate commitment of the constant polynomial `x`.
    fn from(commitment: ShareCommitment<C>) -> Self {
        Self(commitment.0)
    }
}
