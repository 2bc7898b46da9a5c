//! Discrete-log commitment `commit(x) = g^x`.
//!
//! Used for the scalar zero-shares, whose Lagrange-weighted sum can then be
//! checked in the exponent without revealing any share.

use crate::{Group, PairingSuite, Scalar};

use super::ShareCommitment;

/// Commits to `x` as `g^x`.
pub fn commit<C: PairingSuite>(x: &Scalar<C>) -> ShareCommitment<C> {
    ShareCommitment::new(<C::G1>::generator() * *x)
}

/// Checks `commitment == g^x`.
pub fn verify<C: PairingSuite>(commitment: &ShareCommitment<C>, x: &Scalar<C>) -> bool {
    commit::<C>(x) == *commitment
}
