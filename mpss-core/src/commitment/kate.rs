//! Kate polynomial commitments.
//!
//! A commitment to `P` is `g^{P(α)}` for a trapdoor `α` nobody knows; it is
//! computed from the public powers `g^{α^i}` of the [`CommitmentKey`]. An
//! evaluation `P(x0) = y0` is proven with the witness `g^{Q(α)}` where
//! `Q(x) = (P(x) - y0) / (x - x0)`, and checked with two pairings.

use core::fmt::{self, Debug};

use crate::{
    polynomial::Polynomial, Error, Field, FieldOf, G1Element, G2Element, Group, PairingSuite,
    Scalar,
};

use super::{PolyCommitment, Witness};

/// The trapdoor used by [`CommitmentKey::insecure_fixed`].
pub const INSECURE_FIXED_TRAPDOOR: u64 = 2;

/// Public parameters of the Kate scheme for polynomials up to a maximum degree.
///
/// Holds `g^{α^0}, ..., g^{α^d}` in `G1` plus `h` and `h^α` in `G2`, which is
/// all verification needs.
#[derive(Clone, PartialEq, Eq)]
pub struct CommitmentKey<C: PairingSuite> {
    powers: Vec<G1Element<C>>,
    h: G2Element<C>,
    h_alpha: G2Element<C>,
}

impl<C> CommitmentKey<C>
where
    C: PairingSuite,
{
    /// Builds a key from a known trapdoor.
    ///
    /// INSECURE: whoever knows `trapdoor` can forge every witness. Only use
    /// this for tests and evaluation; production keys must come out of a
    /// multi-party setup and be loaded with [`CommitmentKey::from_powers`].
    pub fn insecure_fixed_setup(max_degree: usize, trapdoor: Scalar<C>) -> Self {
        let g = <C::G1>::generator();
        let h = <C::G2>::generator();
        let mut powers = Vec::with_capacity(max_degree + 1);
        let mut alpha_i = <FieldOf<C>>::one();
        for _ in 0..=max_degree {
            powers.push(g * alpha_i);
            alpha_i = alpha_i * trapdoor;
        }
        Self {
            powers,
            h,
            h_alpha: h * trapdoor,
        }
    }

    /// [`CommitmentKey::insecure_fixed_setup`] with the trapdoor
    /// [`INSECURE_FIXED_TRAPDOOR`], for reproducible test deployments.
    pub fn insecure_fixed(max_degree: usize) -> Self {
        Self::insecure_fixed_setup(
            max_degree,
            <FieldOf<C>>::from_u64(INSECURE_FIXED_TRAPDOOR),
        )
    }

    /// Builds a key from externally produced powers `g^{α^i}` and `h^α`.
    pub fn from_powers(
        powers: Vec<G1Element<C>>,
        h_alpha: G2Element<C>,
    ) -> Result<Self, Error> {
        if powers.is_empty() {
            return Err(Error::EmptyCommitmentKey);
        }
        Ok(Self {
            powers,
            h: <C::G2>::generator(),
            h_alpha,
        })
    }

    /// The largest polynomial degree this key can commit to.
    pub fn max_degree(&self) -> usize {
        self.powers.len() - 1
    }

    /// The public powers `g^{α^i}`.
    pub fn powers(&self) -> &[G1Element<C>] {
        &self.powers
    }

    /// Computes `g^{P(α)} = Σ c_i · g^{α^i}`.
    pub fn commit(&self, poly: &Polynomial<FieldOf<C>>) -> Result<PolyCommitment<C>, Error> {
        let coefficients = poly.coefficients();
        if coefficients.len() > self.powers.len() {
            return Err(Error::PolynomialTooLarge);
        }
        let element = coefficients
            .iter()
            .zip(self.powers.iter())
            .fold(<C::G1>::identity(), |acc, (c, p)| acc + *p * *c);
        Ok(PolyCommitment::new(element))
    }

    /// Checks that `commitment` opens to `poly`.
    pub fn verify_poly(
        &self,
        commitment: &PolyCommitment<C>,
        poly: &Polynomial<FieldOf<C>>,
    ) -> Result<bool, Error> {
        Ok(self.commit(poly)? == *commitment)
    }

    /// Creates the witness that `poly` evaluates to `poly(x0)` at `x0`.
    pub fn create_witness(
        &self,
        poly: &Polynomial<FieldOf<C>>,
        x0: Scalar<C>,
    ) -> Result<Witness<C>, Error> {
        let y0 = poly.evaluate(x0);
        let mut numerator = poly.clone();
        numerator.set_constant(numerator.constant() - y0);
        let divisor = Polynomial::from_coefficients(vec![-x0, <FieldOf<C>>::one()]);
        let quotient = numerator.divide_exact(&divisor)?;
        Ok(Witness::new(self.commit(&quotient)?.to_element()))
    }

    /// Checks `e(C - g*y0, h) == e(W, h*α - h*x0)`, i.e. that `witness`
    /// proves `P(x0) = y0` for the polynomial `P` behind `commitment`.
    pub fn verify_eval(
        &self,
        commitment: &PolyCommitment<C>,
        x0: Scalar<C>,
        y0: Scalar<C>,
        witness: &Witness<C>,
    ) -> bool {
        let lhs = C::pair(
            &(commitment.to_element() - <C::G1>::generator() * y0),
            &self.h,
        );
        let rhs = C::pair(&witness.to_element(), &(self.h_alpha - self.h * x0));
        lhs == rhs
    }
}

impl<C> Debug for CommitmentKey<C>
where
    C: PairingSuite,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitmentKey")
            .field("suite", &C::ID)
            .field("max_degree", &self.max_degree())
            .finish()
    }
}
