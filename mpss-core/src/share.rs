//! Share records, initial dealing and zero-sharing.
//!
//! Every node holds one [`ShareRecord`] per party. Slot `j` of node `i` is the
//! evaluation `R_j(i)` of party `j`'s polynomial together with its witness
//! against `commit(R_j)`, the commitment the bulletin board keeps in slot `j`.
//! The shared secret is `Σ λ_j R_j(0)` over all parties.

use std::collections::BTreeMap;

use core::fmt::{self, Debug};

use derive_getters::Getters;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::{
    commitment::{kate::CommitmentKey, PolyCommitment, Witness},
    polynomial::{lagrange_coefficients_at_zero, lagrange_interpolate, Polynomial},
    Error, Field, FieldOf, PairingSuite, ProtocolConfig, Scalar,
};

/// Maps a party index to its evaluation point.
pub fn index_scalar<F: Field>(index: u16) -> F::Scalar {
    F::from_u64(index.into())
}

/// One evaluation of a shared polynomial and the witness proving it.
#[derive(Clone, PartialEq, Eq, Getters)]
pub struct ShareRecord<C: PairingSuite> {
    /// The evaluation point, i.e. the holder's party index.
    pub(crate) index: u16,
    /// The evaluation `R(index)`.
    pub(crate) value: Scalar<C>,
    /// The witness for `value` against `commit(R)`.
    pub(crate) witness: Witness<C>,
}

impl<C> ShareRecord<C>
where
    C: PairingSuite,
{
    /// Create a new [`ShareRecord`].
    pub fn new(index: u16, value: Scalar<C>, witness: Witness<C>) -> Self {
        Self {
            index,
            value,
            witness,
        }
    }

    /// Evaluates `poly` at `index` and creates the matching witness.
    pub fn from_polynomial(
        key: &CommitmentKey<C>,
        poly: &Polynomial<FieldOf<C>>,
        index: u16,
    ) -> Result<Self, Error> {
        let x = index_scalar::<FieldOf<C>>(index);
        Ok(Self::new(index, poly.evaluate(x), key.create_witness(poly, x)?))
    }

    /// Checks the record against the commitment to its polynomial.
    pub fn verify(&self, key: &CommitmentKey<C>, commitment: &PolyCommitment<C>) -> bool {
        key.verify_eval(
            commitment,
            index_scalar::<FieldOf<C>>(self.index),
            self.value,
            &self.witness,
        )
    }
}

impl<C> Debug for ShareRecord<C>
where
    C: PairingSuite,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareRecord")
            .field("index", &self.index)
            .field("value", &"<redacted>")
            .field("witness", &self.witness)
            .finish()
    }
}

impl<C> Zeroize for ShareRecord<C>
where
    C: PairingSuite,
{
    fn zeroize(&mut self) {
        self.value = <FieldOf<C>>::zero();
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
    }
}

impl<C> Drop for ShareRecord<C>
where
    C: PairingSuite,
{
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// The output of a dealing: the share slots of every node keyed by party
/// index, and the commitment to every party's polynomial in slot order.
pub type Dealing<C> = (BTreeMap<u16, Vec<ShareRecord<C>>>, Vec<PolyCommitment<C>>);

/// Deals the replicated sharing: a single random polynomial `R` whose
/// constant is `secret` stands in for every party's polynomial, so every
/// slot of node `i` holds `R(i)` and every board slot holds `commit(R)`.
pub fn deal_replicated<C: PairingSuite, R: RngCore + CryptoRng>(
    config: &ProtocolConfig,
    key: &CommitmentKey<C>,
    secret: Scalar<C>,
    rng: &mut R,
) -> Result<Dealing<C>, Error> {
    let poly = Polynomial::random_with_constant(config.degree().into(), secret, rng);
    let polys = vec![poly; config.parties().into()];
    deal_polynomials(config, key, &polys)
}

/// Deals a bivariate sharing of `secret`.
///
/// Samples `B(x, y) = Σ c_ab x^a y^b` with `a, b <= t` and `c_00 = secret`;
/// party `j`'s polynomial is `R_j(x) = B(x, j)`.
pub fn deal_bivariate<C: PairingSuite, R: RngCore + CryptoRng>(
    config: &ProtocolConfig,
    key: &CommitmentKey<C>,
    secret: Scalar<C>,
    rng: &mut R,
) -> Result<Dealing<C>, Error> {
    let degree = usize::from(config.degree());
    // Column a holds c_a(y) = Σ_b c_ab y^b.
    let columns: Vec<Polynomial<FieldOf<C>>> = (0..=degree)
        .map(|a| {
            if a == 0 {
                Polynomial::random_with_constant(degree, secret, rng)
            } else {
                Polynomial::random(degree, rng)
            }
        })
        .collect();
    let polys: Vec<_> = config
        .indices()
        .map(|j| {
            let y = index_scalar::<FieldOf<C>>(j);
            Polynomial::from_coefficients(columns.iter().map(|c| c.evaluate(y)).collect())
        })
        .collect();
    deal_polynomials(config, key, &polys)
}

/// Builds every node's share slots from the per-party polynomials.
fn deal_polynomials<C: PairingSuite>(
    config: &ProtocolConfig,
    key: &CommitmentKey<C>,
    polys: &[Polynomial<FieldOf<C>>],
) -> Result<Dealing<C>, Error> {
    let commitments = polys
        .iter()
        .map(|p| key.commit(p))
        .collect::<Result<Vec<_>, _>>()?;
    let mut shares = BTreeMap::new();
    for i in config.indices() {
        let slots = polys
            .iter()
            .map(|p| ShareRecord::from_polynomial(key, p, i))
            .collect::<Result<Vec<_>, _>>()?;
        shares.insert(i, slots);
    }
    Ok((shares, commitments))
}

/// Recombines the constants `R_j(0)` of all parties' polynomials, given in
/// party order, into the shared secret `Σ λ_j R_j(0)`.
pub fn reconstruct_secret<F: Field>(constants: &[F::Scalar]) -> Result<F::Scalar, Error> {
    let indices: Vec<_> = (1..=constants.len())
        .map(|i| u16::try_from(i).map(index_scalar::<F>))
        .collect::<Result<_, _>>()
        .map_err(|_| Error::InvalidParties)?;
    let lambdas = lagrange_coefficients_at_zero::<F>(&indices)?;
    Ok(lambdas
        .iter()
        .zip(constants.iter())
        .fold(F::zero(), |acc, (l, c)| acc + *l * *c))
}

/// Recovers the shared secret from the share slots of the first `t + 1`
/// nodes: every party's polynomial is interpolated back from its slot, then
/// the constants are recombined with [`reconstruct_secret`].
pub fn recover_secret<C: PairingSuite>(
    config: &ProtocolConfig,
    shares: &BTreeMap<u16, Vec<ShareRecord<C>>>,
) -> Result<Scalar<C>, Error> {
    let holders: Vec<_> = shares.values().take(config.threshold()).collect();
    if holders.len() < config.threshold() {
        return Err(Error::NotEnoughPoints);
    }
    let xs: Vec<_> = holders
        .iter()
        .map(|slots| {
            slots
                .first()
                .map(|r| index_scalar::<FieldOf<C>>(r.index))
                .ok_or(Error::NotEnoughPoints)
        })
        .collect::<Result<_, _>>()?;
    let degree = usize::from(config.degree());
    let constants = (0..usize::from(config.parties()))
        .map(|slot| {
            let ys: Vec<_> = holders
                .iter()
                .map(|slots| slots.get(slot).map(|r| r.value).ok_or(Error::NotEnoughPoints))
                .collect::<Result<_, _>>()?;
            Ok(lagrange_interpolate::<FieldOf<C>>(&xs, &ys, degree)?.constant())
        })
        .collect::<Result<Vec<_>, Error>>()?;
    reconstruct_secret::<FieldOf<C>>(&constants)
}

/// Splits zero into `n` shares `s_i` with `Σ λ_i s_i = 0`, where `λ_i` are
/// the Lagrange coefficients at zero over the party indices.
///
/// The first `n - 1` shares are random; the last one is solved for.
#[cfg_attr(feature = "internals", visibility::make(pub))]
#[cfg_attr(docsrs, doc(cfg(feature = "internals")))]
pub(crate) fn zero_shares<F: Field, R: RngCore + CryptoRng>(
    config: &ProtocolConfig,
    rng: &mut R,
) -> Result<Vec<F::Scalar>, Error> {
    let indices: Vec<_> = config.indices().map(index_scalar::<F>).collect();
    let lambdas = lagrange_coefficients_at_zero::<F>(&indices)?;
    let (last_lambda, rest) = lambdas.split_last().ok_or(Error::InvalidParties)?;

    let mut shares: Vec<_> = rest.iter().map(|_| F::random(rng)).collect();
    let weighted = shares
        .iter()
        .zip(rest.iter())
        .fold(F::zero(), |acc, (s, l)| acc + *s * *l);
    shares.push(-weighted * F::invert(last_lambda)?);
    Ok(shares)
}
