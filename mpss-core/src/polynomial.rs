//! Dense polynomials over the scalar field and Lagrange interpolation.
//!
//! Coefficients are stored constant term first. A polynomial created with a
//! given degree keeps `degree + 1` coefficients even when the leading ones are
//! zero, so protocol polynomials always have the same shape on every node.

use core::{
    fmt::{self, Debug},
    iter,
    ops::{Add, Mul},
};

use itertools::Itertools;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::{Error, Field};

/// A polynomial `c_0 + c_1 x + ... + c_d x^d` over the field `F`.
#[derive(Clone)]
pub struct Polynomial<F: Field> {
    coefficients: Vec<F::Scalar>,
}

impl<F> Polynomial<F>
where
    F: Field,
{
    /// The zero polynomial with room for `degree + 1` coefficients.
    pub fn zero(degree: usize) -> Self {
        Self {
            coefficients: vec![F::zero(); degree + 1],
        }
    }

    /// Builds a polynomial from its coefficients, constant term first.
    ///
    /// An empty vector is treated as the zero constant.
    pub fn from_coefficients(coefficients: Vec<F::Scalar>) -> Self {
        if coefficients.is_empty() {
            return Self::zero(0);
        }
        Self { coefficients }
    }

    /// Samples a uniformly random polynomial of the given degree.
    pub fn random<R: RngCore + CryptoRng>(degree: usize, rng: &mut R) -> Self {
        Self {
            coefficients: iter::repeat_with(|| F::random(rng))
                .take(degree + 1)
                .collect(),
        }
    }

    /// Samples a random polynomial of the given degree whose constant term is
    /// fixed to `constant`.
    pub fn random_with_constant<R: RngCore + CryptoRng>(
        degree: usize,
        constant: F::Scalar,
        rng: &mut R,
    ) -> Self {
        let mut poly = Self::random(degree, rng);
        poly.set_constant(constant);
        poly
    }

    /// The nominal degree, i.e. the number of coefficients minus one.
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// The coefficients, constant term first.
    pub fn coefficients(&self) -> &[F::Scalar] {
        &self.coefficients
    }

    /// The constant term `P(0)`.
    pub fn constant(&self) -> F::Scalar {
        self.coefficients[0]
    }

    /// Replaces the constant term.
    pub fn set_constant(&mut self, value: F::Scalar) {
        self.coefficients[0] = value;
    }

    /// Evaluates the polynomial at `x` using Horner's method.
    pub fn evaluate(&self, x: F::Scalar) -> F::Scalar {
        self.coefficients
            .iter()
            .rev()
            .fold(F::zero(), |acc, c| acc * x + *c)
    }

    /// Evaluates the polynomial at every point of `xs`.
    pub fn evaluate_many(&self, xs: &[F::Scalar]) -> Vec<F::Scalar> {
        xs.iter().map(|x| self.evaluate(*x)).collect()
    }

    /// Computes `self += other * scalar`, growing `self` if `other` is longer.
    pub fn scalar_mul_add(&mut self, other: &Self, scalar: F::Scalar) {
        if other.coefficients.len() > self.coefficients.len() {
            self.coefficients.resize(other.coefficients.len(), F::zero());
        }
        for (c, o) in self.coefficients.iter_mut().zip(other.coefficients.iter()) {
            *c = *c + *o * scalar;
        }
    }

    /// Divides `self` by `divisor`, failing unless the remainder is zero.
    ///
    /// Used to strip a known root, e.g. dividing by `(x - x0)`.
    pub fn divide_exact(&self, divisor: &Self) -> Result<Self, Error> {
        let (quotient, remainder) = self.div_rem(divisor)?;
        if !remainder.is_zero() {
            return Err(Error::InexactDivision);
        }
        Ok(quotient)
    }

    /// Schoolbook long division.
    fn div_rem(&self, divisor: &Self) -> Result<(Self, Self), Error> {
        let d = divisor.significant_len();
        let lead = divisor.coefficients[d - 1];
        if lead == F::zero() {
            return Err(Error::DivisionByZero);
        }
        let n = self.significant_len();
        if n < d {
            return Ok((Self::zero(0), self.clone()));
        }

        let lead_inv = F::invert(&lead)?;
        let mut remainder = self.coefficients[..n].to_vec();
        let mut quotient = vec![F::zero(); n - d + 1];
        for k in (0..=n - d).rev() {
            let q = remainder[k + d - 1] * lead_inv;
            quotient[k] = q;
            for (j, c) in divisor.coefficients[..d].iter().enumerate() {
                remainder[k + j] = remainder[k + j] - q * *c;
            }
        }
        remainder.truncate((d - 1).max(1));

        Ok((
            Self::from_coefficients(quotient),
            Self::from_coefficients(remainder),
        ))
    }

    /// Number of coefficients up to and including the highest non-zero one
    /// (at least one).
    fn significant_len(&self) -> usize {
        self.coefficients
            .iter()
            .rposition(|c| *c != F::zero())
            .map_or(1, |i| i + 1)
    }

    fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|c| *c == F::zero())
    }

    /// Pads with zero coefficients up to the given nominal degree.
    fn pad_to(&mut self, degree: usize) {
        if self.coefficients.len() < degree + 1 {
            self.coefficients.resize(degree + 1, F::zero());
        }
    }

    /// The monic linear polynomial `x - root`.
    fn linear(root: F::Scalar) -> Self {
        Self {
            coefficients: vec![-root, F::one()],
        }
    }
}

impl<F: Field> PartialEq for Polynomial<F> {
    /// Two polynomials are equal when they agree on every coefficient, with
    /// missing leading coefficients read as zero.
    fn eq(&self, other: &Self) -> bool {
        let coefficient =
            |p: &Self, i: usize| p.coefficients.get(i).copied().unwrap_or_else(F::zero);
        let len = self.coefficients.len().max(other.coefficients.len());
        (0..len).all(|i| coefficient(self, i) == coefficient(other, i))
    }
}

impl<F: Field> Eq for Polynomial<F> {}

impl<F: Field> Debug for Polynomial<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polynomial")
            .field("degree", &self.degree())
            .field("coefficients", &"<redacted>")
            .finish()
    }
}

impl<F: Field> Add for &Polynomial<F> {
    type Output = Polynomial<F>;

    fn add(self, rhs: Self) -> Polynomial<F> {
        let mut sum = self.clone();
        sum.scalar_mul_add(rhs, F::one());
        sum
    }
}

impl<F: Field> Mul for &Polynomial<F> {
    type Output = Polynomial<F>;

    fn mul(self, rhs: Self) -> Polynomial<F> {
        let mut product =
            vec![F::zero(); self.coefficients.len() + rhs.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in rhs.coefficients.iter().enumerate() {
                product[i + j] = product[i + j] + *a * *b;
            }
        }
        Polynomial::from_coefficients(product)
    }
}

impl<F: Field> Zeroize for Polynomial<F> {
    fn zeroize(&mut self) {
        for c in self.coefficients.iter_mut() {
            *c = F::zero();
        }
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
    }
}

impl<F: Field> Drop for Polynomial<F> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Returns the unique polynomial of degree at most `degree` passing through
/// the first `degree + 1` points `(xs[i], ys[i])`.
///
/// Uses the basis-polynomial construction: the product `∏(x - x_i)` is
/// divided by each factor to get the i-th basis numerator, which is scaled by
/// `y_i` over its value at `x_i`.
pub fn lagrange_interpolate<F: Field>(
    xs: &[F::Scalar],
    ys: &[F::Scalar],
    degree: usize,
) -> Result<Polynomial<F>, Error> {
    if xs.len() != ys.len() || xs.len() < degree + 1 {
        return Err(Error::NotEnoughPoints);
    }
    let xs = &xs[..=degree];
    let ys = &ys[..=degree];

    let product = xs
        .iter()
        .fold(Polynomial::<F>::from_coefficients(vec![F::one()]), |acc, x| {
            &acc * &Polynomial::linear(*x)
        });

    let mut result = Polynomial::zero(degree);
    for (x, y) in xs.iter().zip_eq(ys.iter()) {
        let basis = product.divide_exact(&Polynomial::linear(*x))?;
        let denominator = basis.evaluate(*x);
        let inverse = F::invert(&denominator).map_err(|_| Error::DuplicatePoint)?;
        result.scalar_mul_add(&basis, *y * inverse);
    }
    result.pad_to(degree);
    result.coefficients.truncate(degree + 1);

    Ok(result)
}

/// Computes the Lagrange coefficients `λ_i = L_i(0)` for the nodes `xs`,
/// so that `P(0) = Σ λ_i P(x_i)` for any polynomial of degree below `xs.len()`.
pub fn lagrange_coefficients_at_zero<F: Field>(xs: &[F::Scalar]) -> Result<Vec<F::Scalar>, Error> {
    xs.iter()
        .enumerate()
        .map(|(i, x_i)| {
            let (numerator, denominator) = xs
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .fold((F::one(), F::one()), |(num, den), (_, x_j)| {
                    (num * *x_j, den * (*x_j - *x_i))
                });
            let inverse = F::invert(&denominator).map_err(|_| Error::DuplicatePoint)?;
            Ok(numerator * inverse)
        })
        .collect()
}
