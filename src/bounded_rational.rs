//! Bounded rationals (§4.1): exact arbitrary-precision rationals that
//! self-destruct into a designated `Null` value once their representation
//! size crosses `MAX_SIZE` bits, preventing unbounded blow-up during
//! symbolic simplification in [`crate::unified_real::UnifiedReal`].
//!
//! Reduction is delegated to [`num_rational::Ratio`] (always-reduced,
//! denominator-normalized-positive), the same crate the teacher already
//! depends on, generalized here from `Ratio<i64>` to `Ratio<BigInt>` since
//! BR needs unbounded precision. The nullification check is this module's
//! own addition layered on top.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{DomainError, NullOperationError};
use crate::macros::forward_ref_binop;

/// Bit-length ceiling (§9 Open Questions: must be at least 10,000 to pass
/// the boundary scenarios in §8).
pub const MAX_SIZE: u64 = 10_000;
/// Bit-length ceiling for [`BoundedRational::extract_square_will_succeed`]
/// (§9: must be at least 5,000).
pub const EXTRACT_SQUARE_MAX_LEN: u64 = 5_000;

#[derive(Clone, Debug)]
enum Repr {
    Null,
    Valid(BigRational),
}

/// Either `Null` or an exact `num/den` pair. See the module docs.
#[derive(Clone, Debug)]
pub struct BoundedRational {
    repr: Repr,
}

fn bits_of(r: &BigRational) -> u64 {
    r.numer().bits() + r.denom().bits()
}

impl BoundedRational {
    /// The distinguished invalid element (§3 "Null BR").
    pub fn null() -> Self {
        BoundedRational { repr: Repr::Null }
    }

    /// `num_rational::Ratio::new` already reduces by the numerator/denominator
    /// GCD before this ever sees `r`, so the per-operand `MAX_SIZE/2` check
    /// the spec describes as "attempt a GCD reduction" is a no-op here — the
    /// reduction has already happened. Nullify only on the combined bit
    /// length that remains after that reduction.
    fn valid(r: BigRational) -> Self {
        if bits_of(&r) > MAX_SIZE {
            BoundedRational { repr: Repr::Null }
        } else {
            BoundedRational { repr: Repr::Valid(r) }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.repr, Repr::Null)
    }

    fn as_ratio(&self) -> Option<&BigRational> {
        match &self.repr {
            Repr::Null => None,
            Repr::Valid(r) => Some(r),
        }
    }

    fn null_op(op: &'static str) -> NullOperationError {
        NullOperationError { op }
    }

    pub fn from_i64(n: i64) -> Self {
        Self::valid(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn from_i128(n: i128) -> Self {
        Self::valid(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn from_big_int(n: BigInt) -> Self {
        Self::valid(BigRational::from_integer(n))
    }

    /// Construct `num/den`. Raises [`DomainError::DivideByZero`] for a zero
    /// denominator (this is the one BR constructor that can fail outright —
    /// every other operation on an already-constructed BR propagates `Null`
    /// instead).
    pub fn from_ratio(num: BigInt, den: BigInt) -> Result<Self, DomainError> {
        if den.is_zero() {
            return Err(DomainError::DivideByZero);
        }
        Ok(Self::valid(BigRational::new(num, den)))
    }

    /// Exact binary expansion of `d`'s mantissa. Fails on NaN/±Inf.
    pub fn from_f64(d: f64) -> Result<Self, DomainError> {
        if d.is_nan() || d.is_infinite() {
            return Err(DomainError::NanOrInfToExact);
        }
        let r = BigRational::from_float(d).expect("finite f64 always has an exact binary expansion");
        Ok(Self::valid(r))
    }

    pub fn zero() -> Self {
        Self::valid(BigRational::zero())
    }

    pub fn one() -> Self {
        Self::valid(BigRational::one())
    }

    pub fn neg_one() -> Self {
        Self::valid(-BigRational::one())
    }

    pub fn half() -> Self {
        Self::valid(BigRational::new(BigInt::one(), BigInt::from(2)))
    }

    pub fn is_zero_valid(&self) -> bool {
        matches!(&self.repr, Repr::Valid(r) if r.is_zero())
    }

    /// `sign(num) * sign(den)`; `den`'s sign is not canonical on input but
    /// `Ratio` always normalizes it positive, so this is just `num`'s sign.
    pub fn sign(&self) -> Result<i32, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("sign"))?;
        Ok(if r.is_zero() {
            0
        } else if r.is_negative() {
            -1
        } else {
            1
        })
    }

    pub fn bit_length(&self) -> Result<u64, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("bit_length"))?;
        Ok(bits_of(r))
    }

    /// `floor(log2|x|)`, approximated from numerator/denominator bit
    /// lengths (exact for powers of two, off by at most one otherwise).
    pub fn whole_number_bits(&self) -> Result<i64, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("whole_number_bits"))?;
        if r.is_zero() {
            return Ok(i64::MIN);
        }
        let n = r.numer().magnitude().bits() as i64;
        let d = r.denom().magnitude().bits() as i64;
        Ok(n - d)
    }

    /// Returns `i32::MIN` (cast to `f64`) for zero, per §4.1.
    pub fn approx_log2_abs(&self) -> f64 {
        match self.as_ratio() {
            None => i32::MIN as f64,
            Some(r) if r.is_zero() => i32::MIN as f64,
            Some(r) => r.numer().magnitude().bits() as f64 - r.denom().magnitude().bits() as f64,
        }
    }

    pub fn floor(&self) -> Result<BigInt, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("floor"))?;
        Ok(r.numer().div_floor(r.denom()))
    }

    pub fn to_i32(&self) -> Result<i32, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("to_i32"))?;
        r.to_integer().to_i32().ok_or_else(|| Self::null_op("to_i32"))
    }

    /// `None` for a non-integer value *or* for `Null` (§7: "`ToBigInteger`
    /// on null returns the absent-value sentinel rather than raising").
    pub fn to_big_integer(&self) -> Option<BigInt> {
        let r = self.as_ratio()?;
        if r.denom().is_one() {
            Some(r.numer().clone())
        } else {
            None
        }
    }

    pub fn to_double(&self) -> Result<f64, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("to_double"))?;
        Ok(r.to_f64().unwrap_or(if r.is_negative() { f64::NEG_INFINITY } else { f64::INFINITY }))
    }

    pub fn to_constructive_real(&self) -> Result<crate::constructive_real::ConstructiveReal, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("to_constructive_real"))?;
        Ok(crate::constructive_real::ConstructiveReal::from_ratio(r.numer().clone(), r.denom().clone()))
    }

    /// Minimum decimal digits after the point for an exact finite decimal
    /// expansion, or `i32::MAX` when the expansion is infinite (detectable
    /// by whether `den`, after removing factors of 2 and 5, is 1).
    pub fn digits_required(&self) -> Result<i32, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("digits_required"))?;
        if r.is_zero() {
            return Ok(0);
        }
        let mut den = r.denom().magnitude().clone();
        let two = BigUint::from(2u32);
        let five = BigUint::from(5u32);
        let mut c2 = 0i32;
        let mut c5 = 0i32;
        while (&den % &two).is_zero() {
            den /= &two;
            c2 += 1;
        }
        while (&den % &five).is_zero() {
            den /= &five;
            c5 += 1;
        }
        Ok(if den.is_one() { c2.max(c5) } else { i32::MAX })
    }

    /// `extract_square_will_succeed` check (§9): bit length under the
    /// trial-division-friendly ceiling.
    pub fn extract_square_will_succeed(&self) -> bool {
        matches!(self.bit_length(), Ok(b) if b <= EXTRACT_SQUARE_MAX_LEN)
    }

    /// Factor `self = a^2 * b` with `b` square-free in numerator and
    /// denominator and `a` non-negative. Trial division over small factors,
    /// in the style of a calculator's own square extraction (it only needs
    /// to recognize `sqrt(12) = 2*sqrt(3)`, not factor cryptographic
    /// semiprimes) — see `extract_square_will_succeed` for the size this is
    /// expected to be called at.
    pub fn extract_square_reduced(&self) -> Result<(Self, Self), NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("extract_square_reduced"))?;
        if r.is_zero() {
            return Ok((Self::zero(), Self::one()));
        }
        let negative = r.is_negative();
        let (num_s, num_t) = extract_square_biguint(r.numer().magnitude());
        let (den_s, den_t) = extract_square_biguint(r.denom().magnitude());
        let a = BigRational::new(BigInt::from(num_s), BigInt::from(den_s));
        let mut b = BigRational::new(BigInt::from(num_t), BigInt::from(den_t));
        if negative {
            b = -b;
        }
        Ok((Self::valid(a), Self::valid(b)))
    }

    /// `self^n` for integer `n`. `0^0 = 1`; `0^negative` has no rational
    /// answer and nullifies.
    pub fn pow_i64(&self, exp: i64) -> Self {
        let r = match self.as_ratio() {
            None => return Self::null(),
            Some(r) => r,
        };
        if exp == 0 {
            return Self::one();
        }
        if r.is_zero() {
            return if exp > 0 { Self::zero() } else { Self::null() };
        }
        let mag = exp.unsigned_abs();
        let Ok(n) = u32::try_from(mag) else {
            return Self::null();
        };
        let result = BigRational::new(r.numer().pow(n), r.denom().pow(n));
        Self::valid(if exp < 0 { result.recip() } else { result })
    }

    /// `self^exponent`, succeeding only when the result is itself rational.
    pub fn pow_br(&self, exponent: &Self) -> Option<Self> {
        let base = self.as_ratio()?;
        let exp = exponent.as_ratio()?;
        if exp.denom().is_one() {
            let e = exp.numer().to_i64()?;
            return Some(self.pow_i64(e));
        }
        if base.is_zero() {
            return if exp.is_negative() { None } else { Some(Self::zero()) };
        }
        let p = exp.numer().to_i64()?;
        let q = exp.denom().to_i64()?;
        let q = i32::try_from(q).ok()?;
        self.pow_i64(p).nth_root(q).ok().flatten()
    }

    /// Exact rational `n`-th root. `n < 0` means the reciprocal root;
    /// `n == 0` is a [`DomainError::ZerothRoot`]; a negative radicand is
    /// legal only when `n` is odd ([`DomainError::EvenRootOfNegative`]
    /// otherwise). `Ok(None)` means no exact rational root exists.
    pub fn nth_root(&self, n: i32) -> Result<Option<Self>, DomainError> {
        if n == 0 {
            return Err(DomainError::ZerothRoot);
        }
        let r = match self.as_ratio() {
            None => return Ok(Some(Self::null())),
            Some(r) => r.clone(),
        };
        if n < 0 {
            return Ok(match self.nth_root(-n)? {
                None => None,
                Some(root) if root.is_zero_valid() => None,
                Some(root) => root.checked_inverse().ok(),
            });
        }
        if r.is_negative() && n % 2 == 0 {
            return Err(DomainError::EvenRootOfNegative);
        }
        let negative = r.is_negative();
        let n_u = n as u32;
        let num_root = exact_nth_root(r.numer().magnitude(), n_u);
        let den_root = exact_nth_root(r.denom().magnitude(), n_u);
        Ok(match (num_root, den_root) {
            (Some(nr), Some(dr)) => {
                let mut result = BigRational::new(BigInt::from(nr), BigInt::from(dr));
                if negative {
                    result = -result;
                }
                Some(Self::valid(result))
            }
            _ => None,
        })
    }

    pub fn checked_inverse(&self) -> Result<Self, DomainError> {
        let r = match self.as_ratio() {
            None => return Ok(Self::null()),
            Some(r) => r,
        };
        if r.is_zero() {
            return Err(DomainError::DivideByZero);
        }
        Ok(Self::valid(r.recip()))
    }

    pub fn checked_div(&self, other: &Self) -> Result<Self, DomainError> {
        match (self.as_ratio(), other.as_ratio()) {
            (_, None) | (None, _) => Ok(Self::null()),
            (Some(a), Some(b)) => {
                if b.is_zero() {
                    Err(DomainError::DivideByZero)
                } else {
                    Ok(Self::valid(a / b))
                }
            }
        }
    }

    /// `-1` if `Null`, else the usual three-way comparison. §9's open
    /// question: `Null < Null` is `0`, `Null < valid` is `-1`.
    pub fn compare_to(&self, other: &Self) -> i32 {
        match (self.as_ratio(), other.as_ratio()) {
            (None, None) => 0,
            (None, Some(_)) => -1,
            (Some(_), None) => 1,
            (Some(a), Some(b)) => match a.cmp(b) {
                std::cmp::Ordering::Less => -1,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Greater => 1,
            },
        }
    }

    pub fn to_display_string(&self, unicode_fraction: bool, mixed: bool) -> Result<String, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("to_display_string"))?;
        let slash = if unicode_fraction { '\u{2044}' } else { '/' };
        if r.denom().is_one() {
            return Ok(r.numer().to_string());
        }
        if mixed {
            let negative = r.is_negative();
            let abs_num = r.numer().magnitude();
            let den = r.denom().magnitude();
            let whole = abs_num / den;
            let rem = abs_num % den;
            let sign = if negative { "-" } else { "" };
            return Ok(format!("{sign}{whole} {rem}{slash}{den}"));
        }
        Ok(format!("{}{slash}{}", r.numer(), r.denom()))
    }

    pub fn to_string_truncated(&self, n: usize) -> Result<String, NullOperationError> {
        let r = self.as_ratio().ok_or_else(|| Self::null_op("to_string_truncated"))?;
        let negative = r.is_negative();
        let abs = r.abs();
        let scale = BigInt::from(10u32).pow(n as u32);
        let scaled = (abs.numer() * &scale) / abs.denom();
        let digits = scaled.to_string();
        let padded = if digits.len() <= n {
            format!("{}{}", "0".repeat(n + 1 - digits.len()), digits)
        } else {
            digits
        };
        let split_at = padded.len() - n;
        let (int_part, frac_part) = padded.split_at(split_at);
        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(int_part);
        if n > 0 {
            out.push('.');
            out.push_str(frac_part);
        }
        Ok(out)
    }
}

fn extract_square_biguint(n: &BigUint) -> (BigUint, BigUint) {
    if n.is_zero() {
        return (BigUint::zero(), BigUint::zero());
    }
    if n.is_one() {
        return (BigUint::one(), BigUint::one());
    }
    let mut remaining = n.clone();
    let mut square_part = BigUint::one();
    let mut p = BigUint::from(2u32);
    while &p * &p <= remaining {
        let p2 = &p * &p;
        while (&remaining % &p2).is_zero() {
            remaining /= &p2;
            square_part *= &p;
        }
        p += if p == BigUint::from(2u32) { BigUint::one() } else { BigUint::from(2u32) };
    }
    (square_part, remaining)
}

fn exact_nth_root(val: &BigUint, n: u32) -> Option<BigUint> {
    if val.is_zero() {
        return Some(BigUint::zero());
    }
    let root = val.nth_root(n);
    if &root.pow(n) == val { Some(root) } else { None }
}

impl fmt::Display for BoundedRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_ratio() {
            None => write!(f, "Null"),
            Some(r) => write!(f, "{}/{}", r.numer(), r.denom()),
        }
    }
}

impl PartialEq for BoundedRational {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_ratio(), other.as_ratio()) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for BoundedRational {}

impl Hash for BoundedRational {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.as_ratio() {
            None => 0u8.hash(state),
            Some(r) => {
                1u8.hash(state);
                r.numer().hash(state);
                r.denom().hash(state);
            }
        }
    }
}

impl Zero for BoundedRational {
    fn zero() -> Self {
        BoundedRational::zero()
    }

    fn is_zero(&self) -> bool {
        self.is_zero_valid()
    }
}

impl One for BoundedRational {
    fn one() -> Self {
        BoundedRational::one()
    }
}

impl Neg for BoundedRational {
    type Output = Self;
    fn neg(self) -> Self {
        match self.as_ratio() {
            None => Self::null(),
            Some(r) => Self::valid(-r),
        }
    }
}

impl Neg for &BoundedRational {
    type Output = BoundedRational;
    fn neg(self) -> BoundedRational {
        self.clone().neg()
    }
}

impl Add for BoundedRational {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        match (self.as_ratio(), rhs.as_ratio()) {
            (Some(a), Some(b)) => Self::valid(a + b),
            _ => Self::null(),
        }
    }
}
forward_ref_binop!(impl Add, add for BoundedRational);

impl Sub for BoundedRational {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        match (self.as_ratio(), rhs.as_ratio()) {
            (Some(a), Some(b)) => Self::valid(a - b),
            _ => Self::null(),
        }
    }
}
forward_ref_binop!(impl Sub, sub for BoundedRational);

impl Mul for BoundedRational {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        match (self.as_ratio(), rhs.as_ratio()) {
            (Some(a), Some(b)) => Self::valid(a * b),
            _ => Self::null(),
        }
    }
}
forward_ref_binop!(impl Mul, mul for BoundedRational);

impl Div for BoundedRational {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        self.checked_div(&rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}
forward_ref_binop!(impl Div, div for BoundedRational);

#[cfg(test)]
mod tests {
    use super::*;

    fn br(n: i64, d: i64) -> BoundedRational {
        BoundedRational::from_ratio(BigInt::from(n), BigInt::from(d)).unwrap()
    }

    #[test]
    fn reduction_invariant() {
        let r = br(6, 9);
        let ratio = r.as_ratio().unwrap();
        assert_eq!(*ratio.numer(), BigInt::from(2));
        assert_eq!(*ratio.denom(), BigInt::from(3));
    }

    #[test]
    fn extract_square_reduced_scenario() {
        let r = br(343, 352);
        let (a, b) = r.extract_square_reduced().unwrap();
        assert_eq!(a, br(7, 4));
        assert_eq!(b, br(7, 22));
    }

    #[test]
    fn addition_and_division_scenarios() {
        assert_eq!(br(1, 2) + br(1, 3), br(5, 6));
        assert_eq!(br(1, 2) / br(1, 3), br(3, 2));
    }

    #[test]
    fn pow_scenarios() {
        assert_eq!(BoundedRational::from_i64(2).pow_i64(-3), br(1, 8));
        assert_eq!(BoundedRational::from_i64(-1).pow_i64(3), BoundedRational::from_i64(-1));
        assert_eq!(BoundedRational::from_i64(0).pow_i64(0), BoundedRational::one());
    }

    #[test]
    fn digits_required_scenarios() {
        assert_eq!(br(1, 3).digits_required().unwrap(), i32::MAX);
        assert_eq!(br(1, 10).digits_required().unwrap(), 1);
        assert_eq!(br(3, 4).to_string_truncated(3).unwrap(), "0.750");
    }

    #[test]
    fn null_propagates_through_arithmetic() {
        let null = BoundedRational::null();
        assert!((null.clone() + br(1, 2)).is_null());
        assert!((br(1, 2) * null.clone()).is_null());
        assert_eq!(null.to_big_integer(), None);
        assert!(null.sign().is_err());
    }

    #[test]
    fn nullification_on_oversized_operands() {
        let huge = BoundedRational::from_big_int(BigInt::from(10).pow(3_000) + BigInt::one());
        let tiny = BoundedRational::from_ratio(BigInt::one(), BigInt::from(10).pow(3_000) + BigInt::from(3)).unwrap();
        assert!((huge * tiny).is_null());
    }

    #[test]
    fn null_ordering_matches_open_question() {
        let null = BoundedRational::null();
        assert_eq!(null.compare_to(&null), 0);
        assert_eq!(null.compare_to(&BoundedRational::one()), -1);
        assert_eq!(BoundedRational::one().compare_to(&null), 1);
    }

    #[test]
    fn nth_root_and_pow_br() {
        let four = BoundedRational::from_i64(4);
        assert_eq!(four.nth_root(2).unwrap(), Some(BoundedRational::from_i64(2)));
        let two = BoundedRational::from_i64(2);
        assert_eq!(BoundedRational::from_i64(8).nth_root(3).unwrap(), Some(two));
        assert_eq!(BoundedRational::from_i64(2).nth_root(3).unwrap(), None);
        let half = BoundedRational::half();
        assert_eq!(four.pow_br(&half), Some(BoundedRational::from_i64(2)));
    }
}
