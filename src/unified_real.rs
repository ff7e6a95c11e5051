//! The unified real (§4.4): a normal form `value = br · crFactor` that tries
//! exact algebraic simplification first and only falls through to
//! constructive-real evaluation when the factor isn't one of the closed
//! forms this module recognizes. This is the same "pick the cheapest exact
//! representation, fall back to a more general one" idea the teacher's
//! `NumberImpl` applies across `Rational | Decimal | BigDecimal` — here
//! generalized from *which decimal back end* to *which symbolic factor*.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One as _, ToPrimitive, Zero as _};
use once_cell::sync::OnceCell;

use crate::bounded_rational::BoundedRational;
use crate::constructive_real::ConstructiveReal;
use crate::error::{CrError, DomainError, NullOperationError};
use crate::macros::forward_ref_binop;
use crate::precision::Precision;

/// The symbolic class of a [`UnifiedReal`]'s `crFactor`. `q`, when present,
/// is carried alongside in [`UnifiedReal::q`] and is part of the factor's
/// identity for comparison purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrKind {
    One,
    Pi,
    Exp,
    Ln,
    Sqrt,
    SinPi,
    TanPi,
    Log,
    Irrational,
    Other,
}

/// `value = br · crFactor`. See the module docs.
pub struct UnifiedReal {
    br: BoundedRational,
    kind: CrKind,
    q: Option<BoundedRational>,
    cr_factor: ConstructiveReal,
    cached: OnceCell<ConstructiveReal>,
}

impl Clone for UnifiedReal {
    fn clone(&self) -> Self {
        UnifiedReal {
            br: self.br.clone(),
            kind: self.kind,
            q: self.q.clone(),
            cr_factor: self.cr_factor.clone(),
            cached: self.cached.clone(),
        }
    }
}

impl fmt::Debug for UnifiedReal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnifiedReal").field("br", &self.br).field("kind", &self.kind).field("q", &self.q).finish()
    }
}

impl UnifiedReal {
    fn with_kind(br: BoundedRational, kind: CrKind, q: Option<BoundedRational>, cr_factor: ConstructiveReal) -> Self {
        UnifiedReal { br, kind, q, cr_factor, cached: OnceCell::new() }
    }

    fn null_kind() -> Self {
        Self::with_kind(BoundedRational::null(), CrKind::One, None, ConstructiveReal::one())
    }

    fn other_from_parts(coeff: BoundedRational, cr: ConstructiveReal) -> Self {
        Self::with_kind(coeff, CrKind::Other, None, cr)
    }

    fn is_zero(&self) -> bool {
        // value = br * cr_factor, so br == 0 makes the whole value zero
        // regardless of which symbolic factor cr_factor carries.
        self.br.is_zero_valid()
    }

    pub fn is_null(&self) -> bool {
        self.br.is_null()
    }

    fn same_factor(&self, other: &Self) -> bool {
        self.kind == other.kind && self.q == other.q
    }

    fn value_cr(&self) -> Result<ConstructiveReal, NullOperationError> {
        if self.br.is_null() {
            return Err(NullOperationError { op: "to_constructive_real" });
        }
        self.cached
            .get_or_try_init(|| self.br.to_constructive_real().map(|br_cr| br_cr.mul(&self.cr_factor)))
            .map(|cr| cr.clone())
    }

    // -- factories & named constants ---------------------------------

    pub fn zero() -> Self {
        Self::from_br(BoundedRational::zero())
    }

    pub fn one() -> Self {
        Self::from_br(BoundedRational::one())
    }

    pub fn minus_one() -> Self {
        Self::from_br(BoundedRational::neg_one())
    }

    pub fn half() -> Self {
        Self::from_br(BoundedRational::half())
    }

    pub fn pi() -> Self {
        Self::with_kind(BoundedRational::one(), CrKind::Pi, None, ConstructiveReal::pi())
    }

    pub fn e() -> Self {
        Self::exp_kind(BoundedRational::one(), BoundedRational::one())
    }

    pub fn from_i64(n: i64) -> Self {
        Self::from_br(BoundedRational::from_i64(n))
    }

    pub fn from_br(br: BoundedRational) -> Self {
        if br.is_null() {
            return Self::null_kind();
        }
        Self::with_kind(br, CrKind::One, None, ConstructiveReal::one())
    }

    pub fn from_f64(d: f64) -> Result<Self, DomainError> {
        Ok(Self::from_br(BoundedRational::from_f64(d)?))
    }

    pub fn from_constructive_real(cr: ConstructiveReal) -> Self {
        Self::other_from_parts(BoundedRational::one(), cr)
    }

    fn sqrt_kind(coeff: BoundedRational, q: BoundedRational) -> Self {
        if q.is_null() || coeff.is_null() {
            return Self::null_kind();
        }
        match q.sign() {
            Ok(s) if s < 0 => return Self::null_kind(),
            Err(_) => return Self::null_kind(),
            _ => {}
        }
        if q.is_zero_valid() {
            return Self::zero();
        }
        let (a, b) = match q.extract_square_reduced() {
            Ok(v) => v,
            Err(_) => return Self::null_kind(),
        };
        let new_coeff = &coeff * &a;
        if b == BoundedRational::one() {
            Self::with_kind(new_coeff, CrKind::One, None, ConstructiveReal::one())
        } else {
            let cr = match b.to_constructive_real() {
                Ok(c) => c.sqrt(),
                Err(_) => return Self::null_kind(),
            };
            Self::with_kind(new_coeff, CrKind::Sqrt, Some(b), cr)
        }
    }

    fn exp_kind(coeff: BoundedRational, q: BoundedRational) -> Self {
        if q.is_null() || coeff.is_null() {
            return Self::null_kind();
        }
        if q.is_zero_valid() {
            return Self::with_kind(coeff, CrKind::One, None, ConstructiveReal::one());
        }
        let cr = match q.to_constructive_real() {
            Ok(c) => c.exp(),
            Err(_) => return Self::null_kind(),
        };
        Self::with_kind(coeff, CrKind::Exp, Some(q), cr)
    }

    fn ln_kind(coeff: BoundedRational, q: BoundedRational) -> Self {
        if q == BoundedRational::one() {
            return Self::zero();
        }
        let cr = match q.to_constructive_real() {
            Ok(c) => c.ln(),
            Err(_) => return Self::null_kind(),
        };
        Self::with_kind(coeff, CrKind::Ln, Some(q), cr)
    }

    fn log_kind(coeff: BoundedRational, q: BoundedRational) -> Self {
        if q == BoundedRational::one() {
            return Self::zero();
        }
        let cr = match q.to_constructive_real() {
            Ok(c) => c.log10(),
            Err(_) => return Self::null_kind(),
        };
        Self::with_kind(coeff, CrKind::Log, Some(q), cr)
    }

    fn as_pi_multiple(&self) -> Option<BoundedRational> {
        if self.is_zero() {
            Some(BoundedRational::zero())
        } else if self.kind == CrKind::Pi {
            Some(self.br.clone())
        } else {
            None
        }
    }

    fn sin_pi_kind(coeff: BoundedRational, q: BoundedRational) -> Self {
        if q.is_null() {
            return Self::null_kind();
        }
        if let Some(exact) = sin_pi_rational_table(&q) {
            return Self::with_kind(&coeff * &exact, CrKind::One, None, ConstructiveReal::one());
        }
        let cr = match q.to_constructive_real() {
            Ok(c) => c.mul(&ConstructiveReal::pi()).sin(),
            Err(_) => return Self::null_kind(),
        };
        Self::with_kind(coeff, CrKind::SinPi, Some(q), cr)
    }

    fn tan_pi_kind(coeff: BoundedRational, q: BoundedRational) -> Result<Self, DomainError> {
        if q.is_null() {
            return Ok(Self::null_kind());
        }
        match tan_pi_rational_table(&q) {
            Some(Some(exact)) => return Ok(Self::with_kind(&coeff * &exact, CrKind::One, None, ConstructiveReal::one())),
            // `q` lands on an odd multiple of 1/2: tan has a genuine pole there.
            Some(None) => return Err(DomainError::DivideByZero),
            None => {}
        }
        let cr = match q.to_constructive_real() {
            Ok(c) => {
                let arg = c.mul(&ConstructiveReal::pi());
                arg.sin().div(&arg.cos())
            }
            Err(_) => return Ok(Self::null_kind()),
        };
        Ok(Self::with_kind(coeff, CrKind::TanPi, Some(q), cr))
    }

    // -- arithmetic ----------------------------------------------------

    pub fn add(&self, other: &Self) -> Self {
        if self.br.is_null() || other.br.is_null() {
            return Self::null_kind();
        }
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        if self.same_factor(other) {
            return Self::with_kind(&self.br + &other.br, self.kind, self.q.clone(), self.cr_factor.clone());
        }
        match (self.value_cr(), other.value_cr()) {
            (Ok(a), Ok(b)) => Self::other_from_parts(BoundedRational::one(), a.add(&b)),
            _ => Self::null_kind(),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> Self {
        Self::with_kind(-self.br.clone(), self.kind, self.q.clone(), self.cr_factor.clone())
    }

    pub fn mul(&self, other: &Self) -> Self {
        if self.br.is_null() || other.br.is_null() {
            return Self::null_kind();
        }
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let coeff = &self.br * &other.br;
        match (self.kind, other.kind) {
            (CrKind::One, CrKind::One) => Self::with_kind(coeff, CrKind::One, None, ConstructiveReal::one()),
            (CrKind::One, k) => Self::with_kind(coeff, k, other.q.clone(), other.cr_factor.clone()),
            (k, CrKind::One) => Self::with_kind(coeff, k, self.q.clone(), self.cr_factor.clone()),
            (CrKind::Sqrt, CrKind::Sqrt) => {
                let qa = self.q.clone().unwrap();
                let qb = other.q.clone().unwrap();
                Self::sqrt_kind(coeff, &qa * &qb)
            }
            (CrKind::Exp, CrKind::Exp) => {
                let qa = self.q.clone().unwrap();
                let qb = other.q.clone().unwrap();
                Self::exp_kind(coeff, &qa + &qb)
            }
            _ => match (self.value_cr(), other.value_cr()) {
                (Ok(a), Ok(b)) => Self::other_from_parts(coeff, a.mul(&b)),
                _ => Self::null_kind(),
            },
        }
    }

    pub fn checked_inverse(&self) -> Result<Self, DomainError> {
        if self.br.is_null() {
            return Ok(Self::null_kind());
        }
        if self.is_zero() {
            return Err(DomainError::DivideByZero);
        }
        let inv_coeff = self.br.checked_inverse()?;
        match (&self.kind, &self.q) {
            (CrKind::One, _) => Ok(Self::with_kind(inv_coeff, CrKind::One, None, ConstructiveReal::one())),
            (CrKind::Sqrt, Some(q)) => {
                let denom_coeff = &self.br * q;
                Ok(Self::sqrt_kind(denom_coeff.checked_inverse()?, q.clone()))
            }
            (CrKind::Exp, Some(q)) => Ok(Self::exp_kind(inv_coeff, -q.clone())),
            _ => {
                let cr = self.value_cr().map_err(|_| DomainError::DivideByZero)?;
                Ok(Self::other_from_parts(BoundedRational::one(), cr.inverse()))
            }
        }
    }

    pub fn checked_div(&self, other: &Self) -> Result<Self, DomainError> {
        Ok(self.mul(&other.checked_inverse()?))
    }

    fn pow_integer(&self, e: i64) -> Self {
        if e == 0 {
            return Self::one();
        }
        let base = if e < 0 {
            match self.checked_inverse() {
                Ok(b) => b,
                Err(_) => return Self::null_kind(),
            }
        } else {
            self.clone()
        };
        let mut result = Self::one();
        let mut b = base;
        let mut n = e.unsigned_abs();
        while n > 0 {
            if n & 1 == 1 {
                result = result.mul(&b);
            }
            b = b.mul(&b);
            n >>= 1;
        }
        result
    }

    fn signum_for_pow(&self) -> Result<i32, DomainError> {
        let cr = self.value_cr().map_err(|_| DomainError::NegativeBaseFractionalExponent)?;
        cr.signum_unbounded().map_err(|_| DomainError::NegativeBaseFractionalExponent)
    }

    /// `self^exponent`. Integer exponents dispatch through repeated
    /// squaring over [`Self::mul`] (reusing its simplification rules);
    /// `0^0 = 1`; a negative base with a non-integer exponent is a
    /// [`DomainError`] (§4.4 "Pow").
    pub fn checked_pow(&self, exponent: &Self) -> Result<Self, DomainError> {
        if self.br.is_null() || exponent.br.is_null() {
            return Ok(Self::null_kind());
        }
        if exponent.is_zero() {
            return Ok(Self::one());
        }
        if exponent.kind == CrKind::One {
            if let Some(e_big) = exponent.br.to_big_integer() {
                if let Some(e) = e_big.to_i64() {
                    return Ok(self.pow_integer(e));
                }
            }
        }
        if self.is_zero() {
            return Err(DomainError::NegativeBaseFractionalExponent);
        }
        if self.kind == CrKind::One && exponent.kind == CrKind::One {
            let sign = self.br.sign().unwrap_or(0);
            if sign < 0 {
                return Err(DomainError::NegativeBaseFractionalExponent);
            }
            if let Some(result) = self.br.pow_br(&exponent.br) {
                return Ok(Self::from_br(result));
            }
        }
        let base_sign = self.signum_for_pow()?;
        if base_sign < 0 {
            return Err(DomainError::NegativeBaseFractionalExponent);
        }
        let base_cr = self.value_cr().map_err(|_| DomainError::NegativeBaseFractionalExponent)?;
        let exp_cr = exponent.value_cr().map_err(|_| DomainError::NegativeBaseFractionalExponent)?;
        Ok(Self::other_from_parts(BoundedRational::one(), base_cr.ln().mul(&exp_cr).exp()))
    }

    pub fn sqrt(&self) -> Self {
        if self.br.is_null() {
            return Self::null_kind();
        }
        if self.kind == CrKind::One {
            return Self::sqrt_kind(BoundedRational::one(), self.br.clone());
        }
        match self.value_cr() {
            Ok(cr) => Self::other_from_parts(BoundedRational::one(), cr.sqrt()),
            Err(_) => Self::null_kind(),
        }
    }

    pub fn exp(&self) -> Self {
        if self.br.is_null() {
            return Self::null_kind();
        }
        if self.kind == CrKind::One {
            return Self::exp_kind(BoundedRational::one(), self.br.clone());
        }
        match self.value_cr() {
            Ok(cr) => Self::other_from_parts(BoundedRational::one(), cr.exp()),
            Err(_) => Self::null_kind(),
        }
    }

    /// `ln(e^q · r) = q + ln r` when `r` is known rational and positive
    /// (§4.4 "Exp/Ln"); otherwise falls through to CR evaluation.
    pub fn ln(&self) -> Self {
        if self.br.is_null() {
            return Self::null_kind();
        }
        if self.kind == CrKind::One {
            if let Ok(s) = self.br.sign() {
                if s > 0 {
                    return Self::ln_kind(BoundedRational::one(), self.br.clone());
                }
            }
        }
        if self.kind == CrKind::Exp {
            if let (Some(q), Ok(r_sign)) = (&self.q, self.br.sign()) {
                if r_sign > 0 {
                    let ln_r = Self::ln_kind(BoundedRational::one(), self.br.clone());
                    return Self::from_br(q.clone()).add(&ln_r);
                }
            }
        }
        match self.value_cr() {
            Ok(cr) => Self::other_from_parts(BoundedRational::one(), cr.ln()),
            Err(_) => Self::null_kind(),
        }
    }

    pub fn log(&self) -> Self {
        if self.br.is_null() {
            return Self::null_kind();
        }
        if self.kind == CrKind::One {
            if let Ok(s) = self.br.sign() {
                if s > 0 {
                    return Self::log_kind(BoundedRational::one(), self.br.clone());
                }
            }
        }
        match self.value_cr() {
            Ok(cr) => Self::other_from_parts(BoundedRational::one(), cr.log10()),
            Err(_) => Self::null_kind(),
        }
    }

    pub fn sin(&self) -> Self {
        if self.br.is_null() {
            return Self::null_kind();
        }
        if let Some(q) = self.as_pi_multiple() {
            return Self::sin_pi_kind(BoundedRational::one(), q);
        }
        match self.value_cr() {
            Ok(cr) => Self::other_from_parts(BoundedRational::one(), cr.sin()),
            Err(_) => Self::null_kind(),
        }
    }

    /// `cos(theta) = sin(theta + pi/2)`, which also routes through the
    /// pi-multiple table whenever `theta` already is one.
    pub fn cos(&self) -> Self {
        self.add(&Self::pi().mul(&Self::half())).sin()
    }

    /// `tan(theta)`, fatal at a genuine pole (an odd multiple of `pi/2`)
    /// rather than collapsing it to a null value.
    pub fn checked_tan(&self) -> Result<Self, DomainError> {
        if self.br.is_null() {
            return Ok(Self::null_kind());
        }
        if let Some(q) = self.as_pi_multiple() {
            return Self::tan_pi_kind(BoundedRational::one(), q);
        }
        let s = self.sin();
        let c = self.cos();
        s.checked_div(&c)
    }

    pub fn asin(&self) -> Self {
        match self.value_cr() {
            Ok(cr) => Self::other_from_parts(BoundedRational::one(), crate::unary_cr_function::UnaryCrFunction::asin().execute(&cr)),
            Err(_) => Self::null_kind(),
        }
    }

    pub fn acos(&self) -> Self {
        match self.value_cr() {
            Ok(cr) => Self::other_from_parts(BoundedRational::one(), crate::unary_cr_function::UnaryCrFunction::acos().execute(&cr)),
            Err(_) => Self::null_kind(),
        }
    }

    pub fn atan(&self) -> Self {
        match self.value_cr() {
            Ok(cr) => Self::other_from_parts(BoundedRational::one(), cr.atan()),
            Err(_) => Self::null_kind(),
        }
    }

    pub fn abs(&self) -> Self {
        let negative = self.value_cr().ok().and_then(|cr| cr.signum_unbounded().ok()).map(|s| s < 0).unwrap_or(false);
        if negative {
            self.neg()
        } else {
            self.clone()
        }
    }

    pub fn floor(&self) -> Result<BigInt, NullOperationError> {
        if self.kind == CrKind::One {
            return self.br.floor();
        }
        let cr = self.value_cr()?;
        let appr = cr.approx(-100).map_err(|_| NullOperationError { op: "floor" })?;
        let scale = BigInt::from(2u32).pow(100);
        Ok(appr.div_floor(&scale))
    }

    pub fn ceil(&self) -> Result<BigInt, NullOperationError> {
        if self.kind == CrKind::One {
            if let Some(i) = self.br.to_big_integer() {
                return Ok(i);
            }
        }
        Ok(self.floor()? + BigInt::one())
    }

    pub fn round(&self) -> Result<BigInt, NullOperationError> {
        self.add(&Self::half()).floor()
    }

    pub fn gcd(&self, other: &Self) -> Result<Self, NullOperationError> {
        let a = self.floor()?;
        let b = other.floor()?;
        Ok(Self::from_br(BoundedRational::from_big_int(a.gcd(&b))))
    }

    // -- comparisons -----------------------------------------------------

    fn is_known_rational(&self) -> bool {
        self.kind == CrKind::One
    }

    fn is_known_irrational(&self) -> bool {
        matches!(self.kind, CrKind::Pi | CrKind::Sqrt | CrKind::Exp | CrKind::Ln) && !self.is_zero()
    }

    pub fn is_comparable(&self, other: &Self) -> bool {
        if self.br.is_null() || other.br.is_null() {
            return true;
        }
        self.same_factor(other) || self.is_known_rational() || other.is_known_rational() || (self.is_known_irrational() && other.is_known_irrational())
    }

    /// Exact-first comparison: symbolic when the factors line up, otherwise
    /// a CR comparison at the library's default precision (§4.4).
    pub fn compare_to(&self, other: &Self) -> i32 {
        if self.br.is_null() || other.br.is_null() {
            return self.br.compare_to(&other.br);
        }
        if self.same_factor(other) {
            return self.br.compare_to(&other.br);
        }
        match (self.value_cr(), other.value_cr()) {
            (Ok(a), Ok(b)) => a.compare_to(&b, crate::precision::get_default_precision()).unwrap_or(0),
            _ => 0,
        }
    }

    /// Unconditional CR comparison at an explicit precision.
    pub fn compare_to_precision(&self, other: &Self, p: Precision) -> Result<i32, CrError> {
        let a = self.value_cr().map_err(|_| CrError::PrecisionOverflow(crate::error::PrecisionOverflowError))?;
        let b = other.value_cr().map_err(|_| CrError::PrecisionOverflow(crate::error::PrecisionOverflowError))?;
        a.compare_to(&b, p)
    }

    /// Self-check: `|br·crFactor - cached| <= 2^p` (§8 invariant 5).
    pub fn property_correct(&self, p: Precision) -> bool {
        if self.br.is_null() {
            return true;
        }
        match (self.br.to_constructive_real(), self.value_cr()) {
            (Ok(br_cr), Ok(cached)) => {
                let expected = br_cr.mul(&self.cr_factor);
                expected.compare_to(&cached, p).map(|c| c == 0).unwrap_or(false)
            }
            _ => false,
        }
    }

    // -- conversions & display -------------------------------------------

    pub fn to_f64(&self) -> Result<f64, crate::error::Error> {
        let cr = self.value_cr()?;
        Ok(cr.to_f64()?)
    }

    pub fn to_constructive_real(&self) -> Result<ConstructiveReal, NullOperationError> {
        self.value_cr()
    }

    fn factor_symbol(&self) -> Option<String> {
        match (&self.kind, &self.q) {
            (CrKind::Pi, _) => Some("\u{03c0}".to_string()),
            (CrKind::Sqrt, Some(q)) => Some(format!("\u{221a}{q}")),
            (CrKind::Exp, Some(q)) => Some(format!("e^({q})")),
            (CrKind::Ln, Some(q)) => Some(format!("ln({q})")),
            (CrKind::SinPi, Some(q)) => Some(format!("sin(\u{03c0}\u{00b7}{q})")),
            (CrKind::TanPi, Some(q)) => Some(format!("tan(\u{03c0}\u{00b7}{q})")),
            (CrKind::Log, Some(q)) => Some(format!("log({q})")),
            _ => None,
        }
    }

    pub fn to_display_string(&self, digits: usize) -> String {
        if self.br.is_null() {
            return "Null".to_string();
        }
        if self.is_zero() {
            return "0".to_string();
        }
        if self.kind == CrKind::One {
            return self.br.to_display_string(false, false).unwrap_or_else(|_| "Null".to_string());
        }
        match self.factor_symbol() {
            Some(sym) if self.br == BoundedRational::one() => sym,
            Some(sym) => format!("{}\u{00b7}{}", self.br.to_display_string(false, false).unwrap_or_default(), sym),
            None => match self.to_f64() {
                Ok(v) => format!("~{v:.*}", digits),
                Err(_) => "~?".to_string(),
            },
        }
    }
}

fn bounded_mod(q: &BoundedRational, modulus: &BoundedRational) -> Option<BoundedRational> {
    let ratio = q.checked_div(modulus).ok()?;
    let k = ratio.floor().ok()?;
    Some(q - &(modulus * &BoundedRational::from_big_int(k)))
}

/// Partial table of `sin(pi*q)` for `q` whose result is exactly rational
/// (the sqrt-valued angles like `pi/4`, `pi/6` are left to the `SinPi`
/// symbolic factor and CR evaluation rather than hand-tabulated here).
fn sin_pi_rational_table(q: &BoundedRational) -> Option<BoundedRational> {
    let two = BoundedRational::from_i64(2);
    let reduced = bounded_mod(q, &two)?;
    if reduced == BoundedRational::zero() || reduced == BoundedRational::one() {
        Some(BoundedRational::zero())
    } else if reduced == BoundedRational::half() {
        Some(BoundedRational::one())
    } else if reduced == BoundedRational::from_ratio(BigInt::from(3), BigInt::from(2)).ok()? {
        Some(BoundedRational::neg_one())
    } else {
        None
    }
}

fn tan_pi_rational_table(q: &BoundedRational) -> Option<Option<BoundedRational>> {
    let one = BoundedRational::one();
    let reduced = bounded_mod(q, &one)?;
    if reduced == BoundedRational::zero() {
        Some(Some(BoundedRational::zero()))
    } else if reduced == BoundedRational::half() {
        Some(None)
    } else {
        None
    }
}

impl fmt::Display for UnifiedReal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string(10))
    }
}

impl PartialEq for UnifiedReal {
    fn eq(&self, other: &Self) -> bool {
        if self.br.is_null() || other.br.is_null() {
            return self.br.is_null() && other.br.is_null();
        }
        self.compare_to(other) == 0
    }
}

impl Add for UnifiedReal {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        UnifiedReal::add(&self, &rhs)
    }
}
forward_ref_binop!(impl Add, add for UnifiedReal);

impl Sub for UnifiedReal {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        UnifiedReal::sub(&self, &rhs)
    }
}
forward_ref_binop!(impl Sub, sub for UnifiedReal);

impl Mul for UnifiedReal {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        UnifiedReal::mul(&self, &rhs)
    }
}
forward_ref_binop!(impl Mul, mul for UnifiedReal);

impl Div for UnifiedReal {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        self.checked_div(&rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}
forward_ref_binop!(impl Div, div for UnifiedReal);

impl Neg for UnifiedReal {
    type Output = Self;
    fn neg(self) -> Self {
        UnifiedReal::neg(&self)
    }
}

impl Neg for &UnifiedReal {
    type Output = UnifiedReal;
    fn neg(self) -> UnifiedReal {
        UnifiedReal::neg(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_two_times_sqrt_two_is_two_exactly() {
        let s2 = UnifiedReal::from_br(BoundedRational::from_i64(2)).sqrt();
        let product = s2.mul(&s2);
        assert_eq!(product.kind, CrKind::One);
        assert_eq!(product, UnifiedReal::from_i64(2));
    }

    #[test]
    fn reciprocal_of_rational_is_exact_one() {
        let x = UnifiedReal::from_br(BoundedRational::from_ratio(BigInt::from(7), BigInt::from(3)).unwrap());
        let inv = x.checked_inverse().unwrap();
        let one = x.mul(&inv);
        assert_eq!(one, UnifiedReal::one());
    }

    #[test]
    fn pi_is_comparable_to_rational() {
        let pi = UnifiedReal::pi();
        let three = UnifiedReal::from_i64(3);
        assert!(pi.is_comparable(&three));
        assert!(pi.compare_to(&three) > 0);
    }

    #[test]
    fn zero_addition_identity() {
        let x = UnifiedReal::pi();
        assert_eq!(x.add(&UnifiedReal::zero()), x);
    }

    #[test]
    fn property_correct_holds_for_named_constants() {
        assert!(UnifiedReal::pi().property_correct(-50));
        assert!(UnifiedReal::e().property_correct(-50));
        assert!(UnifiedReal::from_i64(5).sqrt().property_correct(-50));
    }

    #[test]
    fn sin_of_pi_over_two_is_exact_one() {
        let half_pi = UnifiedReal::pi().mul(&UnifiedReal::half());
        assert_eq!(half_pi.sin(), UnifiedReal::one());
    }

    #[test]
    fn pow_integer_negative_exponent() {
        let two = UnifiedReal::from_i64(2);
        let result = two.checked_pow(&UnifiedReal::from_i64(-3)).unwrap();
        assert_eq!(result, UnifiedReal::from_br(BoundedRational::from_ratio(BigInt::from(1), BigInt::from(8)).unwrap()));
    }

    #[test]
    fn tan_at_an_odd_multiple_of_half_pi_is_a_domain_error() {
        let half_pi = UnifiedReal::pi().mul(&UnifiedReal::half());
        assert!(half_pi.checked_tan().is_err());
    }

    #[test]
    fn tan_of_zero_is_exact_zero() {
        assert_eq!(UnifiedReal::zero().checked_tan().unwrap(), UnifiedReal::zero());
    }

    #[test]
    fn is_zero_does_not_depend_on_kind() {
        let zero_sqrt = UnifiedReal::sqrt_kind(BoundedRational::zero(), BoundedRational::from_i64(2));
        assert!(zero_sqrt.is_zero());
        assert!(!zero_sqrt.is_known_irrational());
        assert_eq!(zero_sqrt, UnifiedReal::zero());
    }
}
