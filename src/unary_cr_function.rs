//! Composable unary functions over constructive reals (§4.3). Modeled the
//! way the teacher's `ops` layer wraps pluggable behavior behind a trait
//! object rather than an enum, generalized here from "arithmetic operator"
//! to "any `CR -> CR` mapping" so `Compose`, `MonotoneDerivative`, and
//! `InverseMonotone` can build new instances at runtime.

use std::sync::Arc;

use crate::constructive_real::ConstructiveReal;
use crate::precision::Precision;

/// A polymorphic `CR -> CR` mapping. Prebuilt instances below cover the
/// elementary functions; `compose`/`monotone_derivative`/`inverse_monotone`
/// build new ones from existing ones or from an arbitrary closure.
#[derive(Clone)]
pub struct UnaryCrFunction(Arc<dyn Fn(&ConstructiveReal) -> ConstructiveReal + Send + Sync>);

impl UnaryCrFunction {
    pub fn new(f: impl Fn(&ConstructiveReal) -> ConstructiveReal + Send + Sync + 'static) -> Self {
        UnaryCrFunction(Arc::new(f))
    }

    pub fn execute(&self, x: &ConstructiveReal) -> ConstructiveReal {
        (self.0)(x)
    }

    pub fn identity() -> Self {
        Self::new(|x| x.clone())
    }

    pub fn negate() -> Self {
        Self::new(|x| x.neg())
    }

    pub fn inverse() -> Self {
        Self::new(|x| x.inverse())
    }

    pub fn abs() -> Self {
        Self::new(|x| x.abs().unwrap_or_else(|_| x.clone()))
    }

    pub fn sin() -> Self {
        Self::new(|x| x.sin())
    }

    pub fn cos() -> Self {
        Self::new(|x| x.cos())
    }

    pub fn tan() -> Self {
        Self::new(|x| x.sin().div(&x.cos()))
    }

    pub fn asin() -> Self {
        Self::sin().inverse_monotone(
            ConstructiveReal::pi().shift(-1).neg(),
            ConstructiveReal::pi().shift(-1),
        )
    }

    pub fn acos() -> Self {
        Self::cos().inverse_monotone(ConstructiveReal::from_int(0), ConstructiveReal::pi())
    }

    pub fn atan() -> Self {
        Self::new(|x| x.atan())
    }

    pub fn exp() -> Self {
        Self::new(|x| x.exp())
    }

    pub fn ln() -> Self {
        Self::new(|x| x.ln())
    }

    pub fn sqrt() -> Self {
        Self::new(|x| x.sqrt())
    }

    /// `g.compose(f)` is `x -> g(f(x))`.
    pub fn compose(&self, f: &Self) -> Self {
        let g = self.clone();
        let f = f.clone();
        Self::new(move |x| g.execute(&f.execute(x)))
    }

    /// The derivative of `self`, assumed monotone and differentiable on
    /// `[low, high]`, as a limit of symmetric difference quotients with
    /// precision doubling (§4.3): the step shrinks with the precision the
    /// result is actually queried at, rather than a fixed step baked in up
    /// front.
    pub fn monotone_derivative(&self, low: ConstructiveReal, high: ConstructiveReal) -> Self {
        let g = self.clone();
        Self::new(move |x| {
            let g = g.clone();
            let _ = (&low, &high);
            x.apply_with_precision(Arc::new(move |x, p| derivative_at(&g, x, p)))
        })
    }

    /// `self`'s inverse on `f([low, high])`, found by bisecting the input
    /// range while comparing `f(mid)` against the target at increasing
    /// precision (§4.3): both the comparison precision and the iteration
    /// budget scale with the precision the result is queried at.
    pub fn inverse_monotone(&self, low: ConstructiveReal, high: ConstructiveReal) -> Self {
        let g = self.clone();
        Self::new(move |target| {
            let g = g.clone();
            let low = low.clone();
            let high = high.clone();
            target.apply_with_precision(Arc::new(move |target, p| bisect_inverse(&g, target, &low, &high, p)))
        })
    }
}

/// Extra guard bits so the quotient's own rounding error stays well under
/// the truncation error the step size `h` introduces.
const DERIVATIVE_GUARD_BITS: i32 = 16;

/// `h` shrinks as `2^(p/2)`: the symmetric difference quotient's truncation
/// error is `O(h^2)`, so to halve the error once more (one more bit of
/// requested precision) `h` only needs to shrink by `sqrt(2)` -- doubling
/// the requested precision roughly squares the step's accuracy.
fn derivative_at(g: &UnaryCrFunction, x: &ConstructiveReal, p: Precision) -> ConstructiveReal {
    let step_shift = (p / 2) - DERIVATIVE_GUARD_BITS;
    let h = ConstructiveReal::one().shift(step_shift);
    let plus = g.execute(&x.add(&h));
    let minus = g.execute(&x.sub(&h));
    plus.sub(&minus).div(&h.shift(1))
}

/// Extra guard bits so bisection settles on a midpoint indistinguishable
/// from the true root at a finer precision than what the caller asked for.
const BISECTION_GUARD_BITS: i64 = 16;

fn bisect_inverse(
    g: &UnaryCrFunction,
    target: &ConstructiveReal,
    low: &ConstructiveReal,
    high: &ConstructiveReal,
    p: Precision,
) -> ConstructiveReal {
    let mut lo = low.clone();
    let mut hi = high.clone();
    let cmp_p = (p as i64 - BISECTION_GUARD_BITS).clamp(i32::MIN as i64, i32::MAX as i64) as Precision;
    // Each iteration halves the bracket; cover the bracket's own width plus
    // the requested precision so the bracket shrinks below `2^cmp_p` before
    // the budget runs out, bounded by the crate's iteration ceiling.
    let width_bits = lo.sub(&hi).approx(0).map(|a| a.magnitude().bits()).unwrap_or(64);
    let iterations = (width_bits as i64 + (-(cmp_p as i64)) + 16).clamp(64, crate::precision::get_max_iterations() as i64 * 4);
    for _ in 0..iterations {
        let mid = lo.add(&hi).shift(-1);
        let g_mid = g.execute(&mid);
        match g_mid.compare_to(target, cmp_p) {
            Ok(c) if c < 0 => lo = mid,
            Ok(c) if c > 0 => hi = mid,
            _ => return mid,
        }
    }
    lo.add(&hi).shift(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn identity_is_a_no_op() {
        let x = ConstructiveReal::from_int(5);
        let id = UnaryCrFunction::identity();
        assert_eq!(id.execute(&x).compare_to(&x, -30).unwrap(), 0);
    }

    #[test]
    fn compose_negate_with_negate_is_identity() {
        let x = ConstructiveReal::from_ratio(BigInt::from(3), BigInt::from(7));
        let negate = UnaryCrFunction::negate();
        let composed = negate.compose(&negate);
        assert_eq!(composed.execute(&x).compare_to(&x, -30).unwrap(), 0);
    }

    #[test]
    fn inverse_of_zero_is_precision_overflow() {
        let inv = UnaryCrFunction::inverse();
        let zero = ConstructiveReal::from_int(0);
        let result = inv.execute(&zero);
        assert!(result.to_f64().is_err());
    }
}
