//! Exact real arithmetic: arbitrary-precision rationals
//! ([`bounded_rational::BoundedRational`]), a lazily-evaluated, memoized DAG
//! of approximation nodes ([`constructive_real::ConstructiveReal`]),
//! composable unary functions over it ([`unary_cr_function::UnaryCrFunction`]),
//! and a normal-form combination of the two that prefers exact algebraic
//! simplification and falls back to constructive-real evaluation only when
//! it must ([`unified_real::UnifiedReal`]).
//!
//! Every approximation carries an explicit error bound: `approx(p)` returns
//! an integer within one unit of the true value scaled by `2^p`. There is no
//! floating point anywhere in the representation; `f64` only appears at the
//! conversion boundary (`to_f64`) where callers have explicitly asked to
//! give up exactness.

// Macros must be declared first so they're available in other modules.
#[macro_use]
pub mod macros;

pub mod bounded_rational;
pub mod constructive_real;
pub mod error;
pub mod precision;
pub mod unary_cr_function;
pub mod unified_real;

pub use crate::bounded_rational::BoundedRational;
pub use crate::constructive_real::ConstructiveReal;
pub use crate::error::{CrError, DomainError, Error, FormatError, NullOperationError, OverflowError, PrecisionOverflowError};
pub use crate::precision::{get_default_precision, get_max_iterations, set_default_precision, set_max_iterations, Precision};
pub use crate::unary_cr_function::UnaryCrFunction;
pub use crate::unified_real::{CrKind, UnifiedReal};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_rational_and_constructive_real_agree_on_simple_values() {
        let half_br = BoundedRational::from_ratio(1.into(), 2.into()).unwrap();
        let half_cr = half_br.to_constructive_real().unwrap();
        assert_eq!(half_cr.compare_to(&ConstructiveReal::one().shift(-1), -20).unwrap(), 0);
    }

    #[test]
    fn unified_real_pi_round_trips_through_the_public_api() {
        let pi = UnifiedReal::pi();
        assert!(pi.is_comparable(&UnifiedReal::from_i64(3)));
        assert!(pi.compare_to(&UnifiedReal::from_i64(4)) < 0);
    }
}
