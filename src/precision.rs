//! Precision control (§3, §5).
//!
//! A precision `p` is a signed integer: the approximation `A` of a real `x`
//! at precision `p` satisfies `|A - x*2^(-p)| <= 1`. Smaller (more negative)
//! `p` means more fraction bits are requested.
//!
//! The library itself never picks a precision on the caller's behalf except
//! in two spots the spec calls out explicitly: [`UnifiedReal`]'s
//! precision-free `compare_to`/`to_f64` (§4.4) and the iteration ceiling
//! that turns an undecidable refinement loop into a
//! [`crate::error::PrecisionOverflowError`] (§4.2's `msd`/inverse/ln
//! recurrences). Both are thread-local knobs in the same spirit as the
//! teacher's `precision::{get,set}_default_precision`.
//!
//! [`UnifiedReal`]: crate::unified_real::UnifiedReal

use std::cell::Cell;

pub type Precision = i32;

thread_local! {
    /// Precision used by [`UnifiedReal::to_f64`] and the no-precision form
    /// of `compare_to` when they must fall through to constructive-real
    /// evaluation.
    ///
    /// [`UnifiedReal::to_f64`]: crate::unified_real::UnifiedReal::to_f64
    static DEFAULT_PRECISION: Cell<Precision> = const { Cell::new(-60) };

    /// Iteration ceiling for recurrences that search for a most-significant
    /// bit or a stabilizing sign (inverse, ln, sign-of-zero). Exceeding it
    /// raises [`crate::error::PrecisionOverflowError`] rather than looping
    /// forever.
    static MAX_ITERATIONS: Cell<u32> = const { Cell::new(1_000) };
}

/// Set the default precision (in bits past the binary point) used by
/// operations that don't take an explicit precision argument.
pub fn set_default_precision(p: Precision) {
    DEFAULT_PRECISION.with(|c| c.set(p));
}

/// Read the current default precision.
pub fn get_default_precision() -> Precision {
    DEFAULT_PRECISION.with(|c| c.get())
}

/// Set the iteration ceiling for unbounded-looking refinement loops.
pub fn set_max_iterations(n: u32) {
    MAX_ITERATIONS.with(|c| c.set(n));
}

/// Read the current iteration ceiling.
pub fn get_max_iterations() -> u32 {
    MAX_ITERATIONS.with(|c| c.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_precision_round_trips() {
        let original = get_default_precision();
        set_default_precision(-100);
        assert_eq!(get_default_precision(), -100);
        set_default_precision(original);
    }

    #[test]
    fn max_iterations_round_trips() {
        let original = get_max_iterations();
        set_max_iterations(50);
        assert_eq!(get_max_iterations(), 50);
        set_max_iterations(original);
    }
}
