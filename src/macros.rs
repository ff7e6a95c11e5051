//! Shared macros for the library.
//!
//! `forward_ref_binop!` is the one piece of the teacher's macro module that
//! survives unchanged in spirit: it saves writing four copies of every
//! arithmetic trait impl (by value, by ref, and the two mixed forms) for
//! each of [`crate::bounded_rational::BoundedRational`],
//! [`crate::constructive_real::ConstructiveReal`], and
//! [`crate::unified_real::UnifiedReal`].

/// Generate the three reference-taking variants of a binary operator impl
/// given the owned-by-owned impl already exists.
macro_rules! forward_ref_binop {
    (impl $trait:ident, $method:ident for $type:ty) => {
        impl $trait<&$type> for $type {
            type Output = $type;
            fn $method(self, rhs: &$type) -> $type {
                $trait::$method(self, rhs.clone())
            }
        }

        impl $trait<$type> for &$type {
            type Output = $type;
            fn $method(self, rhs: $type) -> $type {
                $trait::$method(self.clone(), rhs)
            }
        }

        impl $trait<&$type> for &$type {
            type Output = $type;
            fn $method(self, rhs: &$type) -> $type {
                $trait::$method(self.clone(), rhs.clone())
            }
        }
    };
}

pub(crate) use forward_ref_binop;
