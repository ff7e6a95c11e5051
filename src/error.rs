//! Error types for the library (§7).
//!
//! Kept as hand-written enums with manual `Display`/`std::error::Error`
//! impls, in the teacher's `format::ParseError` idiom — no `thiserror`.
//! Domain errors are deterministic and fatal at the call site;
//! [`PrecisionOverflowError`] signals that no finite refinement within the
//! library's ceiling can decide a question; null-BR property access raises
//! [`NullOperationError`] rather than returning a bogus numeric answer.

use std::fmt;

/// Deterministic domain errors: the operation is undefined for its inputs
/// regardless of how much precision is thrown at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainError {
    DivideByZero,
    LogOfNonPositive,
    EvenRootOfNegative,
    NonIntegerToInteger,
    NegativeBaseFractionalExponent,
    NanOrInfToExact,
    ZerothRoot,
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::DivideByZero => write!(f, "division by zero"),
            DomainError::LogOfNonPositive => write!(f, "logarithm of a non-positive value"),
            DomainError::EvenRootOfNegative => write!(f, "even root of a negative value"),
            DomainError::NonIntegerToInteger => write!(f, "non-integer value has no integer conversion"),
            DomainError::NegativeBaseFractionalExponent => {
                write!(f, "negative base raised to a non-integer exponent")
            }
            DomainError::NanOrInfToExact => write!(f, "NaN or infinite value has no exact representation"),
            DomainError::ZerothRoot => write!(f, "0th root is undefined"),
        }
    }
}

impl std::error::Error for DomainError {}

/// String-parsing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    BadRadix(u32),
    InvalidCharacter { pos: usize, ch: char },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::BadRadix(r) => write!(f, "radix {r} is out of range [2, 16]"),
            FormatError::InvalidCharacter { pos, ch } => {
                write!(f, "invalid character '{ch}' at position {pos}")
            }
        }
    }
}

impl std::error::Error for FormatError {}

/// A narrowing conversion (e.g. `ConstructiveReal::to_i32`) was out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowError {
    pub target: &'static str,
}

impl fmt::Display for OverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value does not fit in {}", self.target)
    }
}

impl std::error::Error for OverflowError {}

/// No finite amount of refinement (within the library's configured
/// precision ceiling) could decide the question. Distinct from
/// [`DomainError`]: the value may in fact be well-defined, we just can't
/// prove it (e.g. the sign of a value that may be exactly zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrecisionOverflowError;

impl fmt::Display for PrecisionOverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "precision ceiling exceeded without resolving the result")
    }
}

impl std::error::Error for PrecisionOverflowError {}

/// A property with no meaningful answer on a null [`crate::bounded_rational::BoundedRational`]
/// was requested (`sign`, `floor`, `to_double`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullOperationError {
    pub op: &'static str,
}

impl fmt::Display for NullOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation '{}' has no answer on a null value", self.op)
    }
}

impl std::error::Error for NullOperationError {}

/// What a constructive-real node's `approx` can fail with: either the value
/// is provably outside the function's domain (`Domain`), or no bounded
/// amount of refinement could resolve it (`PrecisionOverflow`) — see §4.2's
/// distinction between "ln of a negative number" and "ln of zero".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrError {
    Domain(DomainError),
    PrecisionOverflow(PrecisionOverflowError),
}

impl fmt::Display for CrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrError::Domain(e) => write!(f, "{e}"),
            CrError::PrecisionOverflow(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CrError {}

impl From<DomainError> for CrError {
    fn from(e: DomainError) -> Self {
        CrError::Domain(e)
    }
}

impl From<PrecisionOverflowError> for CrError {
    fn from(e: PrecisionOverflowError) -> Self {
        CrError::PrecisionOverflow(e)
    }
}

/// Umbrella error aggregating every failure mode the library's boundary can
/// raise (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Domain(DomainError),
    Format(FormatError),
    Overflow(OverflowError),
    PrecisionOverflow(PrecisionOverflowError),
    NullOperation(NullOperationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Domain(e) => write!(f, "{e}"),
            Error::Format(e) => write!(f, "{e}"),
            Error::Overflow(e) => write!(f, "{e}"),
            Error::PrecisionOverflow(e) => write!(f, "{e}"),
            Error::NullOperation(e) => write!(f, "{e}"),
        }
    }
}

impl From<CrError> for Error {
    fn from(e: CrError) -> Self {
        match e {
            CrError::Domain(d) => Error::Domain(d),
            CrError::PrecisionOverflow(p) => Error::PrecisionOverflow(p),
        }
    }
}

impl std::error::Error for Error {}

impl From<DomainError> for Error {
    fn from(e: DomainError) -> Self {
        Error::Domain(e)
    }
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Error::Format(e)
    }
}

impl From<OverflowError> for Error {
    fn from(e: OverflowError) -> Self {
        Error::Overflow(e)
    }
}

impl From<PrecisionOverflowError> for Error {
    fn from(e: PrecisionOverflowError) -> Self {
        Error::PrecisionOverflow(e)
    }
}

impl From<NullOperationError> for Error {
    fn from(e: NullOperationError) -> Self {
        Error::NullOperation(e)
    }
}
