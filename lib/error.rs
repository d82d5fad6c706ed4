//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow].
//!
//! Errors fall into three families, which the [API layer][crate::api] maps to
//! distinct HTTP statuses:
//! - [`ValidationError`]: the request itself is bad; no computation was
//!   attempted.
//! - [`NumericalError`]: the computation was attempted but produced an
//!   unusable result.
//! - [`Error::Internal`]: anything else.
//!
//! [anyhow]: https://crates.io/crates/anyhow

use ndarray as nd;
use ndarray_linalg::error::LinalgError;
use thiserror::Error;

/// Returned when an operation requiring equal-length arrays encounters arrays
/// with unequal length.
#[derive(Debug, Error)]
#[error("encountered arrays with incompatible lengths; got {0} and {1}")]
pub struct LengthError(pub usize, pub usize);

impl LengthError {
    pub(crate) fn check<S, A, T, B>(
        a: &nd::ArrayBase<S, nd::Ix1>,
        b: &nd::ArrayBase<T, nd::Ix1>,
    ) -> Result<(), Self>
    where
        S: nd::Data<Elem = A>,
        T: nd::Data<Elem = B>,
    {
        let na = a.len();
        let nb = b.len();
        (na == nb).then_some(()).ok_or(Self(na, nb))
    }
}

/// Returned when a request is rejected before any computation is performed.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A dimension or point count below the allowed minimum.
    #[error("{what} must be at least {min}; got {got}")]
    TooSmall { what: &'static str, min: usize, got: usize },

    /// A dimension, point count, or step count above the configured limit.
    #[error("{what} exceeds the configured limit of {limit}; got {got}")]
    LimitExceeded { what: &'static str, limit: usize, got: usize },

    /// A NaN or infinite input parameter.
    #[error("{what} must be finite; got {value}")]
    NonFinite { what: &'static str, value: f64 },

    /// A parameter that must be strictly positive.
    #[error("{what} must be greater than 0; got {value}")]
    NonPositive { what: &'static str, value: f64 },

    /// An interval whose lower bound is not below its upper bound.
    #[error("{what} requires min < max; got [{min}, {max}]")]
    BadRange { what: &'static str, min: f64, max: f64 },

    /// A matrix with unequal row and column counts, or ragged rows.
    #[error("{what} must be a square matrix; got {rows} rows with row length {cols}")]
    NotSquare { what: &'static str, rows: usize, cols: usize },

    /// A matrix required to be Hermitian that is not, to tolerance.
    #[error("{what} is not Hermitian; max |A - A†| = {deviation:.3e}")]
    NotHermitian { what: &'static str, deviation: f64 },

    /// A state vector that cannot be normalized.
    #[error("{0} has zero norm")]
    ZeroNorm(&'static str),

    /// An index outside of `0..dim`.
    #[error("{what} index {index} out of range for dimension {dim}")]
    IndexOutOfRange { what: &'static str, index: usize, dim: usize },

    /// An empty list where at least one element is needed.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// An angular momentum quantum number that is not a non-negative
    /// half-integer.
    #[error("{what} must be a non-negative multiple of 1/2; got {value}")]
    NotHalfInteger { what: &'static str, value: f64 },

    /// [`LengthError`]
    #[error("array length error: {0}")]
    Length(#[from] LengthError),
}

impl ValidationError {
    pub(crate) fn check_finite(what: &'static str, value: f64)
        -> Result<(), Self>
    {
        value.is_finite().then_some(()).ok_or(Self::NonFinite { what, value })
    }

    pub(crate) fn check_positive(what: &'static str, value: f64)
        -> Result<(), Self>
    {
        Self::check_finite(what, value)?;
        (value > 0.0).then_some(()).ok_or(Self::NonPositive { what, value })
    }

    pub(crate) fn check_min(what: &'static str, min: usize, got: usize)
        -> Result<(), Self>
    {
        (got >= min).then_some(()).ok_or(Self::TooSmall { what, min, got })
    }

    pub(crate) fn check_range(what: &'static str, min: f64, max: f64)
        -> Result<(), Self>
    {
        Self::check_finite(what, min)?;
        Self::check_finite(what, max)?;
        (min < max).then_some(()).ok_or(Self::BadRange { what, min, max })
    }

    pub(crate) fn check_index(what: &'static str, index: usize, dim: usize)
        -> Result<(), Self>
    {
        (index < dim).then_some(())
            .ok_or(Self::IndexOutOfRange { what, index, dim })
    }

    pub(crate) fn check_all_finite<'a, I>(what: &'static str, values: I)
        -> Result<(), Self>
    where I: IntoIterator<Item = &'a f64>
    {
        values.into_iter()
            .try_for_each(|&value| Self::check_finite(what, value))
    }
}

/// Returned when a computation is attempted but fails to produce a usable
/// result.
#[derive(Debug, Error)]
pub enum NumericalError {
    /// [`LinalgError`], e.g. a non-convergent eigensolver.
    #[error("linalg error: {0}")]
    Linalg(#[from] LinalgError),

    /// A NaN or infinity appeared in an intermediate or final result.
    #[error("non-finite value produced during {0}")]
    NonFinite(&'static str),

    /// A state's norm drifted beyond tolerance under unitary evolution.
    #[error("state norm drifted to {norm} at t = {t}")]
    NormDrift { t: f64, norm: f64 },

    /// Schrödinger- and Heisenberg-picture expectation values disagree.
    #[error("Schrödinger and Heisenberg expectation values disagree by {deviation:.3e} at t = {t}")]
    PictureMismatch { t: f64, deviation: f64 },
}

impl NumericalError {
    pub(crate) fn check_finite<'a, I>(stage: &'static str, values: I)
        -> Result<(), Self>
    where I: IntoIterator<Item = &'a f64>
    {
        values.into_iter().all(|v| v.is_finite())
            .then_some(())
            .ok_or(Self::NonFinite(stage))
    }
}

/// Top-level error returned from every engine operation.
#[derive(Debug, Error)]
pub enum Error {
    /// [`ValidationError`]
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// [`NumericalError`]
    #[error("{0}")]
    Numerical(#[from] NumericalError),

    /// An invariant of the engine itself was broken.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<LinalgError> for Error {
    fn from(err: LinalgError) -> Self { Self::Numerical(err.into()) }
}

impl From<LengthError> for Error {
    fn from(err: LengthError) -> Self { Self::Validation(err.into()) }
}

pub type QResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checks_reject_bad_values() {
        assert!(ValidationError::check_positive("omega", 0.0).is_err());
        assert!(ValidationError::check_positive("omega", f64::NAN).is_err());
        assert!(ValidationError::check_positive("omega", 1.0).is_ok());
        assert!(ValidationError::check_range("x", 1.0, 1.0).is_err());
        assert!(ValidationError::check_min("N", 2, 1).is_err());
        assert!(ValidationError::check_index("n", 3, 3).is_err());
    }

    #[test]
    fn length_error_reports_both_lengths() {
        let a: nd::Array1<f64> = nd::Array1::zeros(3);
        let b: nd::Array1<f64> = nd::Array1::zeros(4);
        let err = LengthError::check(&a, &b).unwrap_err();
        assert_eq!(err.to_string(), "encountered arrays with incompatible lengths; got 3 and 4");
    }

    #[test]
    fn errors_convert_upward() {
        let err: Error = ValidationError::ZeroNorm("psi0").into();
        assert!(matches!(err, Error::Validation(_)));
        let err: Error = NumericalError::NonFinite("propagation").into();
        assert_eq!(err.to_string(), "non-finite value produced during propagation");
    }
}
