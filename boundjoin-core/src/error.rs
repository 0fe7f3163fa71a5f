//! Error types for the boundjoin core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::{fmt, sync::Arc};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::DistanceSource`] operations.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SourceError {
    /// Requested index was outside the source's bounds.
    #[error("index {index} is out of bounds")]
    OutOfBounds {
        /// The requested taxon that exceeded the source bounds.
        index: usize,
    },
    /// The source could not represent a distance as a finite number.
    #[error("distance between taxa {row} and {column} is not finite")]
    NonFinite {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        column: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`SourceError`] variants.
    enum SourceErrorCode for SourceError {
        /// Requested index was outside the source's bounds.
        OutOfBounds => OutOfBounds { .. } => "SOURCE_OUT_OF_BOUNDS",
        /// The source produced a non-finite distance.
        NonFinite => NonFinite { .. } => "SOURCE_NON_FINITE",
    }
}

/// Precondition violations detected while validating a distance matrix.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MatrixError {
    /// The matrix has no taxa.
    #[error("distance matrix contains no taxa")]
    Empty,
    /// The number of labels differs from the number of rows.
    #[error("matrix has {rows} rows but {labels} labels")]
    LabelCountMismatch {
        /// Number of rows supplied.
        rows: usize,
        /// Number of labels supplied.
        labels: usize,
    },
    /// A row's length differs from the number of rows.
    #[error("row {row} has {actual} entries but the matrix has {expected} rows")]
    NotSquare {
        /// Offending row.
        row: usize,
        /// Required row length.
        expected: usize,
        /// Observed row length.
        actual: usize,
    },
    /// An entry was NaN or infinite.
    #[error("entry ({row}, {column}) is not finite")]
    NonFinite {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        column: usize,
    },
    /// A diagonal entry was not zero.
    #[error("diagonal entry {index} must be zero (got {value})")]
    NonZeroDiagonal {
        /// Taxon whose self-distance is non-zero.
        index: usize,
        /// The offending value, widened to double precision.
        value: f64,
    },
    /// The variance matrix does not match the distance matrix's shape.
    #[error("variance matrix has {actual} rows but the distance matrix has {expected}")]
    VarianceShapeMismatch {
        /// Number of taxa in the distance matrix.
        expected: usize,
        /// Number of rows in the variance matrix.
        actual: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`MatrixError`] variants.
    enum MatrixErrorCode for MatrixError {
        /// The matrix has no taxa.
        Empty => Empty => "MATRIX_EMPTY",
        /// The number of labels differs from the number of rows.
        LabelCountMismatch => LabelCountMismatch { .. } => "MATRIX_LABEL_COUNT_MISMATCH",
        /// A row's length differs from the number of rows.
        NotSquare => NotSquare { .. } => "MATRIX_NOT_SQUARE",
        /// An entry was NaN or infinite.
        NonFinite => NonFinite { .. } => "MATRIX_NON_FINITE",
        /// A diagonal entry was not zero.
        NonZeroDiagonal => NonZeroDiagonal { .. } => "MATRIX_NON_ZERO_DIAGONAL",
        /// The variance matrix does not match the distance matrix's shape.
        VarianceShapeMismatch => VarianceShapeMismatch { .. } => "MATRIX_VARIANCE_SHAPE_MISMATCH",
    }
}

/// Error type produced when configuring or running a [`crate::Joiner`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum JoinError {
    /// The worker pool must have at least one thread.
    #[error("thread count must be at least 1 (got {got})")]
    InvalidThreadCount {
        /// The invalid thread count supplied by the caller.
        got: usize,
    },
    /// The purge fraction must lie strictly between zero and one.
    #[error("purge fraction must satisfy 0 < {numerator}/{denominator} < 1")]
    InvalidPurgeFraction {
        /// Supplied numerator.
        numerator: usize,
        /// Supplied denominator.
        denominator: usize,
    },
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {message}")]
    ThreadPool {
        /// Message reported by the pool builder.
        message: Arc<str>,
    },
    /// The input matrix failed validation.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    /// A [`crate::DistanceSource`] failed while loading the matrix.
    #[error("distance source `{data_source}` failed: {error}")]
    Source {
        /// Identifier for the source that produced the error.
        data_source: Arc<str>,
        #[source]
        /// Underlying source error.
        error: SourceError,
    },
    /// An internal invariant was violated; the run was aborted.
    #[error("clustering invariant violated: {invariant} ({detail})")]
    InvariantViolation {
        /// Name of the violated invariant.
        invariant: &'static str,
        /// Values observed when the violation was detected.
        detail: Arc<str>,
    },
}

define_error_codes! {
    /// Stable codes describing [`JoinError`] variants.
    enum JoinErrorCode for JoinError {
        /// The worker pool must have at least one thread.
        InvalidThreadCount => InvalidThreadCount { .. } => "JOIN_INVALID_THREAD_COUNT",
        /// The purge fraction must lie strictly between zero and one.
        InvalidPurgeFraction => InvalidPurgeFraction { .. } => "JOIN_INVALID_PURGE_FRACTION",
        /// The worker pool could not be created.
        ThreadPool => ThreadPool { .. } => "JOIN_THREAD_POOL",
        /// The input matrix failed validation.
        Matrix => Matrix(..) => "JOIN_INVALID_MATRIX",
        /// A distance source failed while loading the matrix.
        SourceFailure => Source { .. } => "JOIN_SOURCE_FAILURE",
        /// An internal invariant was violated.
        InvariantViolation => InvariantViolation { .. } => "JOIN_INVARIANT_VIOLATION",
    }
}

impl JoinError {
    /// Retrieve the inner [`MatrixErrorCode`] when the input failed validation.
    pub const fn matrix_code(&self) -> Option<MatrixErrorCode> {
        match self {
            Self::Matrix(error) => Some(error.code()),
            _ => None,
        }
    }

    /// Retrieve the inner [`SourceErrorCode`] when a [`crate::DistanceSource`] failed.
    pub const fn source_code(&self) -> Option<SourceErrorCode> {
        match self {
            Self::Source { error, .. } => Some(error.code()),
            _ => None,
        }
    }

    pub(crate) fn invariant(invariant: &'static str, detail: impl fmt::Display) -> Self {
        Self::InvariantViolation {
            invariant,
            detail: Arc::from(detail.to_string()),
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, JoinError>;
