//! Floating-point element types accepted by the distance matrices.
//!
//! Matrices are generic over [`Real`] so the bounding logic is written once
//! and instantiated for single or double precision.

use core::{
    cmp::Ordering,
    fmt,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
};

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Floating-point scalar used for distances, variances and criteria.
///
/// Implemented for [`f32`] and [`f64`] only.
///
/// # Examples
/// ```
/// use boundjoin_core::Real;
///
/// fn half<T: Real>(value: T) -> T { value * T::HALF }
/// assert_eq!(half(3.0_f64), 1.5);
/// assert_eq!(half(3.0_f32), 1.5);
/// ```
pub trait Real:
    sealed::Sealed
    + Copy
    + Send
    + Sync
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + 'static
{
    /// Additive identity.
    const ZERO: Self;
    /// Multiplicative identity.
    const ONE: Self;
    /// One half.
    const HALF: Self;
    /// Positive infinity; also the row sentinel in sorted matrices.
    const INFINITY: Self;
    /// Negative infinity; the total carried by clusters that are no longer live.
    const NEG_INFINITY: Self;
    /// Machine epsilon.
    const EPSILON: Self;

    /// Converts a count to the element type.
    fn from_usize(value: usize) -> Self;

    /// Converts a double-precision value, rounding when narrowing.
    fn from_f64(value: f64) -> Self;

    /// Widens the value to double precision.
    fn to_f64(self) -> f64;

    /// Absolute value.
    #[must_use]
    fn abs(self) -> Self;

    /// Returns `true` when the value is neither infinite nor NaN.
    fn is_finite(self) -> bool;

    /// IEEE 754 total ordering.
    fn total_cmp(&self, other: &Self) -> Ordering;

    /// Bit pattern widened to 64 bits, used to hash rows exactly.
    fn to_bits_u64(self) -> u64;
}

macro_rules! impl_real {
    ($ty:ty) => {
        impl Real for $ty {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const HALF: Self = 0.5;
            const INFINITY: Self = <$ty>::INFINITY;
            const NEG_INFINITY: Self = <$ty>::NEG_INFINITY;
            const EPSILON: Self = <$ty>::EPSILON;

            #[inline]
            fn from_usize(value: usize) -> Self {
                value as $ty
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            #[inline]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            #[inline]
            fn abs(self) -> Self {
                <$ty>::abs(self)
            }

            #[inline]
            fn is_finite(self) -> bool {
                <$ty>::is_finite(self)
            }

            #[inline]
            fn total_cmp(&self, other: &Self) -> Ordering {
                <$ty>::total_cmp(self, other)
            }

            #[inline]
            fn to_bits_u64(self) -> u64 {
                u64::from(self.to_bits())
            }
        }
    };
}

impl_real!(f32);
impl_real!(f64);
