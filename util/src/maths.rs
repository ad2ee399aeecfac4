//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap a value into the half-open range `[min, max)`.
///
/// The result differs from `value` by a whole number of range widths.
pub fn wrap<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    let width = max - min;
    let wrapped = min + rem_euclid(value - min, width);

    // Round-off in rem_euclid can land exactly on the open end
    if wrapped >= max {
        min
    }
    else {
        wrapped
    }
}

/// Signed shortest distance from `from` to `to` on a circle of circumference `width`.
///
/// The result lies in `[-width/2, width/2)`.
pub fn wrapped_diff<T>(to: T, from: T, width: T) -> T
where
    T: Float
{
    let half = width / (T::one() + T::one());
    wrap(to - from, -half, half)
}
