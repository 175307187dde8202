/// Round to the nearest integer, ties to even.
///
/// Every date-to-frame conversion goes through this so identical inputs land on identical frames.
pub(crate) fn round_half_even(v: f64) -> i64 {
    v.round_ties_even() as i64
}

pub(crate) fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Position of `v` inside `[start, end]` as a fraction, clamped to `[0, 1]`.
///
/// A zero-length span yields `1.0` once `v` reaches it and `0.0` before.
pub(crate) fn progress_between(start: i64, end: i64, v: i64) -> f32 {
    if end <= start {
        return if v >= start { 1.0 } else { 0.0 };
    }
    let t = (v - start) as f64 / (end - start) as f64;
    t.clamp(0.0, 1.0) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
