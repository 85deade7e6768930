//! Small numeric helpers over latency/uptime samples.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// `p`-th percentile (`p` in `[0, 100]`) with linear interpolation between
/// the closest ranks of the ascending-sorted samples.
///
/// The virtual rank is `p / 100 * (n - 1)`. `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(lerp(sorted[lo], sorted[hi], rank - lo as f64))
}

// Interpolate from the nearer end so t == 1 lands exactly on `b`.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}

/// Round to `places` decimals.
///
/// Goes through the correctly rounded decimal formatter instead of scaling by
/// a power of ten, so e.g. `1.005` is decided on its exact binary value and the
/// result never carries more than `places` decimals when printed.
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", places, value).parse().unwrap_or(value)
}
