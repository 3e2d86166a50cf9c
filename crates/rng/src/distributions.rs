//! Pure transforms from uniform `[0, 1)` draws to the distributions the
//! mutation kernels and clone reproduction policies need.
//!
//! Every function here is a deterministic function of its uniform
//! input(s) — no state, no side effects — so callers can audit-log the
//! raw draws and still reconstruct exactly what was derived from them.

use std::f64::consts::PI;

/// Uniform draw rescaled to `[low, high)`.
pub fn uniform_range(u: f64, low: f64, high: f64) -> f64 {
    low + u * (high - low)
}

/// Inverse-CDF sample from `Exponential(rate)`.
///
/// `rate` must be strictly positive; `u` must lie in `(0, 1]` (the caller
/// should retry a draw of exactly `0.0`, which has probability zero under
/// a real uniform source but is excluded here defensively).
pub fn exponential(u: f64, rate: f64) -> f64 {
    -u.max(f64::MIN_POSITIVE).ln() / rate
}

/// One standard normal sample via the Box-Muller transform.
///
/// Consumes two independent uniforms and returns one of the two values
/// the transform produces; the sibling value is discarded rather than
/// cached, so each call advances the stream by exactly two draws and the
/// sequence stays reproducible regardless of call pattern.
pub fn standard_normal(u1: f64, u2: f64) -> f64 {
    let r = (-2.0 * u1.max(f64::MIN_POSITIVE).ln()).sqrt();
    r * (2.0 * PI * u2).cos()
}

/// Sample from `Normal(mean, std_dev)`.
pub fn normal(u1: f64, u2: f64, mean: f64, std_dev: f64) -> f64 {
    mean + std_dev * standard_normal(u1, u2)
}

/// Sample from `LogNormal` parameterized by its linear-space mean and
/// variance (not the underlying normal's location/scale), matching how
/// fitness-distribution parameters are specified in configuration.
pub fn log_normal_from_moments(u1: f64, u2: f64, mean: f64, variance: f64) -> f64 {
    let loc = (mean * mean / (variance + mean * mean).sqrt()).ln();
    let scale = (1.0 + variance / (mean * mean)).ln().sqrt();
    (loc + scale * standard_normal(u1, u2)).exp()
}

/// Gamma sample via the mean/variance parameterization (`beta = var /
/// mean`, `alpha = mean / beta`), using Marsaglia-Tsang squeeze for
/// `alpha >= 1` and the Ahrens-Dieter boost for `alpha < 1`.
///
/// `draws` supplies uniform and (via [`standard_normal`]) pairs of
/// uniforms on demand; callers thread a stream closure through so the
/// rejection loop can consume as many draws as it needs.
pub fn gamma_from_moments<F: FnMut() -> f64>(mut draws: F, mean: f64, variance: f64) -> f64 {
    let beta = variance / mean;
    let alpha = mean / beta;
    gamma(&mut draws, alpha, beta)
}

fn gamma<F: FnMut() -> f64>(draws: &mut F, alpha: f64, beta: f64) -> f64 {
    if alpha < 1.0 {
        let u = draws();
        let boost = u.max(f64::MIN_POSITIVE).powf(1.0 / alpha);
        return gamma(draws, alpha + 1.0, beta) * boost;
    }

    let d = alpha - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    loop {
        let (u1, u2) = (draws(), draws());
        let x = standard_normal(u1, u2);
        let v = (1.0 + c * x).powi(3);
        if v <= 0.0 {
            continue;
        }

        let u3 = draws();
        let d_v = d * v;
        if u3.ln() < 0.5 * x * x + d - d_v + d_v.ln() {
            return d_v * beta;
        }
    }
}

/// Truncated double-exponential (Laplace, restricted to same-sign draws
/// around zero) used by fitness-offset kernels that allow symmetric
/// gain/loss around a baseline. `scale = 1 / lambda`. The sign is chosen
/// by a third uniform draw so each call consumes exactly two uniforms
/// via `draws` plus the caller-supplied sign draw.
pub fn truncated_double_exponential(magnitude_u: f64, sign_u: f64, scale: f64) -> f64 {
    let magnitude = -scale * magnitude_u.max(f64::MIN_POSITIVE).ln();
    if sign_u < 0.5 {
        magnitude
    } else {
        -magnitude
    }
}

/// Select an index from a cumulative weight array via inverse-CDF
/// search. `cumulative` must be non-decreasing and its last entry is
/// treated as the normalizing total. Returns the last index if floating
/// point error pushes `u * total` past the final cumulative entry.
pub fn categorical(u: f64, cumulative: &[f64]) -> usize {
    if cumulative.is_empty() {
        return 0;
    }
    let total = cumulative[cumulative.len() - 1];
    let target = u * total;
    match cumulative
        .iter()
        .position(|&cum| cum > target)
    {
        Some(idx) => idx,
        None => cumulative.len() - 1,
    }
}

/// Sample from an empirical CDF given as sorted `(value, cumulative_probability)`
/// pairs, linearly interpolating between bracketing points.
pub fn empirical(u: f64, table: &[(f64, f64)]) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    if u <= table[0].1 {
        return table[0].0;
    }
    for window in table.windows(2) {
        let (v0, p0) = window[0];
        let (v1, p1) = window[1];
        if u <= p1 {
            if (p1 - p0).abs() < f64::EPSILON {
                return v1;
            }
            let frac = (u - p0) / (p1 - p0);
            return v0 + frac * (v1 - v0);
        }
    }
    table[table.len() - 1].0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_range_respects_bounds() {
        assert_eq!(uniform_range(0.0, 2.0, 5.0), 2.0);
        assert!((uniform_range(0.5, 2.0, 5.0) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn exponential_is_nonnegative_and_monotone_in_u() {
        let small = exponential(0.1, 1.0);
        let large = exponential(0.9, 1.0);
        assert!(small > 0.0 && large > 0.0);
        assert!(small > large, "smaller u maps to a larger draw");
    }

    #[test]
    fn categorical_picks_bracketing_index() {
        let cumulative = [1.0, 3.0, 6.0];
        assert_eq!(categorical(0.0, &cumulative), 0);
        assert_eq!(categorical(0.2, &cumulative), 0);
        assert_eq!(categorical(0.5, &cumulative), 1);
        assert_eq!(categorical(0.99, &cumulative), 2);
    }

    #[test]
    fn empirical_interpolates_between_table_rows() {
        let table = [(0.0, 0.0), (10.0, 0.5), (20.0, 1.0)];
        assert_eq!(empirical(0.0, &table), 0.0);
        assert!((empirical(0.25, &table) - 5.0).abs() < 1e-9);
        assert_eq!(empirical(1.0, &table), 20.0);
    }

    #[test]
    fn gamma_from_moments_stays_positive() {
        let mut counter = 0u64;
        let mut stream = || {
            counter = counter.wrapping_add(1);
            ((counter * 2654435761) % 1_000_000) as f64 / 1_000_000.0
        };
        for _ in 0..50 {
            let sample = gamma_from_moments(&mut stream, 4.0, 2.0);
            assert!(sample > 0.0);
        }
    }
}
