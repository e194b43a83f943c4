//! Golden-section line search over a closed interval.
//!
//! Both searches assume `f` is unimodal on `[lo, hi]`; on other functions they
//! still terminate and return a point inside the interval, just not
//! necessarily the global extremum. The bracket shrinks until it is narrower
//! than [`GOLDEN_TOLERANCE`] or [`GOLDEN_MAX_ITERATIONS`] steps were taken,
//! and the midpoint of the final bracket is returned.

/// Bracket width at which the search stops.
pub const GOLDEN_TOLERANCE: f64 = 1e-6;

/// Upper bound on the number of bracket reductions.
pub const GOLDEN_MAX_ITERATIONS: usize = 100;

const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Returns the argument in `[lo, hi]` that minimizes `f`.
///
/// # Examples
///
/// ```rust
/// use camcalib::math::line_search_min_golden;
///
/// let x = line_search_min_golden(0.0, 4.0, |x| (x - 1.5) * (x - 1.5));
/// assert!((x - 1.5).abs() < 1e-5);
/// ```
pub fn line_search_min_golden<F>(lo: f64, hi: f64, mut f: F) -> f64
where
    F: FnMut(f64) -> f64,
{
    let mut a = lo;
    let mut b = hi;
    let mut x1 = b - INV_PHI * (b - a);
    let mut x2 = a + INV_PHI * (b - a);
    let mut f1 = f(x1);
    let mut f2 = f(x2);

    for _ in 0..GOLDEN_MAX_ITERATIONS {
        if (b - a).abs() < GOLDEN_TOLERANCE {
            break;
        }
        if f1 < f2 {
            b = x2;
            x2 = x1;
            f2 = f1;
            x1 = b - INV_PHI * (b - a);
            f1 = f(x1);
        } else {
            a = x1;
            x1 = x2;
            f1 = f2;
            x2 = a + INV_PHI * (b - a);
            f2 = f(x2);
        }
    }

    0.5 * (a + b)
}

/// Returns the argument in `[lo, hi]` that maximizes `f`.
pub fn line_search_max_golden<F>(lo: f64, hi: f64, mut f: F) -> f64
where
    F: FnMut(f64) -> f64,
{
    line_search_min_golden(lo, hi, |x| -f(x))
}
