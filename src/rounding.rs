//! Rounding and fixed-decimal rendering shared by every statistic.
//!
//! Averages render with two decimals and percentages with one. Both round
//! half away from zero, so `2.345` becomes `2.35` and `-2.345` becomes
//! `-2.35`. Any undefined quotient (zero denominator, non-finite input)
//! renders as zero.

pub const AVERAGE_PLACES: usize = 2;
pub const PERCENT_PLACES: usize = 1;

/// Scaled values this close to a half are treated as exact halves, so binary
/// representation error (`1.005 * 100 == 100.49999999999999`) does not flip
/// the rounding direction.
const HALF_TOLERANCE: f64 = 1e-9;

pub fn round_half_away(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    let rounded = if (scaled.fract().abs() - 0.5).abs() < HALF_TOLERANCE {
        scaled.trunc() + scaled.signum()
    } else {
        scaled.round()
    };
    let result = rounded / factor;
    // avoid rendering "-0.00"
    if result == 0.0 {
        0.0
    } else {
        result
    }
}

pub fn fixed(value: f64, places: usize) -> String {
    format!("{:.*}", places, round_half_away(value, places))
}

/// `part / whole`, or zero when `whole` is zero.
pub fn ratio(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole
    }
}

pub fn average_text(sum: f64, count: usize) -> String {
    fixed(ratio(sum, count as f64), AVERAGE_PLACES)
}

pub fn percentage_text(part: usize, total: usize) -> String {
    fixed(ratio(part as f64, total as f64) * 100.0, PERCENT_PLACES)
}

pub fn ratio_text(part: f64, whole: f64) -> String {
    fixed(ratio(part, whole), PERCENT_PLACES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(fixed(70.5, 0), "71");
        assert_eq!(fixed(2.345, 2), "2.35");
        assert_eq!(fixed(-2.345, 2), "-2.35");
        assert_eq!(fixed(1.005, 2), "1.01");
        assert_eq!(fixed(0.25, 1), "0.3");
    }

    #[test]
    fn truncates_repeating_decimals() {
        assert_eq!(average_text(7.0, 3), "2.33");
        assert_eq!(average_text(141.0, 2), "70.50");
        assert_eq!(percentage_text(2, 3), "66.7");
        assert_eq!(percentage_text(1, 3), "33.3");
    }

    #[test]
    fn zero_denominators_render_as_zero() {
        assert_eq!(average_text(0.0, 0), "0.00");
        assert_eq!(percentage_text(0, 0), "0.0");
        assert_eq!(ratio_text(12.0, 0.0), "0.0");
        assert_eq!(fixed(f64::NAN, 2), "0.00");
        assert_eq!(fixed(-0.0001, 2), "0.00");
    }
}
