//! Fit result formatting.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)
//!
//! Parameter values are printed with 6 significant digits (printf `%g`
//! style), R² with 5 decimal places.

use crate::domain::FitResult;

/// Format the result block printed after a successful fit.
pub fn format_fit_result(result: &FitResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("Model: {}\n", result.model));
    for (name, value) in &result.params {
        out.push_str(&format!("{name} = {}\n", format_sig(*value, 6)));
    }
    match result.r_squared {
        Some(r2) => out.push_str(&format!("R²: {r2:.5}\n")),
        None => out.push_str("R²: undefined\n"),
    }
    if let Some(band) = result.confidence_band {
        out.push_str(&format!("95% band: ±{}\n", format_sig(band, 6)));
    }

    out
}

/// One-line sample summary printed before fitting.
pub fn format_sample_header(n: usize, xs: &[f64]) -> String {
    let (lo, hi) = xs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    if lo.is_finite() && hi.is_finite() {
        format!("Sample: n={n} | x=[{lo:.3}, {hi:.3}]")
    } else {
        format!("Sample: n={n}")
    }
}

/// Render `v` with `digits` significant digits, `%g` style: plain decimal in
/// the middle of the scale, scientific at the extremes, no trailing zeros.
pub fn format_sig(v: f64, digits: usize) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return format!("{v}");
    }

    let digits = digits.max(1);
    let exp = v.abs().log10().floor() as i32;
    if exp < -4 || exp >= digits as i32 {
        trim_mantissa(format!("{:.*e}", digits - 1, v))
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_decimal(format!("{v:.decimals$}"))
    }
}

fn trim_decimal(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn trim_mantissa(s: String) -> String {
    match s.split_once('e') {
        Some((mantissa, exponent)) => {
            format!("{}e{exponent}", trim_decimal(mantissa.to_string()))
        }
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn significant_digit_rendering() {
        assert_eq!(format_sig(2.0, 6), "2");
        assert_eq!(format_sig(-1.5, 6), "-1.5");
        assert_eq!(format_sig(0.123456789, 6), "0.123457");
        assert_eq!(format_sig(123456.789, 6), "123457");
        assert_eq!(format_sig(0.00015, 6), "0.00015");
        assert_eq!(format_sig(1.5e-7, 6), "1.5e-7");
        assert_eq!(format_sig(2_500_000.0, 6), "2.5e6");
        assert_eq!(format_sig(0.0, 6), "0");
    }

    #[test]
    fn result_block_shape() {
        let result = FitResult {
            model: "Linear".to_string(),
            params: vec![
                ("slope".to_string(), 2.0),
                ("intercept".to_string(), 1.0),
            ],
            curve_x: vec![0.0, 1.0],
            curve_y: vec![1.0, 3.0],
            covariance: None,
            r_squared: Some(1.0),
            confidence_band: None,
        };
        let text = format_fit_result(&result);
        assert_eq!(text, "Model: Linear\nslope = 2\nintercept = 1\nR²: 1.00000\n");
    }

    #[test]
    fn undefined_r_squared_and_band_lines() {
        let result = FitResult {
            model: "Gaussian".to_string(),
            params: vec![("a".to_string(), 3.0)],
            curve_x: vec![],
            curve_y: vec![],
            covariance: None,
            r_squared: None,
            confidence_band: Some(0.25),
        };
        let text = format_fit_result(&result);
        assert!(text.contains("R²: undefined\n"));
        assert!(text.contains("95% band: ±0.25\n"));
    }

    #[test]
    fn sample_header_reports_range() {
        let s = format_sample_header(3, &[2.0, 0.0, 1.0]);
        assert_eq!(s, "Sample: n=3 | x=[0.000, 2.000]");
    }
}
