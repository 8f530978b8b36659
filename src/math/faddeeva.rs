//! Real part of the Faddeeva function `w(z) = exp(-z²) erfc(-iz)`.
//!
//! The Voigt profile is `Re(w(z))` at `z = ((x - μ) + iγ) / (σ√2)`, so we only
//! need the upper half-plane (`Im(z) >= 0`). We use Humlíček's four-region
//! rational approximation (the classic `w4` routine), which is accurate to
//! roughly 1e-4 relative error — more than enough for fitting noisy data.
//!
//! Numerical notes:
//! - Region selection follows `s = |x| + y`; far from the real axis a low-order
//!   rational in `t = y - ix` suffices, near the axis the full region-IV form
//!   with the `exp(t²)` term is required.
//! - On the real axis (`y = 0`) this reduces to `Re(w(x)) = exp(-x²)`.

use nalgebra::Complex;

/// Compute `Re(w(x + iy))` for `y >= 0`.
///
/// Callers must pass a non-negative imaginary part; the approximation is not
/// valid in the lower half-plane.
pub fn faddeeva_re(x: f64, y: f64) -> f64 {
    faddeeva_w(x, y).re
}

/// Humlíček w4: `w(z)` for `z = x + iy`, `y >= 0`.
fn faddeeva_w(x: f64, y: f64) -> Complex<f64> {
    let t = Complex::new(y, -x);
    let s = x.abs() + y;

    if s >= 15.0 {
        // Region I: single-pole approximation.
        t * 0.5641896 / (t * t + 0.5)
    } else if s >= 5.5 {
        // Region II.
        let u = t * t;
        t * (u * 0.5641896 + 1.410474) / (u * (u + 3.0) + 0.75)
    } else if y >= 0.195 * x.abs() - 0.176 {
        // Region III.
        let num = t * (t * (t * (t * 0.5642236 + 3.778987) + 11.96482) + 20.20933) + 16.4955;
        let den = t
            * (t * (t * (t * (t + 6.699398) + 21.69274) + 39.27121) + 38.82363)
            + 16.4955;
        num / den
    } else {
        // Region IV: close to the real axis.
        let u = t * t;
        let num = t
            * (36183.31
                - u * (3321.9905
                    - u * (1540.787
                        - u * (219.0313 - u * (35.76683 - u * (1.320522 - u * 0.56419))))));
        let den = 32066.6
            - u * (24322.84
                - u * (9022.228
                    - u * (2186.181 - u * (364.2191 - u * (61.57037 - u * (1.841439 - u))))));
        u.exp() - num / den
    }
}
