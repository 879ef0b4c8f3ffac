//! Special functions backing p-value computation
//!
//! Self-contained f64 implementations of the error function, log-gamma,
//! and the regularized incomplete gamma/beta functions, sufficient for the
//! chi-squared and Student-t tail probabilities the rank tests need.
//! Numerical Recipes-style series/continued-fraction evaluations.

/// Error function (Abramowitz & Stegun 7.1.26, max error 1.5e-7)
pub(crate) fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

/// Standard normal CDF
pub(crate) fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Natural log of the gamma function (Lanczos approximation)
pub(crate) fn ln_gamma(x: f64) -> f64 {
    let coeffs = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    let y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();

    let mut ser = 1.000000000190015;
    for (i, &coeff) in coeffs.iter().enumerate() {
        ser += coeff / (y + 1.0 + i as f64);
    }

    -tmp + (2.5066282746310005 * ser / x).ln()
}

const MAX_ITER: usize = 200;
const EPS: f64 = 3.0e-12;

// Series representation of the regularized lower incomplete gamma P(a, x),
// convergent for x < a + 1.
fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut sum = 1.0 / a;
    let mut del = sum;
    for _ in 0..MAX_ITER {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

// Continued fraction for the regularized upper incomplete gamma Q(a, x),
// convergent for x >= a + 1 (Lentz's method).
fn gamma_q_cf(a: f64, x: f64) -> f64 {
    let tiny = 1.0e-30;
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / tiny;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < tiny {
            d = tiny;
        }
        c = b + an / c;
        if c.abs() < tiny {
            c = tiny;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Regularized lower incomplete gamma P(a, x)
pub(crate) fn gamma_p(a: f64, x: f64) -> f64 {
    if x <= 0.0 || a <= 0.0 {
        return 0.0;
    }
    if x < a + 1.0 {
        gamma_p_series(a, x)
    } else {
        1.0 - gamma_q_cf(a, x)
    }
}

/// Upper tail of the chi-squared distribution with `df` degrees of freedom
pub(crate) fn chi_squared_sf(x: f64, df: f64) -> f64 {
    if x <= 0.0 || df <= 0.0 {
        return 1.0;
    }
    (1.0 - gamma_p(df / 2.0, x / 2.0)).clamp(0.0, 1.0)
}

// Continued fraction for the incomplete beta function (Lentz's method)
fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    let tiny = 1.0e-30;
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < tiny {
        d = tiny;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < tiny {
            d = tiny;
        }
        c = 1.0 + aa / c;
        if c.abs() < tiny {
            c = tiny;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < tiny {
            d = tiny;
        }
        c = 1.0 + aa / c;
        if c.abs() < tiny {
            c = tiny;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

/// Regularized incomplete beta function I_x(a, b)
pub(crate) fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let bt = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        bt * beta_cf(a, b, x) / a
    } else {
        1.0 - bt * beta_cf(b, a, 1.0 - x) / b
    }
}

/// Two-sided p-value of a Student-t statistic with `df` degrees of freedom:
/// I_{df/(df+t²)}(df/2, 1/2)
pub(crate) fn students_t_two_sided_p(t: f64, df: f64) -> f64 {
    if df <= 0.0 {
        return 1.0;
    }
    let x = df / (df + t * t);
    incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erf_known_values() {
        assert!((erf(0.0)).abs() < 1e-7);
        assert!((erf(1.0) - 0.8427007).abs() < 1e-5);
        assert!((erf(-1.0) + 0.8427007).abs() < 1e-5);
        assert!(erf(4.0) > 0.9999);
    }

    #[test]
    fn test_normal_cdf_symmetry() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        let p = normal_cdf(1.96);
        assert!((p - 0.975).abs() < 1e-3);
        assert!((normal_cdf(-1.96) - (1.0 - p)).abs() < 1e-7);
    }

    #[test]
    fn test_ln_gamma_factorials() {
        // Gamma(5) = 24
        assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-9);
        // Gamma(1/2) = sqrt(pi)
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-9);
    }

    #[test]
    fn test_chi_squared_sf_known_values() {
        // P(chi2_1 > 3.841) = 0.05
        assert!((chi_squared_sf(3.841, 1.0) - 0.05).abs() < 1e-3);
        // P(chi2_2 > 5.991) = 0.05
        assert!((chi_squared_sf(5.991, 2.0) - 0.05).abs() < 1e-3);
        assert_eq!(chi_squared_sf(0.0, 3.0), 1.0);
    }

    #[test]
    fn test_chi_squared_sf_monotone_in_x() {
        let mut prev = 1.0;
        for i in 1..30 {
            let sf = chi_squared_sf(i as f64 * 0.5, 4.0);
            assert!(sf <= prev + 1e-12);
            prev = sf;
        }
    }

    #[test]
    fn test_students_t_known_values() {
        // t = 2.571 at df = 5 is the 97.5th percentile
        assert!((students_t_two_sided_p(2.571, 5.0) - 0.05).abs() < 1e-3);
        // t = 0 is no evidence at all
        assert!((students_t_two_sided_p(0.0, 10.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_incomplete_beta_boundaries() {
        assert_eq!(incomplete_beta(2.0, 3.0, 0.0), 0.0);
        assert_eq!(incomplete_beta(2.0, 3.0, 1.0), 1.0);
        // I_x(1, 1) = x (uniform CDF)
        assert!((incomplete_beta(1.0, 1.0, 0.3) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_gamma_p_boundaries() {
        assert_eq!(gamma_p(1.0, 0.0), 0.0);
        assert_eq!(gamma_p(0.0, 1.0), 0.0);
        // P(1, x) = 1 - e^-x
        assert!((gamma_p(1.0, 2.0) - (1.0 - (-2.0_f64).exp())).abs() < 1e-9);
    }
}
