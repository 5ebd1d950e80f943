//! Small numerical routines used by the curve generators.

/// Default absolute tolerance on the minimizer location.
pub const DEFAULT_XATOL: f64 = 1e-5;
/// Default cap on objective evaluations.
pub const DEFAULT_MAXITER: usize = 500;

/// The result of a bounded scalar minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    /// The location of the minimum.
    pub x: f64,
    /// The objective value at `x`.
    pub fx: f64,
    /// The number of objective evaluations performed.
    pub evaluations: usize,
    /// Whether the tolerance was met before the evaluation cap.
    pub converged: bool,
}

/// Minimizes `f` over the closed interval `[lo, hi]`.
///
/// Uses Brent's method: golden-section search accelerated by successive
/// parabolic interpolation. The search stops once the bracket around the
/// best point is smaller than about `xatol`, or after `maxiter` evaluations.
/// The end points themselves are never evaluated.
///
/// # Panics
///
/// Panics if `lo > hi` or either bound is not finite.
///
/// ```
/// use lithodesign::numeric::fminbound;
///
/// let min = fminbound(|x| (x - 1.5).powi(2), 0., 4., 1e-8, 500);
/// assert!((min.x - 1.5).abs() < 1e-6);
/// assert!(min.converged);
/// ```
pub fn fminbound(
    mut f: impl FnMut(f64) -> f64,
    lo: f64,
    hi: f64,
    xatol: f64,
    maxiter: usize,
) -> Minimum {
    assert!(
        lo.is_finite() && hi.is_finite() && lo <= hi,
        "invalid bounds [{lo}, {hi}]"
    );
    let sqrt_eps = 2.2e-16f64.sqrt();
    let golden_mean = 0.5 * (3. - 5f64.sqrt());

    let (mut a, mut b) = (lo, hi);
    // The best point so far, the second best, and the previous second best.
    let mut xf = a + golden_mean * (b - a);
    let (mut nfc, mut fulc) = (xf, xf);
    let mut rat: f64 = 0.;
    let mut e: f64 = 0.;
    let mut fx = f(xf);
    let mut evaluations = 1;
    let (mut ffulc, mut fnfc) = (fx, fx);
    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * xf.abs() + xatol / 3.;
    let mut tol2 = 2. * tol1;
    let mut converged = true;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
        let mut golden = true;
        if e.abs() > tol1 {
            golden = false;
            let mut r = (xf - nfc) * (fx - ffulc);
            let mut q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            q = 2. * (q - r);
            if q > 0. {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                // Parabolic step.
                rat = p / q;
                let x = xf + rat;
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = tol1 * sign_or_one(xm - xf);
                }
            } else {
                golden = true;
            }
        }
        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = golden_mean * e;
        }

        let x = xf + sign_or_one(rat) * rat.abs().max(tol1);
        let fu = f(x);
        evaluations += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            (fulc, ffulc) = (nfc, fnfc);
            (nfc, fnfc) = (xf, fx);
            (xf, fx) = (x, fu);
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                (fulc, ffulc) = (nfc, fnfc);
                (nfc, fnfc) = (x, fu);
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                (fulc, ffulc) = (x, fu);
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * xf.abs() + xatol / 3.;
        tol2 = 2. * tol1;

        if evaluations >= maxiter {
            converged = false;
            break;
        }
    }

    if !converged {
        tracing::warn!(x = xf, fx, evaluations, "fminbound hit its evaluation limit");
    }

    Minimum {
        x: xf,
        fx,
        evaluations,
        converged,
    }
}

/// `signum`, except that zero maps to one.
fn sign_or_one(value: f64) -> f64 {
    if value < 0. {
        -1.
    } else {
        1.
    }
}

/// Returns `n` evenly spaced samples over `[start, stop]`, including both ends.
///
/// ```
/// use lithodesign::numeric::linspace;
///
/// assert_eq!(linspace(0., 1., 5), vec![0., 0.25, 0.5, 0.75, 1.]);
/// assert_eq!(linspace(2., 3., 1), vec![2.]);
/// assert!(linspace(2., 3., 0).is_empty());
/// ```
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        stop
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}
