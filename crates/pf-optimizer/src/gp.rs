//! Gaussian-process regression with an isotropic RBF kernel.
//!
//! Dense row-major `Vec<Vec<f64>>` matrices; sizes are bounded by the
//! evaluation budget (tens of points), so no linear-algebra crate is needed.

/// Lower bound on predictive variance.
pub const MIN_VARIANCE: f64 = 1e-10;

/// Squared-exponential covariance `variance * exp(-|x - x'|^2 / (2 l^2))`
/// plus diagonal observation noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RbfKernel {
    pub length_scale: f64,
    pub variance: f64,
    pub noise: f64,
}

impl RbfKernel {
    pub fn new(length_scale: f64, variance: f64, noise: f64) -> Self {
        Self {
            length_scale,
            variance,
            noise,
        }
    }

    pub fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        let sq_dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
        self.variance * (-sq_dist / (2.0 * self.length_scale * self.length_scale)).exp()
    }
}

/// Predictive distribution at a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub mean: f64,
    pub variance: f64,
}

impl Prediction {
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Upper confidence bound `mean + kappa * std_dev`.
    pub fn ucb(&self, kappa: f64) -> f64 {
        self.mean + kappa * self.std_dev()
    }
}

/// Symmetric covariance matrix over `points` with `noise` on the diagonal.
pub fn kernel_matrix(points: &[Vec<f64>], kernel: &RbfKernel) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut k = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let value = kernel.eval(&points[i], &points[j]);
            k[i][j] = value;
            k[j][i] = value;
        }
        k[i][i] += kernel.noise;
    }
    k
}

/// Lower-triangular `L` with `K = L L^T`, or `None` when `K` is not
/// positive definite.
pub fn cholesky(k: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = k.len();
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|p| l[i][p] * l[j][p]).sum();
            if i == j {
                let diag = k[i][i] - sum;
                // Also rejects NaN.
                if !(diag > 0.0) {
                    return None;
                }
                l[i][j] = diag.sqrt();
            } else {
                l[i][j] = (k[i][j] - sum) / l[j][j];
            }
        }
    }
    Some(l)
}

/// Solve `L L^T x = b` by forward then back substitution.
pub fn solve_with_factor(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut z = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[i][j] * z[j]).sum();
        z[i] = (b[i] - sum) / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|j| l[j][i] * x[j]).sum();
        x[i] = (z[i] - sum) / l[i][i];
    }
    x
}

/// Solve `K x = y` via Cholesky. `None` if `K` is not positive definite.
pub fn cholesky_solve(k: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    let l = cholesky(k)?;
    Some(solve_with_factor(&l, y))
}

fn cross_covariance(x_star: &[f64], points: &[Vec<f64>], kernel: &RbfKernel) -> Vec<f64> {
    points.iter().map(|p| kernel.eval(x_star, p)).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn posterior(k_star: &[f64], k_inv_k_star: &[f64], alpha: &[f64], prior: f64) -> Prediction {
    let mean = dot(k_star, alpha);
    let variance = (prior - dot(k_star, k_inv_k_star)).max(MIN_VARIANCE);
    Prediction { mean, variance }
}

/// Predictive mean and variance at `x_star` given training `points` and
/// weights `alpha = K^-1 y`.
///
/// Rebuilds and refactors the kernel matrix on every call. Use
/// [`GaussianProcess`] to reuse one factorization across many predictions.
/// If the refactorization fails the variance falls back to the prior.
pub fn predict(
    x_star: &[f64],
    points: &[Vec<f64>],
    alpha: &[f64],
    kernel: &RbfKernel,
) -> Prediction {
    let k_star = cross_covariance(x_star, points, kernel);
    let prior = kernel.eval(x_star, x_star) + kernel.noise;
    let k_inv_k_star = cholesky_solve(&kernel_matrix(points, kernel), &k_star)
        .unwrap_or_else(|| vec![0.0; points.len()]);
    posterior(&k_star, &k_inv_k_star, alpha, prior)
}

/// A fitted GP holding its Cholesky factor.
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    points: Vec<Vec<f64>>,
    factor: Vec<Vec<f64>>,
    alpha: Vec<f64>,
    kernel: RbfKernel,
}

impl GaussianProcess {
    /// Fit to `(points, targets)`. `None` if the kernel matrix is not
    /// positive definite.
    pub fn fit(points: Vec<Vec<f64>>, targets: &[f64], kernel: RbfKernel) -> Option<Self> {
        let factor = cholesky(&kernel_matrix(&points, &kernel))?;
        let alpha = solve_with_factor(&factor, targets);
        Some(Self {
            points,
            factor,
            alpha,
            kernel,
        })
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn kernel(&self) -> &RbfKernel {
        &self.kernel
    }

    /// Same quantities as [`predict`], without refactoring.
    pub fn predict(&self, x_star: &[f64]) -> Prediction {
        let k_star = cross_covariance(x_star, &self.points, &self.kernel);
        let prior = self.kernel.eval(x_star, x_star) + self.kernel.noise;
        let k_inv_k_star = solve_with_factor(&self.factor, &k_star);
        posterior(&k_star, &k_inv_k_star, &self.alpha, prior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn rbf_kernel_values() {
        let kernel = RbfKernel::new(0.5, 1.0, 0.0);
        assert_eq!(kernel.eval(&[0.3, 0.3], &[0.3, 0.3]), 1.0);
        // |d|^2 = 0.25, 2 l^2 = 0.5
        assert!(close(kernel.eval(&[0.0], &[0.5]), (-0.5f64).exp(), 1e-15));
    }

    #[test]
    fn kernel_matrix_is_symmetric_with_noise_on_diagonal() {
        let kernel = RbfKernel::new(0.5, 1.0, 1e-4);
        let points = vec![vec![0.0, 0.0], vec![0.5, 0.1], vec![1.0, 1.0]];
        let k = kernel_matrix(&points, &kernel);
        for i in 0..3 {
            assert!(close(k[i][i], 1.0 + 1e-4, 1e-15));
            for j in 0..3 {
                assert_eq!(k[i][j], k[j][i]);
            }
        }
    }

    #[test]
    fn cholesky_solve_known_system() {
        let k = vec![vec![4.0, 2.0], vec![2.0, 3.0]];
        let x = cholesky_solve(&k, &[2.0, 1.0]).unwrap();
        assert!(close(x[0], 0.5, 1e-12));
        assert!(close(x[1], 0.0, 1e-12));
    }

    #[test]
    fn cholesky_solve_rejects_indefinite_matrix() {
        let k = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
        assert!(cholesky_solve(&k, &[1.0, 1.0]).is_none());
    }

    #[test]
    fn cholesky_rejects_nan() {
        let k = vec![vec![f64::NAN]];
        assert!(cholesky(&k).is_none());
    }

    #[test]
    fn cholesky_of_empty_matrix_is_empty() {
        assert_eq!(cholesky_solve(&[], &[]), Some(Vec::new()));
    }

    #[test]
    fn prediction_interpolates_training_point() {
        let kernel = RbfKernel::new(0.5, 1.0, 1e-4);
        let points = vec![vec![0.5]];
        let alpha = cholesky_solve(&kernel_matrix(&points, &kernel), &[1.0]).unwrap();

        let at_point = predict(&[0.5], &points, &alpha, &kernel);
        assert!(close(at_point.mean, 1.0 / 1.0001, 1e-12));
        assert!(close(at_point.variance, 1.0001 - 1.0 / 1.0001, 1e-12));

        let far = predict(&[100.0], &points, &alpha, &kernel);
        assert!(close(far.mean, 0.0, 1e-12));
        assert!(close(far.variance, 1.0001, 1e-12));
    }

    #[test]
    fn variance_is_floored() {
        let kernel = RbfKernel::new(0.5, 1.0, 0.0);
        let points = vec![vec![0.2]];
        let alpha = vec![1.0];
        let p = predict(&[0.2], &points, &alpha, &kernel);
        assert!(p.variance >= MIN_VARIANCE);
    }

    #[test]
    fn fitted_model_matches_reference_prediction() {
        let kernel = RbfKernel::new(0.3, 1.0, 1e-4);
        let points = vec![vec![0.1, 0.9], vec![0.4, 0.4], vec![0.8, 0.2], vec![0.95, 0.7]];
        let targets = [0.3, 1.2, -0.5, 0.1];
        let gp = GaussianProcess::fit(points.clone(), &targets, kernel).unwrap();

        for x in [[0.0, 0.0], [0.5, 0.5], [0.9, 0.3]] {
            let cached = gp.predict(&x);
            let reference = predict(&x, &points, gp.alpha(), &kernel);
            assert_eq!(cached, reference);
        }
    }

    #[test]
    fn ucb_adds_scaled_std_dev() {
        let p = Prediction {
            mean: 1.0,
            variance: 4.0,
        };
        assert_eq!(p.ucb(2.576), 1.0 + 2.576 * 2.0);
    }
}
