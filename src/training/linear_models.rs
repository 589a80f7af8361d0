//! Linear regressors: ordinary least squares, ridge and lasso

use super::models::{check_n_features, check_training_data, Regressor};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Solve the symmetric positive-definite system `a x = b` by Cholesky
/// decomposition. Returns `None` when `a` is not (numerically) positive
/// definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 1e-12 * a[[i, i]].abs() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan elimination with partial pivoting on `[a | b]`
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let mut aug = Array2::<f64>::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| {
            aug[[r1, col]]
                .abs()
                .partial_cmp(&aug[[r2, col]].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if aug[[pivot_row, col]].abs() < 1e-10 {
            return None;
        }
        if pivot_row != col {
            for j in 0..=n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        aug.row_mut(col).mapv_inplace(|v| v / pivot);

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    let pivot_vals = aug.row(col).to_owned();
                    aug.row_mut(row).scaled_add(-factor, &pivot_vals);
                }
            }
        }
    }

    Some(aug.column(n).to_owned())
}

/// Solve `(X^T X + alpha I) w = X^T y`.
///
/// Tries Cholesky, then Cholesky with a small diagonal jitter, then
/// Gauss-Jordan.
fn solve_normal_equations(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<Array1<f64>> {
    let n_features = x.ncols();
    let mut xtx = x.t().dot(x);
    for i in 0..n_features {
        xtx[[i, i]] += alpha;
    }
    let xty = x.t().dot(y);

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Ok(w);
    }

    let jitter = 1e-8 * xtx.diag().mapv(f64::abs).sum() / n_features.max(1) as f64;
    let mut regularized = xtx.clone();
    for i in 0..n_features {
        regularized[[i, i]] += jitter.max(1e-12);
    }
    if let Some(w) = cholesky_solve(&regularized, &xty) {
        return Ok(w);
    }

    gauss_jordan_solve(&xtx, &xty).ok_or_else(|| {
        PipelineError::TrainingError("singular matrix, cannot solve normal equations".to_string())
    })
}

/// Column means of `x` and mean of `y`, with both centered
struct Centered {
    x: Array2<f64>,
    y: Array1<f64>,
    x_mean: Array1<f64>,
    y_mean: f64,
}

impl Centered {
    fn new(x: &Array2<f64>, y: &Array1<f64>, fit_intercept: bool) -> Result<Self> {
        if !fit_intercept {
            return Ok(Self {
                x: x.clone(),
                y: y.clone(),
                x_mean: Array1::zeros(x.ncols()),
                y_mean: 0.0,
            });
        }
        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::TrainingError("empty feature matrix".to_string()))?;
        let y_mean = y.mean().unwrap_or(0.0);
        Ok(Self {
            x: x - &x_mean.view().insert_axis(Axis(0)),
            y: y - y_mean,
            x_mean,
            y_mean,
        })
    }

    fn intercept(&self, coefficients: &Array1<f64>) -> f64 {
        self.y_mean - coefficients.dot(&self.x_mean)
    }
}

/// Fitted weights shared by the linear models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LinearFit {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearFit {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_n_features(x, self.coefficients.len())?;
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}

/// Ordinary least squares regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    pub fit_intercept: bool,
    fitted: Option<LinearFit>,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            fit_intercept: true,
            fitted: None,
        }
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.coefficients)
    }

    pub fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.intercept)
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_data(x, y)?;
        let data = Centered::new(x, y, self.fit_intercept)?;
        let coefficients = solve_normal_equations(&data.x, &data.y, 0.0)?;
        self.fitted = Some(LinearFit {
            intercept: data.intercept(&coefficients),
            coefficients,
        });
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.fitted.as_ref().ok_or(PipelineError::ModelNotFitted)?.predict(x)
    }
}

/// L2-regularized linear regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub fit_intercept: bool,
    /// L2 regularization strength
    pub alpha: f64,
    fitted: Option<LinearFit>,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            fit_intercept: true,
            alpha,
            fitted: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.coefficients)
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_data(x, y)?;
        if self.alpha < 0.0 {
            return Err(PipelineError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        let data = Centered::new(x, y, self.fit_intercept)?;
        let coefficients = solve_normal_equations(&data.x, &data.y, self.alpha)?;
        self.fitted = Some(LinearFit {
            intercept: data.intercept(&coefficients),
            coefficients,
        });
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.fitted.as_ref().ok_or(PipelineError::ModelNotFitted)?.predict(x)
    }
}

/// L1-regularized linear regression fitted by coordinate descent.
///
/// Minimizes `1/(2n) ||y - Xw||² + alpha ||w||₁`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LassoRegression {
    pub fit_intercept: bool,
    /// L1 regularization strength
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    fitted: Option<LinearFit>,
    n_iter: usize,
}

impl Default for LassoRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LassoRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            fit_intercept: true,
            alpha,
            max_iter: 1000,
            tol: 1e-6,
            fitted: None,
            n_iter: 0,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.coefficients)
    }

    /// Sweeps run by the last fit
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    fn soft_threshold(val: f64, threshold: f64) -> f64 {
        if val > threshold {
            val - threshold
        } else if val < -threshold {
            val + threshold
        } else {
            0.0
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_data(x, y)?;
        if self.alpha < 0.0 {
            return Err(PipelineError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }

        let data = Centered::new(x, y, self.fit_intercept)?;
        let n_features = data.x.ncols();
        let col_norms: Vec<f64> = data.x.axis_iter(Axis(1)).map(|c| c.dot(&c)).collect();
        let lambda = self.alpha * data.x.nrows() as f64;

        let mut w = Array1::<f64>::zeros(n_features);
        let mut residual = data.y.clone();
        self.n_iter = 0;

        for _ in 0..self.max_iter {
            self.n_iter += 1;
            let mut max_change = 0.0f64;

            for j in 0..n_features {
                if col_norms[j] < 1e-15 {
                    continue;
                }
                let column = data.x.column(j);
                let rho = column.dot(&residual) + col_norms[j] * w[j];
                let new_wj = Self::soft_threshold(rho, lambda) / col_norms[j];
                let delta = w[j] - new_wj;
                if delta != 0.0 {
                    residual.scaled_add(delta, &column);
                    w[j] = new_wj;
                    max_change = max_change.max(delta.abs());
                }
            }

            if max_change < self.tol {
                break;
            }
        }

        self.fitted = Some(LinearFit {
            intercept: data.intercept(&w),
            coefficients: w,
        });
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.fitted.as_ref().ok_or(PipelineError::ModelNotFitted)?.predict(x)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LinearRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }

    fn name(&self) -> &'static str {
        "Linear Regression"
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}

impl Regressor for RidgeRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RidgeRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RidgeRegression::predict(self, x)
    }

    fn name(&self) -> &'static str {
        "Ridge"
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}

impl Regressor for LassoRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LassoRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LassoRegression::predict(self, x)
    }

    fn name(&self) -> &'static str {
        "Lasso"
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}
