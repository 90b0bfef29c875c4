// Natural cubic spline interpolation
//
// Coefficients per segment i: y = a + b*dx + c*dx^2 + d*dx^3 with
// dx = t - x[i]. The second-derivative terms c come from the usual
// tridiagonal system with natural end conditions. Outside the control
// points the curve continues as a straight line.

extern crate nalgebra as na;

use crate::common::{Interpolant, PlannerError, PlannerResult};

#[derive(Debug, Clone)]
pub struct CubicSpline {
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    x: Vec<f64>,
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> PlannerResult<CubicSpline> {
        Self::validate(x, y)?;
        let nx = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let a = y.to_vec();

        let a_mat = CubicSpline::calc_a(&h);
        let b_mat = CubicSpline::calc_b(&h, &a);
        let c_na = a_mat.lu().solve(&b_mat).ok_or_else(|| {
            PlannerError::DegenerateGeometry("spline system is singular".to_string())
        })?;
        let c: Vec<f64> = c_na.iter().copied().collect();

        let mut b: Vec<f64> = Vec::with_capacity(nx - 1);
        let mut d: Vec<f64> = Vec::with_capacity(nx - 1);
        for i in 0..nx - 1 {
            d.push((c[i + 1] - c[i]) / (3. * h[i]));
            b.push((a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(CubicSpline { a, b, c, d, x: x.to_vec() })
    }

    fn validate(x: &[f64], y: &[f64]) -> PlannerResult<()> {
        if x.len() != y.len() {
            return Err(PlannerError::DegenerateGeometry(format!(
                "x and y lengths differ ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(PlannerError::DegenerateGeometry(
                "need at least 2 control points".to_string(),
            ));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(PlannerError::DegenerateGeometry(
                "control points must be finite".to_string(),
            ));
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PlannerError::DegenerateGeometry(format!(
                "x not strictly increasing at index {} ({} -> {})",
                i + 1,
                x[i],
                x[i + 1]
            )));
        }
        Ok(())
    }

    /// Evaluate at `t`
    pub fn calc(&self, t: f64) -> f64 {
        let n = self.x.len();
        if t < self.x[0] {
            return self.a[0] + self.b[0] * (t - self.x[0]);
        }
        if t > self.x[n - 1] {
            return self.a[n - 1] + self.end_slope() * (t - self.x[n - 1]);
        }
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    /// First derivative at `t`
    pub fn calcd(&self, t: f64) -> f64 {
        let n = self.x.len();
        if t < self.x[0] {
            return self.b[0];
        }
        if t > self.x[n - 1] {
            return self.end_slope();
        }
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.b[i] + 2. * self.c[i] * dx + 3. * self.d[i] * dx.powi(2)
    }

    fn end_slope(&self) -> f64 {
        let i = self.x.len() - 2;
        let h = self.x[i + 1] - self.x[i];
        self.b[i] + 2. * self.c[i] * h + 3. * self.d[i] * h.powi(2)
    }

    fn search_index(&self, t: f64) -> usize {
        let n = self.x.len();
        self.x.partition_point(|&xi| xi <= t).saturating_sub(1).min(n - 2)
    }

    fn calc_a(h: &[f64]) -> na::DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = na::DMatrix::zeros(nx, nx);
        a[(0, 0)] = 1.;
        for i in 0..nx - 1 {
            if i != nx - 2 {
                a[(i + 1, i + 1)] = 2.0 * (h[i] + h[i + 1]);
            }
            a[(i + 1, i)] = h[i];
            a[(i, i + 1)] = h[i];
        }
        a[(0, 1)] = 0.;
        a[(nx - 1, nx - 2)] = 0.;
        a[(nx - 1, nx - 1)] = 1.;
        a
    }

    fn calc_b(h: &[f64], a: &[f64]) -> na::DVector<f64> {
        let nx = h.len() + 1;
        let mut b = na::DVector::zeros(nx);
        for i in 0..nx - 2 {
            b[i + 1] = 3.0 * (a[i + 2] - a[i + 1]) / h[i + 1] - 3.0 * (a[i + 1] - a[i]) / h[i];
        }
        b
    }
}

impl Interpolant for CubicSpline {
    fn fit(x: &[f64], y: &[f64]) -> PlannerResult<Self> {
        CubicSpline::new(x, y)
    }

    fn eval(&self, x: f64) -> f64 {
        self.calc(x)
    }
}
