//! Common traits defining the seams between planner components

use crate::common::error::PlannerResult;

/// A smooth curve y(x) fitted through control points with strictly
/// increasing x, evaluable at arbitrary x.
pub trait Interpolant: Sized {
    /// Fit the curve through `(x[i], y[i])`
    fn fit(x: &[f64], y: &[f64]) -> PlannerResult<Self>;

    /// Evaluate the curve at `x`
    fn eval(&self, x: f64) -> f64;
}
