//! Turning overnight investment costs into the per-period capital cost the
//! optimizer charges per MW of built capacity.

use crate::error::{LopfError, LopfResult};

/// Capital recovery factor r(1+r)^n / ((1+r)^n - 1).
///
/// With a zero discount rate the cost is spread evenly, giving 1/n.
pub fn annuity(discount_rate: f64, lifetime_years: f64) -> LopfResult<f64> {
    if !(lifetime_years > 0.0 && lifetime_years.is_finite()) {
        return Err(LopfError::Validation(format!(
            "lifetime must be a positive number of years, got {lifetime_years}"
        )));
    }
    if !(discount_rate >= 0.0 && discount_rate.is_finite()) {
        return Err(LopfError::Validation(format!(
            "discount rate must be non-negative, got {discount_rate}"
        )));
    }

    let r = discount_rate;
    let n = lifetime_years;
    if r < 1e-10 {
        Ok(1.0 / n)
    } else {
        let growth = (1.0 + r).powf(n);
        Ok(r * growth / (growth - 1.0))
    }
}

/// Overnight cost per MW annualized over the asset lifetime.
pub fn annualized_capital_cost(
    overnight_cost: f64,
    discount_rate: f64,
    lifetime_years: f64,
) -> LopfResult<f64> {
    Ok(overnight_cost * annuity(discount_rate, lifetime_years)?)
}
