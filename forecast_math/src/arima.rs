//! Auto-fitted ARIMA forecasting
//!
//! [`AutoArima`] chooses the differencing orders with the lowest-variance
//! rule (seasonal first, then regular), then selects the autoregressive
//! order by AIC among least-squares fits. Moving-average terms are not
//! estimated, so every fitted model is an ARIMA(p, d, 0)(0, D, 0).
//!
//! Prediction intervals come from the psi-weight expansion of the full
//! differenced AR polynomial, which makes them widen with the horizon.

use crate::stats::{self, normal_quantile};
use crate::{MathError, Result};
use std::fmt;

/// Fewest observations any candidate model can be fitted on
const MIN_OBSERVATIONS: usize = 2;

/// Default upper bound for the autoregressive order
const DEFAULT_MAX_P: usize = 3;

/// Order of a fitted model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    /// AR order (p)
    pub p: usize,
    /// Regular differencing order (d)
    pub d: usize,
    /// Seasonal differencing order (D), 0 or 1
    pub seasonal_d: usize,
    /// Seasonal period; zero when no seasonal difference was taken
    pub period: usize,
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},0)", self.p, self.d)?;
        if self.seasonal_d > 0 {
            write!(f, "(0,{},0)[{}]", self.seasonal_d, self.period)?;
        }
        Ok(())
    }
}

/// Prediction interval at one confidence level
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    /// Confidence level in (0, 1)
    pub level: f64,
    /// Lower bound per forecast step
    pub lower: Vec<f64>,
    /// Upper bound per forecast step
    pub upper: Vec<f64>,
}

/// Point forecast with its prediction intervals
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    /// Point forecast per step
    pub point: Vec<f64>,
    /// One interval per requested confidence level, in request order
    pub intervals: Vec<Interval>,
}

/// Model selector that fits the best ARIMA(p, d, 0)(0, D, 0) to a series
#[derive(Debug, Clone)]
pub struct AutoArima {
    max_p: usize,
    max_d: usize,
    seasonal_period: Option<usize>,
}

impl Default for AutoArima {
    fn default() -> Self {
        Self {
            max_p: DEFAULT_MAX_P,
            max_d: 1,
            seasonal_period: None,
        }
    }
}

impl AutoArima {
    /// Create a selector with explicit search bounds
    pub fn new(max_p: usize, max_d: usize, seasonal_period: Option<usize>) -> Result<Self> {
        if max_d > 2 {
            return Err(MathError::InvalidInput(
                "Regular differencing order must be at most 2".to_string(),
            ));
        }
        if let Some(period) = seasonal_period {
            if period < 2 {
                return Err(MathError::InvalidInput(format!(
                    "Seasonal period must be at least 2, got {}",
                    period
                )));
            }
        }

        Ok(Self {
            max_p,
            max_d,
            seasonal_period,
        })
    }

    /// Selector with the default search bounds and a seasonal period
    pub fn seasonal(period: usize) -> Result<Self> {
        Self::new(DEFAULT_MAX_P, 1, Some(period))
    }

    /// Seasonal period considered for seasonal differencing
    pub fn seasonal_period(&self) -> Option<usize> {
        self.seasonal_period
    }

    /// Fit the best model to the data
    pub fn fit(&self, data: &[f64]) -> Result<ArimaFit> {
        self.fit_with_cancel(data, || false)
    }

    /// Fit the best model, polling `is_cancelled` between candidate fits
    pub fn fit_with_cancel<F>(&self, data: &[f64], is_cancelled: F) -> Result<ArimaFit>
    where
        F: Fn() -> bool,
    {
        if data.len() < MIN_OBSERVATIONS {
            return Err(MathError::InsufficientData(format!(
                "Need at least {} observations, got {}",
                MIN_OBSERVATIONS,
                data.len()
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Series contains non-finite values".to_string(),
            ));
        }

        let spread = spread_of(data);
        let scale = stats::mean(data)?.abs().max(1.0);
        if spread <= 1e-9 * scale {
            return Err(MathError::CalculationError(
                "Cannot fit a constant series".to_string(),
            ));
        }

        let mut seasonal_d = 0;
        let mut period = 0;
        let mut base = data.to_vec();
        if let Some(p) = self.seasonal_period {
            if data.len() >= 2 * p + MIN_OBSERVATIONS {
                let diffed = seasonal_difference(data, p);
                if spread_of(&diffed) < spread {
                    seasonal_d = 1;
                    period = p;
                    base = diffed;
                }
            }
        }

        let mut d = 0;
        let mut w = base;
        while d < self.max_d && w.len() > MIN_OBSERVATIONS {
            let diffed = difference(&w);
            if spread_of(&diffed) < spread_of(&w) {
                w = diffed;
                d += 1;
            } else {
                break;
            }
        }

        let mut best: Option<(usize, ArCandidate)> = None;
        for p in 0..=self.max_p {
            if is_cancelled() {
                return Err(MathError::Cancelled);
            }
            if w.len() < 2 * p + 2 {
                break;
            }
            let Some(candidate) = fit_ar(&w, p) else {
                continue;
            };
            if best.as_ref().map_or(true, |(_, b)| candidate.aic < b.aic) {
                best = Some((p, candidate));
            }
        }

        if is_cancelled() {
            return Err(MathError::Cancelled);
        }

        let (p, best) = best.ok_or_else(|| {
            MathError::CalculationError("No ARIMA candidate could be fitted".to_string())
        })?;

        Ok(ArimaFit {
            order: ArimaOrder {
                p,
                d,
                seasonal_d,
                period,
            },
            intercept: best.intercept,
            coefficients: best.coefficients,
            sigma2: best.sigma2,
            aic: best.aic,
            observations: data.to_vec(),
        })
    }
}

/// A fitted model, ready to forecast
#[derive(Debug, Clone)]
pub struct ArimaFit {
    order: ArimaOrder,
    intercept: f64,
    coefficients: Vec<f64>,
    sigma2: f64,
    aic: f64,
    observations: Vec<f64>,
}

impl ArimaFit {
    /// Order of the selected model
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Intercept of the differenced AR process
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// AR coefficients, lag 1 first
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Akaike information criterion of the selected candidate
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Forecast `horizon` steps past the last observation.
    ///
    /// `levels` are confidence levels in (0, 1); one [`Interval`] is
    /// produced per level.
    pub fn forecast(&self, horizon: usize, levels: &[f64]) -> Result<Forecast> {
        if horizon == 0 {
            return Err(MathError::InvalidInput(
                "Forecast horizon must be at least 1".to_string(),
            ));
        }

        let ArimaOrder {
            d,
            seasonal_d,
            period,
            ..
        } = self.order;

        let seasonal = if seasonal_d > 0 {
            seasonal_difference(&self.observations, period)
        } else {
            self.observations.clone()
        };
        let mut chain = vec![seasonal];
        for i in 0..d {
            let next = difference(&chain[i]);
            chain.push(next);
        }

        let mut w = chain[d].clone();
        let start = w.len();
        for _ in 0..horizon {
            let mut next = self.intercept;
            for (lag, phi) in self.coefficients.iter().enumerate() {
                next += phi * w[w.len() - 1 - lag];
            }
            w.push(next);
        }
        let mut future = w.split_off(start);

        for level in chain[..d].iter().rev() {
            let mut last = level.last().copied().ok_or_else(|| {
                MathError::CalculationError("Differenced series is empty".to_string())
            })?;
            future = future
                .into_iter()
                .map(|delta| {
                    last += delta;
                    last
                })
                .collect();
        }

        let point = if seasonal_d > 0 {
            let mut extended = self.observations.clone();
            for value in future {
                let lagged = extended[extended.len() - period];
                extended.push(value + lagged);
            }
            extended.split_off(self.observations.len())
        } else {
            future
        };

        let std_errors = self.std_errors(horizon);
        let intervals = levels
            .iter()
            .map(|&level| {
                let z = normal_quantile(level)?;
                let (lower, upper) = point
                    .iter()
                    .zip(&std_errors)
                    .map(|(p, se)| (p - z * se, p + z * se))
                    .unzip();
                Ok(Interval {
                    level,
                    lower,
                    upper,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Forecast { point, intervals })
    }

    /// Forecast standard error per step from the psi weights
    fn std_errors(&self, horizon: usize) -> Vec<f64> {
        let mut poly = Vec::with_capacity(self.coefficients.len() + 1);
        poly.push(1.0);
        poly.extend(self.coefficients.iter().map(|phi| -phi));
        for _ in 0..self.order.d {
            poly = multiply(&poly, &[1.0, -1.0]);
        }
        if self.order.seasonal_d > 0 {
            let mut seasonal = vec![0.0; self.order.period + 1];
            seasonal[0] = 1.0;
            seasonal[self.order.period] = -1.0;
            poly = multiply(&poly, &seasonal);
        }

        let mut psi = Vec::with_capacity(horizon);
        psi.push(1.0);
        for j in 1..horizon {
            let mut value = 0.0;
            for i in 1..=j.min(poly.len() - 1) {
                value -= poly[i] * psi[j - i];
            }
            psi.push(value);
        }

        let mut cumulative = 0.0;
        psi.iter()
            .map(|weight| {
                cumulative += weight * weight;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect()
    }
}

/// Least-squares fit of one AR candidate
struct ArCandidate {
    intercept: f64,
    coefficients: Vec<f64>,
    sigma2: f64,
    aic: f64,
}

fn fit_ar(w: &[f64], p: usize) -> Option<ArCandidate> {
    let k = p + 1;
    let rows = w.len() - p;
    let regressors = |t: usize| -> Vec<f64> {
        let mut row = Vec::with_capacity(k);
        row.push(1.0);
        row.extend((1..=p).map(|lag| w[t - lag]));
        row
    };

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for t in p..w.len() {
        let row = regressors(t);
        for a in 0..k {
            xty[a] += row[a] * w[t];
            for b in 0..k {
                xtx[a][b] += row[a] * row[b];
            }
        }
    }

    let beta = solve_linear_system(xtx, xty)?;
    let rss: f64 = (p..w.len())
        .map(|t| {
            let fitted: f64 = regressors(t).iter().zip(&beta).map(|(x, b)| x * b).sum();
            (w[t] - fitted).powi(2)
        })
        .sum();

    let sigma2 = (rss / rows as f64).max(f64::EPSILON);
    let aic = rows as f64 * sigma2.ln() + 2.0 * (k + 1) as f64;

    Some(ArCandidate {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        sigma2,
        aic,
    })
}

/// Gaussian elimination with partial pivoting; `None` when singular
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(0.0f64, |acc, v| acc.max(v.abs()))
        .max(f64::MIN_POSITIVE);
    let tolerance = 1e-10 * scale;

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < tolerance {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for c in col..n {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

fn seasonal_difference(values: &[f64], period: usize) -> Vec<f64> {
    values
        .iter()
        .skip(period)
        .zip(values)
        .map(|(current, lagged)| current - lagged)
        .collect()
}

fn spread_of(values: &[f64]) -> f64 {
    stats::std_dev(values).unwrap_or(f64::INFINITY)
}

fn multiply(lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; lhs.len() + rhs.len() - 1];
    for (i, a) in lhs.iter().enumerate() {
        for (j, b) in rhs.iter().enumerate() {
            out[i + j] += a * b;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn noisy_trend(n: usize) -> Vec<f64> {
        let mut state: u64 = 12345;
        (0..n)
            .map(|t| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let noise = ((state >> 33) as f64 / (1u64 << 31) as f64 - 0.5) * 6.0;
                50.0 + 0.5 * t as f64 + noise
            })
            .collect()
    }

    #[test]
    fn test_linear_trend_is_extrapolated() {
        let data: Vec<f64> = (0..20).map(|t| 100.0 + 10.0 * t as f64).collect();
        let fit = AutoArima::default().fit(&data).unwrap();

        assert_eq!(fit.order().d, 1);
        assert_eq!(fit.order().p, 0);
        assert_relative_eq!(fit.intercept(), 10.0, epsilon = 1e-9);

        let forecast = fit.forecast(3, &[]).unwrap();
        assert_eq!(forecast.point.len(), 3);
        assert_relative_eq!(forecast.point[0], 300.0, epsilon = 1e-6);
        assert_relative_eq!(forecast.point[1], 310.0, epsilon = 1e-6);
        assert_relative_eq!(forecast.point[2], 320.0, epsilon = 1e-6);
        assert!(forecast.intervals.is_empty());
    }

    #[test]
    fn test_seasonal_pattern_repeats() {
        let pattern = [10.0, 20.0, 30.0, 40.0];
        let data: Vec<f64> = pattern.iter().cycle().take(20).copied().collect();
        let fit = AutoArima::seasonal(4).unwrap().fit(&data).unwrap();

        assert_eq!(fit.order().seasonal_d, 1);
        assert_eq!(fit.order().period, 4);
        assert_eq!(fit.order().to_string(), "ARIMA(0,0,0)(0,1,0)[4]");

        let forecast = fit.forecast(6, &[]).unwrap();
        let expected = [10.0, 20.0, 30.0, 40.0, 10.0, 20.0];
        for (actual, expected) in forecast.point.iter().zip(expected) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_intervals_bracket_and_widen() {
        let data = noisy_trend(60);
        let fit = AutoArima::default().fit(&data).unwrap();
        let forecast = fit.forecast(8, &[0.80, 0.95]).unwrap();

        assert_eq!(forecast.intervals.len(), 2);
        let narrow = &forecast.intervals[0];
        let wide = &forecast.intervals[1];
        assert_relative_eq!(narrow.level, 0.80);

        let mut previous_width = 0.0;
        for step in 0..8 {
            let point = forecast.point[step];
            assert!(wide.lower[step] < narrow.lower[step]);
            assert!(narrow.lower[step] < point);
            assert!(point < narrow.upper[step]);
            assert!(narrow.upper[step] < wide.upper[step]);

            let width = wide.upper[step] - wide.lower[step];
            assert!(width >= previous_width - 1e-9);
            previous_width = width;
        }
    }

    #[test]
    fn test_two_observations_fit_a_mean() {
        let fit = AutoArima::default().fit(&[100.0, 110.0]).unwrap();
        assert_eq!(fit.order().p, 0);
        assert_eq!(fit.order().d, 0);

        let forecast = fit.forecast(2, &[0.9]).unwrap();
        assert_relative_eq!(forecast.point[0], 105.0, epsilon = 1e-9);
        assert_relative_eq!(forecast.point[1], 105.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_input_is_rejected() {
        let model = AutoArima::default();
        assert!(matches!(
            model.fit(&[5.0; 30]),
            Err(MathError::CalculationError(_))
        ));
        assert!(matches!(
            model.fit(&[5.0]),
            Err(MathError::InsufficientData(_))
        ));
        assert!(matches!(
            model.fit(&[1.0, f64::NAN, 3.0]),
            Err(MathError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cancellation_stops_fitting() {
        let data = noisy_trend(40);
        let result = AutoArima::default().fit_with_cancel(&data, || true);
        assert_eq!(result.unwrap_err(), MathError::Cancelled);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(AutoArima::new(3, 3, None).is_err());
        assert!(AutoArima::new(3, 1, Some(1)).is_err());

        let fit = AutoArima::default().fit(&noisy_trend(20)).unwrap();
        assert!(fit.forecast(0, &[]).is_err());
        assert!(fit.forecast(2, &[1.5]).is_err());
    }

    #[test]
    fn test_solve_linear_system() {
        let x = solve_linear_system(vec![vec![2.0, 1.0], vec![1.0, 3.0]], vec![3.0, 5.0]).unwrap();
        assert_relative_eq!(x[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.4, epsilon = 1e-12);

        assert!(solve_linear_system(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 2.0]).is_none());
    }
}
