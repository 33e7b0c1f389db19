//! Takeover estimates from a fitted logistic mixture.
//!
//! ## Purpose
//!
//! Once the three-wave mixture has been fitted, this module projects the
//! curve forward from the start of the series and reads off the quantities
//! reported to stakeholders: when the new variant passes 50% and 99% of
//! cases, its growth rate, doubling time and transmission increase.
//!
//! ## Design notes
//!
//! * **One-sigma bands**: bounds come from two perturbed curves, the fitted
//!   parameters plus and minus their standard errors scaled per parameter by
//!   a [`PerturbationPolicy`].
//! * **Envelope**: the trajectory's lower and upper curves are the pointwise
//!   minimum and maximum of the two perturbed curves, so `lower <= upper`
//!   holds at every day.
//! * **Growth term**: one logistic term, the third by default, describes the
//!   variant being tracked; its rate is the reported growth rate. The
//!   default starting point gives the three terms distinct rates, with the
//!   tracked term fastest. A start with identical terms makes the first and
//!   third terms interchangeable, and the iteration keeps them equal.
//!
//! ## Key concepts
//!
//! * **Crossing date**: first simulated day on or after the anchor date where
//!   the curve is at or above a threshold. A curve that never gets there
//!   within the horizon has no crossing date.
//!
//! ## Invariants
//!
//! * Every [`Estimate`] has `lower <= upper`.
//! * For one curve, the 0.99 crossing is never earlier than the 0.50 crossing.

// External dependencies
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::f64::consts::LN_2;
use std::fmt::{Display, Formatter, Result};

// Internal dependencies
use crate::algorithms::levenberg::MIN_INITIAL_FRACTION;
use crate::math::logistic::{mixture, N_PARAMS};

/// Default number of simulated days.
pub const DEFAULT_HORIZON_DAYS: usize = 400;

/// Default serial interval in days.
pub const DEFAULT_SERIAL_INTERVAL: f64 = 5.5;

/// Lower takeover threshold.
pub const MIDPOINT_THRESHOLD: f64 = 0.5;

/// Upper takeover threshold.
pub const TAKEOVER_THRESHOLD: f64 = 0.99;

/// Default starting point for the mixture fit, `(x0, r)` per term.
pub const DEFAULT_INITIAL_GUESS: [f64; N_PARAMS] = [0.001, 0.03, 0.001, 0.02, 0.001, 0.1];

/// Number of logistic terms in the mixture.
pub const N_TERMS: usize = N_PARAMS / 2;

/// Default 1-based term whose rate is reported as the growth rate.
pub const DEFAULT_GROWTH_TERM: usize = 3;

/// Parameter index of the rate of 1-based `term`.
pub fn rate_index(term: usize) -> usize {
    2 * term - 1
}

// ============================================================================
// Perturbation Policy
// ============================================================================

/// Per-parameter multipliers applied to the standard errors when building
/// the perturbed curves.
///
/// The "plus" curve uses `θ + m ∘ σ` and the "minus" curve `θ − m ∘ σ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerturbationPolicy {
    /// Sigma multiplier for each parameter.
    pub multipliers: [f64; N_PARAMS],
}

impl PerturbationPolicy {
    /// Policy used by the published dashboard: the second term's initial
    /// fraction moves against the others and its rate is held fixed.
    pub fn reference() -> Self {
        Self {
            multipliers: [1.0, 1.0, -1.0, 0.0, 1.0, 1.0],
        }
    }

    /// Every parameter moves by one standard error in the same direction.
    pub fn symmetric() -> Self {
        Self {
            multipliers: [1.0; N_PARAMS],
        }
    }

    /// Custom multipliers.
    pub fn custom(multipliers: [f64; N_PARAMS]) -> Self {
        Self { multipliers }
    }

    /// Perturbed parameters `θ + direction · m ∘ σ`, clamped to the mixture bounds.
    pub fn perturb(&self, params: &[f64; N_PARAMS], std_errors: &[f64; N_PARAMS], direction: f64) -> [f64; N_PARAMS] {
        let mut out = [0.0; N_PARAMS];
        for i in 0..N_PARAMS {
            let floor = if i % 2 == 0 { MIN_INITIAL_FRACTION } else { 0.0 };
            out[i] = (params[i] + direction * self.multipliers[i] * std_errors[i]).max(floor);
        }
        out
    }
}

impl Default for PerturbationPolicy {
    fn default() -> Self {
        Self::reference()
    }
}

// ============================================================================
// Estimates
// ============================================================================

/// A point estimate with its lower and upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate<T> {
    /// Point estimate.
    pub estimate: T,
    /// Lower bound.
    pub lower: T,
    /// Upper bound.
    pub upper: T,
}

impl<T: PartialOrd> Estimate<T> {
    /// Build an estimate from two bounds given in either order.
    pub fn ordered(estimate: T, a: T, b: T) -> Self {
        let (lower, upper) = if b < a { (b, a) } else { (a, b) };
        Self {
            estimate,
            lower,
            upper,
        }
    }
}

/// One simulated day of the fitted curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    /// Calendar date.
    pub date: NaiveDate,
    /// Days since the start of the series.
    pub ndays: usize,
    /// Fitted curve.
    pub fit_y: f64,
    /// Lower envelope of the perturbed curves.
    pub fit_lower: f64,
    /// Upper envelope of the perturbed curves.
    pub fit_upper: f64,
}

/// Derived takeover quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct TakeoverEstimates {
    /// First date the curve reaches 0.50.
    pub date50: Estimate<Option<NaiveDate>>,
    /// First date the curve reaches 0.99.
    pub date99: Estimate<Option<NaiveDate>>,
    /// Growth rate per day of the tracked term.
    pub growth_rate: Estimate<f64>,
    /// `ln 2 / growth_rate`, in days.
    pub doubling_time: Estimate<f64>,
    /// `growth_rate × serial interval`.
    pub transmission_increase: Estimate<f64>,
}

/// Flat row of the estimates table for tabular output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateRow {
    /// Quantity name.
    pub quantity: &'static str,
    /// Point estimate.
    pub estimate: String,
    /// Lower bound.
    pub lower: String,
    /// Upper bound.
    pub upper: String,
}

impl TakeoverEstimates {
    /// Estimates as flat rows.
    pub fn rows(&self) -> Vec<EstimateRow> {
        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        let date_row = |quantity, e: &Estimate<Option<NaiveDate>>| EstimateRow {
            quantity,
            estimate: date(e.estimate),
            lower: date(e.lower),
            upper: date(e.upper),
        };
        let value_row = |quantity, e: &Estimate<f64>| EstimateRow {
            quantity,
            estimate: e.estimate.to_string(),
            lower: e.lower.to_string(),
            upper: e.upper.to_string(),
        };
        vec![
            date_row("date50", &self.date50),
            date_row("date99", &self.date99),
            value_row("growth_rate", &self.growth_rate),
            value_row("doubling_time", &self.doubling_time),
            value_row("transmission_increase", &self.transmission_increase),
        ]
    }
}

// ============================================================================
// Derivation
// ============================================================================

/// Inputs to [`derive_estimates`] besides the fitted parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// First date of the series (day 0).
    pub start: NaiveDate,
    /// Crossing dates are searched from here on.
    pub anchor: NaiveDate,
    /// Number of simulated days.
    pub horizon_days: usize,
    /// Serial interval in days.
    pub serial_interval: f64,
    /// Sigma multipliers for the perturbed curves.
    pub policy: PerturbationPolicy,
    /// 1-based term whose rate is the reported growth rate.
    pub growth_term: usize,
}

/// Simulate the fitted and perturbed curves over the horizon.
pub fn simulate_trajectory(
    params: &[f64; N_PARAMS],
    std_errors: &[f64; N_PARAMS],
    projection: &Projection,
) -> Vec<TrajectoryPoint> {
    let plus = projection.policy.perturb(params, std_errors, 1.0);
    let minus = projection.policy.perturb(params, std_errors, -1.0);

    (0..projection.horizon_days)
        .map(|day| {
            let t = day as f64;
            let a = mixture(t, &plus);
            let b = mixture(t, &minus);
            TrajectoryPoint {
                date: projection.start + Duration::days(day as i64),
                ndays: day,
                fit_y: mixture(t, params),
                fit_lower: a.min(b),
                fit_upper: a.max(b),
            }
        })
        .collect()
}

/// First date on or after `anchor` where `curve` reaches `threshold`.
pub fn first_crossing<F>(
    trajectory: &[TrajectoryPoint],
    anchor: NaiveDate,
    threshold: f64,
    curve: F,
) -> Option<NaiveDate>
where
    F: Fn(&TrajectoryPoint) -> f64,
{
    trajectory
        .iter()
        .find(|p| p.date >= anchor && curve(p) >= threshold)
        .map(|p| p.date)
}

fn crossing_estimate(
    trajectory: &[TrajectoryPoint],
    anchor: NaiveDate,
    threshold: f64,
) -> Estimate<Option<NaiveDate>> {
    // The upper envelope crosses first
    Estimate {
        estimate: first_crossing(trajectory, anchor, threshold, |p| p.fit_y),
        lower: first_crossing(trajectory, anchor, threshold, |p| p.fit_upper),
        upper: first_crossing(trajectory, anchor, threshold, |p| p.fit_lower),
    }
}

/// Derive the takeover estimates and trajectory from fitted parameters.
pub fn derive_estimates(
    params: &[f64; N_PARAMS],
    std_errors: &[f64; N_PARAMS],
    projection: &Projection,
) -> (TakeoverEstimates, Vec<TrajectoryPoint>) {
    let trajectory = simulate_trajectory(params, std_errors, projection);

    let k = rate_index(projection.growth_term);
    let rate = params[k];
    let spread = projection.policy.multipliers[k] * std_errors[k];
    let growth_rate = Estimate::ordered(rate, (rate - spread).max(0.0), (rate + spread).max(0.0));

    let doubling = |g: f64| if g > 0.0 { LN_2 / g } else { f64::INFINITY };
    let doubling_time = Estimate::ordered(
        doubling(growth_rate.estimate),
        doubling(growth_rate.upper),
        doubling(growth_rate.lower),
    );

    let si = projection.serial_interval;
    let transmission_increase = Estimate::ordered(
        growth_rate.estimate * si,
        growth_rate.lower * si,
        growth_rate.upper * si,
    );

    let estimates = TakeoverEstimates {
        date50: crossing_estimate(&trajectory, projection.anchor, MIDPOINT_THRESHOLD),
        date99: crossing_estimate(&trajectory, projection.anchor, TAKEOVER_THRESHOLD),
        growth_rate,
        doubling_time,
        transmission_increase,
    };

    (estimates, trajectory)
}

// ============================================================================
// Display Implementation
// ============================================================================

impl Display for TakeoverEstimates {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "{:<22} {:>12} {:>12} {:>12}", "Quantity", "Estimate", "Lower", "Upper")?;
        writeln!(f, "{:-<61}", "")?;
        for row in self.rows() {
            let show = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
            writeln!(
                f,
                "{:<22} {:>12} {:>12} {:>12}",
                row.quantity,
                show(&row.estimate),
                show(&row.lower),
                show(&row.upper)
            )?;
        }
        Ok(())
    }
}
