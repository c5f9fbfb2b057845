//! Forward-Euler finite-difference pricer for Black-Scholes vanilla options.
//!
//! The payoff is rolled back from expiry to today with
//! [`ExplicitEuler`] over the Black-Scholes operator on a sinh-stretched spot grid,
//! driven by a [`FiniteDifferenceModel`]. Boundary values are refreshed after every step;
//! early exercise is a projection applied after every step (American) or at the
//! exercise dates, which become stopping times of the time grid (Bermudan).

use log::{debug, warn};

use crate::core::{
    DiagKey, Diagnostics, ExerciseStyle, FdError, OptionType, PricingEngine, PricingResult,
};
use crate::fd::grid::{interpolate_on_grid, stretched_grid};
use crate::fd::operators::black_scholes_operator;
use crate::fd::{
    DirichletBoundary, ExerciseProjection, ExplicitEuler, FiniteDifferenceModel,
    StepConditionSet, check_explicit_step, min_stable_steps,
};
use crate::instruments::VanillaOption;
use crate::market::Market;

/// Forward-Euler explicit finite-difference engine for the Black-Scholes PDE.
///
/// The solver is conditionally stable and checks a CFL-like bound before time marching.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExplicitFdEngine {
    /// Number of time steps.
    pub time_steps: usize,
    /// Number of spot intervals; the grid has `space_steps + 1` nodes.
    pub space_steps: usize,
    /// Spot truncation multiplier: `S_max = s_max_multiplier * max(spot, strike)`.
    pub s_max_multiplier: f64,
    /// Stretching parameter for the non-uniform spot grid.
    ///
    /// Smaller values concentrate more points around strike.
    pub grid_stretch: f64,
    /// Safety factor applied to the computed CFL time-step limit.
    pub cfl_safety_factor: f64,
    /// If `true`, pricing fails when `dt` violates the CFL bound.
    pub enforce_cfl: bool,
}

impl Default for ExplicitFdEngine {
    fn default() -> Self {
        Self {
            time_steps: 2_000,
            space_steps: 180,
            s_max_multiplier: 4.0,
            grid_stretch: 0.15,
            cfl_safety_factor: 0.95,
            enforce_cfl: true,
        }
    }
}

impl ExplicitFdEngine {
    /// Creates an explicit-FD engine with custom time/space resolution.
    pub fn new(time_steps: usize, space_steps: usize) -> Self {
        Self {
            time_steps,
            space_steps,
            ..Self::default()
        }
    }

    /// Sets `S_max = multiplier * max(spot, strike)`.
    pub fn with_s_max_multiplier(mut self, s_max_multiplier: f64) -> Self {
        self.s_max_multiplier = s_max_multiplier;
        self
    }

    /// Sets the non-uniform grid stretching parameter.
    pub fn with_grid_stretch(mut self, grid_stretch: f64) -> Self {
        self.grid_stretch = grid_stretch;
        self
    }

    /// Sets the CFL safety factor.
    pub fn with_cfl_safety_factor(mut self, cfl_safety_factor: f64) -> Self {
        self.cfl_safety_factor = cfl_safety_factor;
        self
    }

    /// Enables or disables strict CFL enforcement.
    pub fn with_enforce_cfl(mut self, enforce_cfl: bool) -> Self {
        self.enforce_cfl = enforce_cfl;
        self
    }

    fn validate(&self) -> Result<(), FdError> {
        if self.time_steps == 0 || self.space_steps < 2 {
            return Err(FdError::InvalidInput(
                "time_steps must be > 0 and space_steps must be >= 2".to_string(),
            ));
        }
        if self.s_max_multiplier <= 0.0 || !self.s_max_multiplier.is_finite() {
            return Err(FdError::InvalidInput(
                "s_max_multiplier must be finite and > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Prices independent options against one market.
    ///
    /// Each option runs its own operator, scheme and driver; with the `parallel`
    /// feature the sessions are spread over the rayon thread pool.
    pub fn price_batch(
        &self,
        options: &[VanillaOption],
        market: &Market,
    ) -> Vec<Result<PricingResult, FdError>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            options
                .par_iter()
                .map(|option| self.price(option, market))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            options
                .iter()
                .map(|option| self.price(option, market))
                .collect()
        }
    }
}

/// Dirichlet values `(V(0), V(S_max))` at time-to-expiry `tau`.
fn boundary_values(
    option_type: OptionType,
    is_american: bool,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    s_max: f64,
    tau: f64,
) -> (f64, f64) {
    match (option_type, is_american) {
        (OptionType::Call, false) => {
            let upper =
                (s_max * (-dividend_yield * tau).exp() - strike * (-rate * tau).exp()).max(0.0);
            (0.0, upper)
        }
        (OptionType::Put, false) => (strike * (-rate * tau).exp(), 0.0),
        (OptionType::Call, true) => (0.0, (s_max - strike).max(0.0)),
        (OptionType::Put, true) => (strike, 0.0),
    }
}

impl PricingEngine<VanillaOption> for ExplicitFdEngine {
    fn price(&self, instrument: &VanillaOption, market: &Market) -> Result<PricingResult, FdError> {
        instrument.validate()?;
        self.validate()?;

        if instrument.expiry == 0.0 {
            return Ok(PricingResult {
                price: instrument.option_type.intrinsic(market.spot, instrument.strike),
                diagnostics: Diagnostics::new(),
            });
        }

        let vol = market.vol;
        if vol <= 0.0 || !vol.is_finite() {
            return Err(FdError::InvalidInput(
                "market volatility must be finite and > 0".to_string(),
            ));
        }

        let n_t = self.time_steps;
        let n_s = self.space_steps;
        let expiry = instrument.expiry;
        let dt = expiry / n_t as f64;

        let s_anchor = market.spot.max(instrument.strike).max(1.0e-8);
        let s_max = self.s_max_multiplier * s_anchor;
        let grid = stretched_grid(n_s, s_max, instrument.strike, self.grid_stretch)?;
        let op = black_scholes_operator(&grid, market.rate, market.dividend_yield, vol)?;

        let report = check_explicit_step(&op, dt, self.cfl_safety_factor)?;
        if !report.stable {
            let min_steps = min_stable_steps(expiry, report.dt_max)?;
            if self.enforce_cfl {
                return Err(FdError::NumericalError(format!(
                    "explicit FD CFL violated: dt={dt:.6e} > dt_max={:.6e}; increase time_steps to at least {min_steps}",
                    report.dt_max
                )));
            }
            warn!(
                "explicit FD stepping above the CFL bound (dt/dt_max={:.3}); expect divergence",
                report.ratio()
            );
        }

        let option_type = instrument.option_type;
        let strike = instrument.strike;
        let (rate, dividend_yield) = (market.rate, market.dividend_yield);
        let is_american = matches!(instrument.exercise, ExerciseStyle::American);
        let payoff = grid
            .iter()
            .map(|&s| option_type.intrinsic(s, strike))
            .collect::<Vec<_>>();

        let mut conditions = StepConditionSet::new();
        conditions.push_every_step(
            DirichletBoundary::new()
                .with_lower(move |t| {
                    boundary_values(
                        option_type,
                        is_american,
                        strike,
                        rate,
                        dividend_yield,
                        s_max,
                        expiry - t,
                    )
                    .0
                })
                .with_upper(move |t| {
                    boundary_values(
                        option_type,
                        is_american,
                        strike,
                        rate,
                        dividend_yield,
                        s_max,
                        expiry - t,
                    )
                    .1
                }),
        );
        let stopping_times = match &instrument.exercise {
            ExerciseStyle::European => Vec::new(),
            ExerciseStyle::American => {
                conditions.push_every_step(ExerciseProjection::new(payoff.clone()));
                Vec::new()
            }
            ExerciseStyle::Bermudan { dates } => {
                conditions.push(ExerciseProjection::new(payoff.clone()));
                dates.clone()
            }
        };

        debug!(
            "explicit FD {}: {n_t}x{n_s} grid, s_max={s_max}, dt={dt:.3e}, {} stopping times",
            if is_american { "american" } else { "european/bermudan" },
            stopping_times.len()
        );

        let scheme = ExplicitEuler::new(op)?;
        let mut model = FiniteDifferenceModel::new(scheme);
        let mut values = payoff;
        model.rollback_uniform(&mut values, expiry, 0.0, n_t, &stopping_times, &mut conditions)?;

        let price = interpolate_on_grid(market.spot, &grid, &values)?;

        let mut diagnostics = Diagnostics::new();
        diagnostics.insert_key(DiagKey::NumTimeSteps, model.steps_taken() as f64);
        diagnostics.insert_key(DiagKey::NumSpaceSteps, n_s as f64);
        diagnostics.insert_key(DiagKey::SMax, s_max);
        diagnostics.insert_key(DiagKey::Vol, vol);
        diagnostics.insert_key(DiagKey::CflDtMax, report.dt_max);
        diagnostics.insert_key(DiagKey::NumStoppingTimes, stopping_times.len() as f64);

        Ok(PricingResult { price, diagnostics })
    }
}
