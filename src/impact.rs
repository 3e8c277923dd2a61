//! Environmental impact estimate.
//!
//! The coefficients are illustrative placeholders, not a scientific model.
//! Only the input/output shape and the delayed delivery matter.

use std::time::{Duration, Instant};

use tracing::debug;

/// Delay between pressing "calculate" and the results appearing.
pub const CALCULATION_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Technology {
    /// Patented anaerobic digestion
    Anaerobic,
    Gasification,
    Pyrolysis,
    Combustion,
}

impl Technology {
    pub fn efficiency(self) -> f64 {
        match self {
            Technology::Anaerobic => 0.85,
            Technology::Gasification | Technology::Pyrolysis | Technology::Combustion => 0.65,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactInputs {
    /// Square meters.
    pub facility_size: f64,
    /// Tons per day.
    pub waste_capacity: f64,
    pub technology: Technology,
    /// Hours per year.
    pub operational_hours: f64,
    /// Percent of intake diverted from landfill.
    pub waste_diversion: f64,
}

impl Default for ImpactInputs {
    fn default() -> Self {
        Self {
            facility_size: 10_000.0,
            waste_capacity: 100.0,
            technology: Technology::Anaerobic,
            operational_hours: 8_000.0,
            waste_diversion: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactResults {
    pub carbon_credits: f64,
    /// Percentage points toward the national contribution target.
    pub indc_contribution: f64,
    /// Tons CO2e.
    pub ghg_reduction: f64,
    /// MWh.
    pub renewable_energy: f64,
    /// Tons.
    pub waste_diverted: f64,
}

pub fn estimate(inputs: &ImpactInputs) -> ImpactResults {
    let eff = inputs.technology.efficiency();
    let throughput = inputs.waste_capacity * inputs.operational_hours;

    let ghg_reduction = throughput * 0.5 * eff;
    let carbon_credits = ghg_reduction * 0.8;
    let indc_contribution = carbon_credits * 0.001;
    let renewable_energy = throughput * 0.3 * eff;
    let waste_diverted = throughput * (inputs.waste_diversion / 100.0);

    ImpactResults {
        carbon_credits: carbon_credits.round(),
        indc_contribution: (indc_contribution * 1000.0).round() / 1000.0,
        ghg_reduction: ghg_reduction.round(),
        renewable_energy: renewable_energy.round(),
        waste_diverted: waste_diverted.round(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ImpactError {
    #[error("a calculation is already pending")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalculationState {
    Idle,
    Pending {
        ready_at: Instant,
        results: ImpactResults,
    },
    Complete(ImpactResults),
}

/// Calculator form state. Time is passed in so callers decide how to wait.
#[derive(Debug, Clone)]
pub struct ImpactCalculator {
    inputs: ImpactInputs,
    state: CalculationState,
    delay: Duration,
}

impl Default for ImpactCalculator {
    fn default() -> Self {
        Self::new(ImpactInputs::default())
    }
}

impl ImpactCalculator {
    pub fn new(inputs: ImpactInputs) -> Self {
        Self::with_delay(inputs, CALCULATION_DELAY)
    }

    pub fn with_delay(inputs: ImpactInputs, delay: Duration) -> Self {
        Self {
            inputs,
            state: CalculationState::Idle,
            delay,
        }
    }

    pub fn inputs(&self) -> &ImpactInputs {
        &self.inputs
    }

    pub fn state(&self) -> &CalculationState {
        &self.state
    }

    /// Edit the inputs. A finished result goes stale and is withdrawn; a
    /// pending one still delivers what was computed when it started.
    pub fn update(&mut self, edit: impl FnOnce(&mut ImpactInputs)) {
        edit(&mut self.inputs);
        if matches!(self.state, CalculationState::Complete(_)) {
            self.state = CalculationState::Idle;
        }
    }

    pub fn is_trigger_enabled(&self) -> bool {
        !matches!(self.state, CalculationState::Pending { .. })
    }

    /// Start a calculation; the result is held back until `now + delay`.
    pub fn calculate(&mut self, now: Instant) -> Result<Instant, ImpactError> {
        if !self.is_trigger_enabled() {
            return Err(ImpactError::Busy);
        }
        let ready_at = now + self.delay;
        self.state = CalculationState::Pending {
            ready_at,
            results: estimate(&self.inputs),
        };
        debug!(delay_ms = self.delay.as_millis() as u64, "impact calculation started");
        Ok(ready_at)
    }

    /// Deliver a pending result once its time has come.
    pub fn poll(&mut self, now: Instant) -> Option<&ImpactResults> {
        if let CalculationState::Pending { ready_at, results } = self.state {
            if now >= ready_at {
                debug!("impact calculation complete");
                self.state = CalculationState::Complete(results);
            }
        }
        self.results()
    }

    /// Results, only while a completed calculation is current.
    pub fn results(&self) -> Option<&ImpactResults> {
        match &self.state {
            CalculationState::Complete(results) => Some(results),
            _ => None,
        }
    }
}
