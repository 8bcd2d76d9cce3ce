//! MCMC proposal kernels on model parameters.
//!
//! The outer sampler calls `propose`, evaluates the posterior, and reports
//! the outcome back via `accept`/`reject` and `optimize`.

pub mod rates_freqs;

pub use rates_freqs::RatesFreqsOperator;

/// Acceptance probability that adaptive tuning aims for
pub const TARGET_ACCEPTANCE_PROBABILITY: f64 = 0.234;

/// Outcome of a proposal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proposal {
    /// The state was changed; the sampler decides on acceptance.
    Accepted { log_hastings_ratio: f64 },
    /// The proposed state is invalid and the state was left unchanged.
    Rejected,
}

impl Proposal {
    /// Returns the log Hastings ratio, `-inf` if rejected.
    pub fn log_hastings_ratio(&self) -> f64 {
        match self {
            Proposal::Accepted { log_hastings_ratio } => *log_hastings_ratio,
            Proposal::Rejected => f64::NEG_INFINITY,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Proposal::Rejected)
    }
}

/// Counts of accepted and rejected proposals of one operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptanceCounter {
    accepted: u64,
    rejected: u64,
}

impl AcceptanceCounter {
    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    pub fn reject(&mut self) {
        self.rejected += 1;
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn proposals(&self) -> u64 {
        self.accepted + self.rejected
    }

    /// Returns the fraction of accepted proposals, `None` before the first.
    pub fn acceptance_probability(&self) -> Option<f64> {
        (self.proposals() > 0).then(|| self.accepted as f64 / self.proposals() as f64)
    }

    /// Returns the step towards the target acceptance for adaptive tuning,
    /// `(exp(min(log_alpha, 0)) - target) / (proposals + 1)`.
    pub fn coercion_delta(&self, log_alpha: f64) -> f64 {
        let count = self.proposals() as f64 + 1.0;
        let delta = (log_alpha.min(0.0).exp() - TARGET_ACCEPTANCE_PROBABILITY) / count;
        if delta.is_finite() { delta } else { 0.0 }
    }
}
