use crate::core::constants::{
    FRESHNESS_HALF_LIFE_DAYS, MAX_EVIDENCE, MAX_RISK_SCORE, MAX_SEVERITY, MIN_SEVERITY,
    RISK_SCALE, SECONDS_PER_DAY, VOTE_HALF_LIFE_SECS,
};
use crate::util::error::CityPulseError;
use crate::util::time::now_unix;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

fn default_trust() -> f64 {
    1.0
}

/// A single up/down vote on a hazard.
///
/// `value` is read by sign only: positive confirms the hazard, negative
/// disputes it, zero carries no evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub value: i8,
    /// Unix seconds.
    #[serde(alias = "created_at")]
    pub created_at: f64,
    #[serde(default = "default_trust")]
    pub trust: f64,
}

impl Vote {
    pub fn new(value: i8, created_at: f64) -> Self {
        Self {
            value,
            created_at,
            trust: default_trust(),
        }
    }

    pub fn up(created_at: f64) -> Self {
        Self::new(1, created_at)
    }

    pub fn down(created_at: f64) -> Self {
        Self::new(-1, created_at)
    }

    pub fn with_trust(mut self, trust: f64) -> Self {
        self.trust = trust;
        self
    }
}

/// Turns a hazard's severity and its votes into a bounded `0..=100` score.
///
/// Votes lose weight with a 72 hour half-life, the whole hazard fades with a
/// 7 day half-life of inactivity, and the net vote signal is log-compressed so
/// vote flooding cannot saturate the score.
///
/// # Example
///
/// ```
/// use citypulse_rs::{RiskScorer, Vote};
///
/// let now = 1_700_000_000.0;
/// let votes = vec![Vote::up(now); 10];
/// let score = RiskScorer::default().score_at(5.0, &votes, Some(now), now);
/// assert_eq!(score, 69);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScorer {
    vote_half_life_secs: f64,
    freshness_half_life_days: f64,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self {
            vote_half_life_secs: VOTE_HALF_LIFE_SECS,
            freshness_half_life_days: FRESHNESS_HALF_LIFE_DAYS,
        }
    }
}

impl RiskScorer {
    pub fn builder() -> RiskScorerBuilder {
        RiskScorerBuilder::new()
    }

    pub fn vote_half_life_secs(&self) -> f64 {
        self.vote_half_life_secs
    }

    pub fn freshness_half_life_days(&self) -> f64 {
        self.freshness_half_life_days
    }

    /// Scores against the current wall clock.
    ///
    /// The result drifts as time passes; use [`RiskScorer::score_at`] when a
    /// reproducible value is needed.
    pub fn score(&self, severity: f64, votes: &[Vote], last_activity: Option<f64>) -> u8 {
        self.score_at(severity, votes, last_activity, now_unix())
    }

    /// Scores as seen at unix time `now`.
    pub fn score_at(
        &self,
        severity: f64,
        votes: &[Vote],
        last_activity: Option<f64>,
        now: f64,
    ) -> u8 {
        if !severity.is_finite() || severity <= 0.0 {
            return 0;
        }
        let sev = severity.clamp(MIN_SEVERITY, MAX_SEVERITY);

        if votes.is_empty() {
            return 0;
        }

        let weighted_net = self.weighted_net(votes, now);
        // An overflowing sum saturates through the evidence clamp; only NaN is dropped.
        if weighted_net == 0.0 || weighted_net.is_nan() {
            return 0;
        }

        let evidence = (weighted_net.signum() * (weighted_net.abs() + 1.0).log2())
            .clamp(-MAX_EVIDENCE, MAX_EVIDENCE);

        let mut risk = sev * evidence;

        if let Some(last) = last_activity.filter(|ts| ts.is_finite()) {
            let inactivity_days = ((now - last) / SECONDS_PER_DAY).max(0.0);
            risk *= decay(inactivity_days, self.freshness_half_life_days);
        }

        (risk.abs() * RISK_SCALE)
            .round()
            .clamp(0.0, f64::from(MAX_RISK_SCORE)) as u8
    }

    /// Sum of `sign(value) * trust * age_weight` over all usable votes.
    fn weighted_net(&self, votes: &[Vote], now: f64) -> f64 {
        votes
            .iter()
            .filter(|v| v.created_at.is_finite() && v.trust.is_finite())
            .map(|v| {
                let age = (now - v.created_at).max(0.0);
                let weight = decay(age, self.vote_half_life_secs) * v.trust.max(0.0);
                f64::from(v.value.signum()) * weight
            })
            .sum()
    }
}

/// Exponential decay with the given half-life: 1 at `age == 0`, 0.5 at one half-life.
fn decay(age: f64, half_life: f64) -> f64 {
    (-age * LN_2 / half_life).exp()
}

#[derive(Debug, Default)]
pub struct RiskScorerBuilder {
    vote_half_life_secs: Option<f64>,
    freshness_half_life_days: Option<f64>,
}

impl RiskScorerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vote_half_life_secs(mut self, secs: f64) -> Self {
        self.vote_half_life_secs = Some(secs);
        self
    }

    pub fn freshness_half_life_days(mut self, days: f64) -> Self {
        self.freshness_half_life_days = Some(days);
        self
    }

    pub fn build(self) -> Result<RiskScorer, CityPulseError> {
        let vote_half_life_secs = self.vote_half_life_secs.unwrap_or(VOTE_HALF_LIFE_SECS);
        let freshness_half_life_days = self
            .freshness_half_life_days
            .unwrap_or(FRESHNESS_HALF_LIFE_DAYS);

        if !(vote_half_life_secs.is_finite() && vote_half_life_secs > 0.0) {
            return Err(CityPulseError::InvalidHalfLife(format!(
                "vote half-life must be positive, got {}",
                vote_half_life_secs
            )));
        }
        if !(freshness_half_life_days.is_finite() && freshness_half_life_days > 0.0) {
            return Err(CityPulseError::InvalidHalfLife(format!(
                "freshness half-life must be positive, got {}",
                freshness_half_life_days
            )));
        }

        Ok(RiskScorer {
            vote_half_life_secs,
            freshness_half_life_days,
        })
    }
}

/// Scores a hazard with the default half-lives against the wall clock.
pub fn calculate_risk_score(severity: f64, votes: &[Vote], last_activity: Option<f64>) -> u8 {
    RiskScorer::default().score(severity, votes, last_activity)
}

/// Scores a hazard with the default half-lives as seen at `now`.
pub fn calculate_risk_score_at(
    severity: f64,
    votes: &[Vote],
    last_activity: Option<f64>,
    now: f64,
) -> u8 {
    RiskScorer::default().score_at(severity, votes, last_activity, now)
}
