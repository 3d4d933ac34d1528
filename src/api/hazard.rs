use crate::core::constants::HIGH_RISK_SCORE;
use crate::core::grid::CellKey;
use crate::core::risk::{RiskScorer, Vote};
use crate::util::coord::{FixedGeoCoordinate, e6_to_degrees};
use crate::util::error::CityPulseError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Read-only view of a reported hazard, as supplied by the storage layer.
///
/// # Example
///
/// ```
/// use citypulse_rs::{HazardSnapshot, RiskScorer, Vote};
///
/// let now = 1_700_000_000.0;
/// let hazard = HazardSnapshot::new(41_015_137, 28_979_530, 3)
///     .with_votes(vec![Vote::up(now)])
///     .with_last_activity(now);
///
/// assert_eq!(hazard.risk_at(&RiskScorer::default(), now), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardSnapshot {
    #[serde(default)]
    pub id: u64,
    pub lat_e6: i64,
    pub lon_e6: i64,
    pub severity: i32,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default)]
    pub last_activity_timestamp: Option<f64>,
    #[serde(default)]
    pub created_at: Option<f64>,
    #[serde(default)]
    pub category: u8,
    #[serde(default)]
    pub closed: bool,
}

impl HazardSnapshot {
    pub fn new(lat_e6: i64, lon_e6: i64, severity: i32) -> Self {
        Self {
            id: 0,
            lat_e6,
            lon_e6,
            severity,
            votes: Vec::new(),
            last_activity_timestamp: None,
            created_at: None,
            category: 0,
            closed: false,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn with_votes(mut self, votes: Vec<Vote>) -> Self {
        self.votes = votes;
        self
    }

    pub fn with_last_activity(mut self, timestamp: f64) -> Self {
        self.last_activity_timestamp = Some(timestamp);
        self
    }

    pub fn with_created_at(mut self, timestamp: f64) -> Self {
        self.created_at = Some(timestamp);
        self
    }

    pub fn with_category(mut self, category: u8) -> Self {
        self.category = category;
        self
    }

    pub fn closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    pub fn coordinate(&self) -> FixedGeoCoordinate {
        FixedGeoCoordinate::new(self.lat_e6, self.lon_e6)
    }

    /// Heatmap cell of this hazard for the given grid size.
    pub fn cell_key(&self, grid_size_e6: i64) -> Result<CellKey, CityPulseError> {
        CellKey::for_coordinate(self.lat_e6, self.lon_e6, grid_size_e6)
    }

    /// Last activity, falling back to the creation time.
    pub fn last_activity(&self) -> Option<f64> {
        self.last_activity_timestamp.or(self.created_at)
    }

    pub fn risk_at(&self, scorer: &RiskScorer, now: f64) -> u8 {
        scorer.score_at(
            f64::from(self.severity),
            &self.votes,
            self.last_activity_timestamp,
            now,
        )
    }

    /// Risk as shown in listings, decayed from [`HazardSnapshot::last_activity`].
    pub fn listing_risk_at(&self, scorer: &RiskScorer, now: f64) -> u8 {
        scorer.score_at(f64::from(self.severity), &self.votes, self.last_activity(), now)
    }

    pub fn tally(&self) -> VoteTally {
        VoteTally::from_votes(&self.votes)
    }

    pub fn summarize_at(&self, scorer: &RiskScorer, now: f64) -> HazardSummary {
        HazardSummary {
            id: self.id,
            lat: e6_to_degrees(self.lat_e6),
            lon: e6_to_degrees(self.lon_e6),
            category: self.category,
            severity: self.severity,
            closed: self.closed,
            tally: self.tally(),
            risk: self.listing_risk_at(scorer, now),
            last_activity: self.last_activity(),
        }
    }
}

/// Raw vote counts, independent of age and trust.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub up: usize,
    pub down: usize,
    pub total: usize,
    pub net: i64,
}

impl VoteTally {
    pub fn from_votes(votes: &[Vote]) -> Self {
        votes.iter().fold(Self::default(), |mut acc, vote| {
            match vote.value.signum() {
                1 => acc.up += 1,
                -1 => acc.down += 1,
                _ => {}
            }
            acc.total += 1;
            acc.net += i64::from(vote.value);
            acc
        })
    }
}

/// A hazard with its score resolved, ready for listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardSummary {
    pub id: u64,
    pub lat: f64,
    pub lon: f64,
    pub category: u8,
    pub severity: i32,
    pub closed: bool,
    pub tally: VoteTally,
    pub risk: u8,
    pub last_activity: Option<f64>,
}

/// Listing order for hazard summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HazardSort {
    /// Most recent activity first.
    #[default]
    Recent,
    /// Highest risk first, then most recent.
    Risk,
    /// Most votes first, then most recent.
    Votes,
}

fn by_recency(a: &HazardSummary, b: &HazardSummary) -> Ordering {
    let a = a.last_activity.unwrap_or(f64::NEG_INFINITY);
    let b = b.last_activity.unwrap_or(f64::NEG_INFINITY);
    b.total_cmp(&a)
}

impl HazardSort {
    pub fn sort(&self, items: &mut [HazardSummary]) {
        match self {
            HazardSort::Recent => items.sort_by(by_recency),
            HazardSort::Risk => {
                items.sort_by(|a, b| b.risk.cmp(&a.risk).then_with(|| by_recency(a, b)))
            }
            HazardSort::Votes => items.sort_by(|a, b| {
                b.tally
                    .total
                    .cmp(&a.tally.total)
                    .then_with(|| by_recency(a, b))
            }),
        }
    }
}

/// Aggregate figures over a set of hazard summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardStats {
    pub hazard_count: usize,
    pub avg_risk: u8,
    pub max_risk: u8,
    pub high_risk_count: usize,
}

impl HazardStats {
    pub fn from_summaries(items: &[HazardSummary]) -> Self {
        if items.is_empty() {
            return Self::default();
        }
        let total: u64 = items.iter().map(|h| u64::from(h.risk)).sum();
        let count = items.len() as u64;
        Self {
            hazard_count: items.len(),
            avg_risk: ((total * 2 + count) / (count * 2)) as u8,
            max_risk: items.iter().map(|h| h.risk).max().unwrap_or(0),
            high_risk_count: items.iter().filter(|h| h.risk >= HIGH_RISK_SCORE).count(),
        }
    }
}
