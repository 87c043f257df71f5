//! Traffic-stats aggregation for the live traffic panel and the metrics bar.

use shared::{domain::RiskLevel, protocol::TrafficStats};

use crate::error::describe_fetch_error;

/// Sovereignty figure shown in the metrics bar before any stats have loaded.
pub const DEFAULT_SOVEREIGNTY_PERCENT: u8 = 85;
/// Token-similarity figure shown in the metrics bar. Not measured.
pub const UTILITY_PERCENT: u8 = 98;

/// Lifecycle of a panel fed by a single backend fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> PanelState<T> {
    pub fn from_fetch<U>(result: anyhow::Result<U>, build: impl FnOnce(U) -> T) -> Self {
        match result {
            Ok(payload) => Self::Ready(build(payload)),
            Err(err) => Self::Failed(describe_fetch_error(&err)),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskShare {
    pub level: RiskLevel,
    pub count: u64,
    pub percent: f64,
}

impl RiskShare {
    pub fn rounded_percent(&self) -> u64 {
        self.percent.round() as u64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSummary {
    pub total_requests: u64,
    pub blocked_count: u64,
    pub sovereign_count: u64,
    pub sovereignty_percent: u8,
    pub cloud_percent: u8,
    /// Always LOW, MEDIUM, HIGH, CRITICAL.
    pub risk: Vec<RiskShare>,
}

impl TrafficSummary {
    pub fn risk_total(&self) -> u64 {
        self.risk
            .iter()
            .fold(0u64, |total, share| total.saturating_add(share.count))
    }
}

pub type StatsPanel = PanelState<TrafficSummary>;

/// Share of requests kept on-premises, rounded half up. A sovereign count
/// above the total is clamped so the result never exceeds 100.
pub fn sovereignty_percent(sovereign_count: u64, total_requests: u64) -> u8 {
    if total_requests == 0 {
        return 0;
    }
    let sovereign = u128::from(sovereign_count.min(total_requests));
    let total = u128::from(total_requests);
    ((sovereign * 200 + total) / (total * 2)) as u8
}

pub fn cloud_percent(sovereign_count: u64, total_requests: u64) -> u8 {
    if total_requests == 0 {
        return 0;
    }
    100 - sovereignty_percent(sovereign_count, total_requests)
}

/// Per-level shares over the four known levels; other keys are ignored.
pub fn risk_distribution(stats: &TrafficStats) -> Vec<RiskShare> {
    let counts = RiskLevel::ORDERED.map(|level| (level, stats.risk_count(level.as_str())));
    let risk_total: u128 = counts.iter().map(|(_, count)| u128::from(*count)).sum();
    counts
        .into_iter()
        .map(|(level, count)| RiskShare {
            level,
            count,
            percent: if risk_total > 0 {
                count as f64 / risk_total as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

pub fn summarize(stats: &TrafficStats) -> TrafficSummary {
    TrafficSummary {
        total_requests: stats.total_requests,
        blocked_count: stats.blocked_count,
        sovereign_count: stats.sovereign_count,
        sovereignty_percent: sovereignty_percent(stats.sovereign_count, stats.total_requests),
        cloud_percent: cloud_percent(stats.sovereign_count, stats.total_requests),
        risk: risk_distribution(stats),
    }
}

/// Header figures above every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsBar {
    pub total_redacted: u64,
    pub sovereignty_percent: u8,
    pub utility_percent: u8,
}

impl MetricsBar {
    pub fn new(total_redacted: u64, stats: &StatsPanel) -> Self {
        Self {
            total_redacted,
            sovereignty_percent: stats
                .ready()
                .map(|summary| summary.sovereignty_percent)
                .unwrap_or(DEFAULT_SOVEREIGNTY_PERCENT),
            utility_percent: UTILITY_PERCENT,
        }
    }
}
