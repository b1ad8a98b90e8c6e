//! Dashboard figures derived from the request collection.
//!
//! `completedThisMonth` and `completedRequests` keep their historical names but
//! carry no workflow meaning: the first counts requests *created* in the current
//! UTC month, the second counts low-priority requests in a bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::request::{Priority, Request};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetrics {
    pub total_requests: usize,
    pub completed_this_month: usize,
    pub high_priority: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month: String,
    /// `Mon YYYY`, e.g. `Jan 2024`
    pub month_name: String,
    pub total_requests: usize,
    pub completed_requests: usize,
    pub high_priority_requests: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_budget: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSummary {
    pub total_requests: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_monthly_requests: Decimal,
    pub peak_month: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineReport {
    pub timeline: Vec<MonthlyBucket>,
    pub summary: TimelineSummary,
}

pub const NO_PEAK_MONTH: &str = "N/A";

pub fn metrics(requests: &[Request], now: DateTime<Utc>) -> RequestMetrics {
    let completed_this_month = requests
        .iter()
        .filter(|request| {
            request.created_at.year() == now.year() && request.created_at.month() == now.month()
        })
        .count();
    let high_priority =
        requests.iter().filter(|request| request.has_priority(Priority::High)).count();

    RequestMetrics { total_requests: requests.len(), completed_this_month, high_priority }
}

/// Groups requests by creation month, oldest first. Months without requests are
/// not synthesized.
pub fn timeline(requests: &[Request]) -> TimelineReport {
    let mut months: BTreeMap<(i32, u32), Vec<&Request>> = BTreeMap::new();
    for request in requests {
        let key = (request.created_at.year(), request.created_at.month());
        months.entry(key).or_default().push(request);
    }

    let timeline: Vec<MonthlyBucket> = months
        .into_iter()
        .map(|((year, month), members)| bucket(year, month, &members))
        .collect();

    let summary = summarize(&timeline);
    TimelineReport { timeline, summary }
}

fn bucket(year: i32, month: u32, members: &[&Request]) -> MonthlyBucket {
    let total = members.len();
    let budget_sum: Decimal = members.iter().map(|request| request.fields.budget).sum();
    let avg_budget = mean(budget_sum, total);

    // Month labels are taken from the first member so no date needs rebuilding.
    let month_name = members
        .first()
        .map(|request| request.created_at.format("%b %Y").to_string())
        .unwrap_or_default();

    MonthlyBucket {
        month: format!("{year:04}-{month:02}"),
        month_name,
        total_requests: total,
        completed_requests: members
            .iter()
            .filter(|request| request.has_priority(Priority::Low))
            .count(),
        high_priority_requests: members
            .iter()
            .filter(|request| request.has_priority(Priority::High))
            .count(),
        avg_budget,
    }
}

fn summarize(timeline: &[MonthlyBucket]) -> TimelineSummary {
    let total_requests: usize = timeline.iter().map(|bucket| bucket.total_requests).sum();

    let mut peak: Option<&MonthlyBucket> = None;
    for bucket in timeline {
        if peak.map_or(true, |current| bucket.total_requests > current.total_requests) {
            peak = Some(bucket);
        }
    }

    TimelineSummary {
        total_requests,
        avg_monthly_requests: mean(Decimal::from(total_requests), timeline.len()),
        peak_month: peak
            .map(|bucket| bucket.month_name.clone())
            .unwrap_or_else(|| NO_PEAK_MONTH.to_string()),
    }
}

fn mean(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (sum / Decimal::from(count)).round_dp(2)
}
