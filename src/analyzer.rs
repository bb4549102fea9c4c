use crate::models::{
    AdmissionRecord, AdmissionStatus, ChartBucket, ChartSeries, DashboardStats, FilterState,
    TrackCategory, ALL_REGIONS_LABEL,
};
use std::collections::BTreeSet;

/// Everything the presentation layer needs for one filter state.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub filtered: Vec<AdmissionRecord>,
    pub stats: DashboardStats,
    pub chart: ChartSeries,
}

pub struct AdmissionAnalyzer<'a> {
    pub records: &'a [AdmissionRecord],
}

impl<'a> AdmissionAnalyzer<'a> {
    pub fn new(records: &'a [AdmissionRecord]) -> Self {
        Self { records }
    }

    /// Filter, then aggregate the filtered records from scratch
    pub fn analyze(&self, filter: &FilterState) -> DashboardView {
        let filtered = filter_records(self.records, filter);
        let stats = compute_stats(&filtered);
        let chart = compute_chart_series(&filtered);

        DashboardView {
            filtered,
            stats,
            chart,
        }
    }

    pub fn region_options(&self) -> Vec<String> {
        region_options(self.records)
    }
}

pub fn matches_search(record: &AdmissionRecord, search: &str) -> bool {
    let term = search.to_lowercase();
    record.university.to_lowercase().contains(&term)
        || record.major.to_lowercase().contains(&term)
        || record.student_name.to_lowercase().contains(&term)
}

/// Stable filter: the result keeps the relative order of `records`.
pub fn filter_records(records: &[AdmissionRecord], filter: &FilterState) -> Vec<AdmissionRecord> {
    records
        .iter()
        .filter(|record| matches_search(record, &filter.search) && filter.region.matches(&record.region))
        .cloned()
        .collect()
}

pub fn compute_stats(records: &[AdmissionRecord]) -> DashboardStats {
    let mut stats = DashboardStats {
        total_count: records.len(),
        ..DashboardStats::default()
    };

    for record in records {
        match record.status {
            AdmissionStatus::Pass => stats.pass_initial += 1,
            AdmissionStatus::WaitlistPass => stats.pass_waiting += 1,
            AdmissionStatus::Fail => stats.fail_count += 1,
        }
    }

    stats.pass_rate = if stats.total_count > 0 {
        let rate = stats.pass_total() as f64 / stats.total_count as f64 * 100.0;
        round_one_decimal(rate)
    } else {
        0.0
    };

    stats
}

/// Rounds on the exact decimal expansion of `value`, so 0.1499999... stays
/// 0.1 instead of being pushed to a tie by scaling first.
fn round_one_decimal(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

/// One bucket per track. A record whose type names several tracks is
/// counted in each of them.
pub fn compute_chart_series(records: &[AdmissionRecord]) -> ChartSeries {
    TrackCategory::ALL
        .iter()
        .map(|category| {
            let mut bucket = ChartBucket::new(*category);
            for record in records.iter().filter(|r| category.matches(&r.admission_type)) {
                match record.status {
                    AdmissionStatus::Fail => bucket.fail += 1,
                    AdmissionStatus::WaitlistPass => bucket.waitlist_pass += 1,
                    AdmissionStatus::Pass => bucket.pass += 1,
                }
            }
            bucket
        })
        .collect()
}

/// Distinct regions of the whole dataset, sorted, with the "all" option first.
pub fn region_options(records: &[AdmissionRecord]) -> Vec<String> {
    let regions: BTreeSet<&str> = records.iter().map(|r| r.region.as_str()).collect();

    std::iter::once(ALL_REGIONS_LABEL.to_string())
        .chain(regions.into_iter().map(str::to_string))
        .collect()
}

/// The record table only shows the first `limit` rows.
pub fn table_rows(records: &[AdmissionRecord], limit: usize) -> &[AdmissionRecord] {
    &records[..records.len().min(limit)]
}
