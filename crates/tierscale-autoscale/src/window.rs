//! Moving-average window over raw resource-stat rows.
//!
//! The database reports one row per interval. A sample is built from the
//! newest row plus up to `window - 1` rows preceding it; `data_points` is
//! the number of rows that actually contributed, so a freshly resized
//! database reports fewer points than the window until history refills.

use serde::{Deserialize, Serialize};

use tierscale_core::UtilizationSample;

/// One raw utilization row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatRow {
    /// End of the reporting interval (unix seconds).
    pub end_time: u64,
    pub service_objective: String,
    pub avg_cpu_percent: f64,
}

/// Summarize `rows` into a sample for the newest row.
///
/// Returns `None` when there are no rows. Row order in the input does not
/// matter.
pub fn summarize(rows: &[ResourceStatRow], window: u32) -> Option<UtilizationSample> {
    let mut newest_first: Vec<&ResourceStatRow> = rows.iter().collect();
    newest_first.sort_by(|a, b| b.end_time.cmp(&a.end_time));

    let latest = *newest_first.first()?;
    let take = window.max(1) as usize;
    let used = &newest_first[..take.min(newest_first.len())];
    let sum: f64 = used.iter().map(|r| r.avg_cpu_percent).sum();

    Some(UtilizationSample {
        timestamp: latest.end_time,
        service_objective: latest.service_objective.clone(),
        avg_cpu_percent: latest.avg_cpu_percent,
        moving_avg_cpu_percent: sum / used.len() as f64,
        data_points: used.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(end_time: u64, cpu: f64) -> ResourceStatRow {
        ResourceStatRow {
            end_time,
            service_objective: "HS_Gen5_8".to_string(),
            avg_cpu_percent: cpu,
        }
    }

    #[test]
    fn empty_rows_have_no_sample() {
        assert_eq!(summarize(&[], 5), None);
    }

    #[test]
    fn averages_newest_window() {
        let rows = vec![
            row(100, 10.0),
            row(115, 20.0),
            row(130, 30.0),
            row(145, 40.0),
            row(160, 50.0),
        ];
        let sample = summarize(&rows, 3).unwrap();
        assert_eq!(sample.timestamp, 160);
        assert_eq!(sample.avg_cpu_percent, 50.0);
        assert_eq!(sample.moving_avg_cpu_percent, 40.0);
        assert_eq!(sample.data_points, 3);
    }

    #[test]
    fn short_history_reports_fewer_points() {
        let rows = vec![row(100, 80.0), row(115, 90.0)];
        let sample = summarize(&rows, 5).unwrap();
        assert_eq!(sample.data_points, 2);
        assert_eq!(sample.moving_avg_cpu_percent, 85.0);
    }

    #[test]
    fn input_order_does_not_matter() {
        let rows = vec![row(145, 40.0), row(100, 10.0), row(160, 50.0), row(130, 30.0)];
        let sample = summarize(&rows, 2).unwrap();
        assert_eq!(sample.timestamp, 160);
        assert_eq!(sample.moving_avg_cpu_percent, 45.0);
    }

    #[test]
    fn latest_row_supplies_tier_label() {
        let mut rows = vec![row(100, 10.0), row(200, 10.0)];
        rows[1].service_objective = "HS_Gen5_10".to_string();
        let sample = summarize(&rows, 5).unwrap();
        assert_eq!(sample.service_objective, "HS_Gen5_10");
    }

    #[test]
    fn zero_window_uses_latest_row_only() {
        let rows = vec![row(100, 10.0), row(200, 30.0)];
        let sample = summarize(&rows, 0).unwrap();
        assert_eq!(sample.data_points, 1);
        assert_eq!(sample.moving_avg_cpu_percent, 30.0);
    }
}
