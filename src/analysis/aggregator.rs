//! Aggregations over the parsed datasets.
//!
//! Each derived view is a pure function of the records, so the three can
//! be computed in any order.

use crate::models::{BestYear, CombinedRow, PopulationRecord, PopulationStats, TimeSeriesRecord};
use std::collections::{BTreeMap, HashMap};

/// Mean and sample standard deviation of population for years in
/// `[start, end]`.
pub fn population_stats(records: &[PopulationRecord], start: i32, end: i32) -> PopulationStats {
    let values: Vec<f64> = records
        .iter()
        .filter(|r| (start..=end).contains(&r.year))
        .map(|r| r.population)
        .collect();

    let count = values.len();
    if count == 0 {
        return PopulationStats {
            count,
            mean: None,
            std: None,
        };
    }

    let mean = values.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    });

    PopulationStats {
        count,
        mean: Some(mean),
        std,
    }
}

/// Sum of `value` per (`series_id`, `year`).
pub fn sum_by_series_year(records: &[TimeSeriesRecord]) -> BTreeMap<(String, i32), f64> {
    let mut sums: BTreeMap<(String, i32), f64> = BTreeMap::new();

    for record in records {
        *sums
            .entry((record.series_id.clone(), record.year))
            .or_default() += record.value;
    }

    sums
}

/// For every series, the year whose summed value is largest.
///
/// Years are visited in ascending order and only a strictly larger sum
/// replaces the current best, so ties resolve to the earliest year.
pub fn best_years(records: &[TimeSeriesRecord]) -> BTreeMap<String, BestYear> {
    let mut best: BTreeMap<String, BestYear> = BTreeMap::new();

    for ((series_id, year), value) in sum_by_series_year(records) {
        match best.get_mut(&series_id) {
            Some(current) if value > current.value => *current = BestYear { year, value },
            Some(_) => {}
            None => {
                best.insert(series_id, BestYear { year, value });
            }
        }
    }

    best
}

/// Rows of one series and period, left-joined with population by year.
///
/// Output follows input order. A year present more than once in the
/// population table yields one row per match.
pub fn combined_report(
    records: &[TimeSeriesRecord],
    population: &[PopulationRecord],
    series_id: &str,
    period: &str,
) -> Vec<CombinedRow> {
    let mut by_year: HashMap<i32, Vec<f64>> = HashMap::new();
    for p in population {
        by_year.entry(p.year).or_default().push(p.population);
    }

    let mut rows = Vec::new();
    for record in records
        .iter()
        .filter(|r| r.series_id == series_id && r.period == period)
    {
        let row = |population| CombinedRow {
            series_id: record.series_id.clone(),
            year: record.year,
            period: record.period.clone(),
            value: record.value,
            population,
        };

        match by_year.get(&record.year) {
            Some(matches) => rows.extend(matches.iter().map(|p| row(Some(*p)))),
            None => rows.push(row(None)),
        }
    }

    rows
}

/// Number of distinct series in the time series.
pub fn distinct_series(records: &[TimeSeriesRecord]) -> usize {
    let mut ids: Vec<&str> = records.iter().map(|r| r.series_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pop(year: i32, population: f64) -> PopulationRecord {
        PopulationRecord { year, population }
    }

    fn ts(series_id: &str, year: i32, period: &str, value: f64) -> TimeSeriesRecord {
        TimeSeriesRecord::new(series_id, year, period, value)
    }

    #[test]
    fn test_population_stats_window_excludes_outside_years() {
        let stats = population_stats(&[pop(2012, 100.0), pop(2015, 200.0)], 2013, 2018);

        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, Some(200.0));
        assert_eq!(stats.std, None);
    }

    #[test]
    fn test_population_stats_sample_std() {
        let records = [pop(2013, 2.0), pop(2014, 4.0), pop(2015, 4.0), pop(2016, 4.0),
            pop(2017, 5.0), pop(2018, 5.0), pop(2019, 7.0), pop(2020, 9.0)];
        let stats = population_stats(&records, 2013, 2020);

        assert_eq!(stats.count, 8);
        assert_eq!(stats.mean, Some(5.0));
        let std = stats.std.unwrap();
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_population_stats_window_bounds_inclusive() {
        let records = [pop(2013, 10.0), pop(2018, 30.0)];
        let stats = population_stats(&records, 2013, 2018);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, Some(20.0));
    }

    #[test]
    fn test_population_stats_moving_year_out_of_window() {
        let inside = population_stats(&[pop(2014, 100.0), pop(2016, 300.0)], 2013, 2018);
        let outside = population_stats(&[pop(2014, 100.0), pop(2019, 300.0)], 2013, 2018);

        assert_eq!(inside.mean, Some(200.0));
        assert_eq!(outside.mean, Some(100.0));
    }

    #[test]
    fn test_population_stats_empty_window() {
        let stats = population_stats(&[pop(2000, 1.0)], 2013, 2018);
        assert_eq!(
            stats,
            PopulationStats {
                count: 0,
                mean: None,
                std: None
            }
        );
    }

    #[test]
    fn test_best_years_picks_max_sum() {
        let records = [ts("S1", 2020, "Q01", 5.0), ts("S1", 2021, "Q01", 10.0)];
        let best = best_years(&records);

        assert_eq!(best.len(), 1);
        assert_eq!(best["S1"], BestYear { year: 2021, value: 10.0 });
    }

    #[test]
    fn test_best_years_sums_periods() {
        let records = [
            ts("S1", 2020, "Q01", 4.0),
            ts("S1", 2020, "Q02", 4.0),
            ts("S1", 2021, "Q01", 7.0),
            ts("S2", 2019, "Q01", -1.0),
            ts("S2", 2020, "Q01", -3.0),
        ];
        let best = best_years(&records);

        assert_eq!(best["S1"], BestYear { year: 2020, value: 8.0 });
        assert_eq!(best["S2"], BestYear { year: 2019, value: -1.0 });
    }

    #[test]
    fn test_best_years_tie_picks_earliest_year() {
        let records = [
            ts("S1", 2022, "Q01", 3.0),
            ts("S1", 2018, "Q01", 3.0),
            ts("S1", 2020, "Q01", 3.0),
        ];
        assert_eq!(best_years(&records)["S1"].year, 2018);
    }

    #[test]
    fn test_best_years_one_entry_per_series() {
        let records = [
            ts("A", 2000, "Q01", 1.0),
            ts("B", 2000, "Q01", 1.0),
            ts("A", 2001, "Q02", 1.0),
            ts("C", 2002, "Q03", 1.0),
            ts("B", 2003, "Q04", 1.0),
        ];
        assert_eq!(best_years(&records).len(), distinct_series(&records));
        assert_eq!(distinct_series(&records), 3);
    }

    #[test]
    fn test_combined_report_filters_and_joins() {
        let records = [
            ts("PRS30006032", 2015, "Q01", 1.5),
            ts("PRS30006032", 2015, "Q02", 9.9),
            ts("PRS30006011", 2015, "Q01", 9.9),
            ts("PRS30006032", 2016, "Q01", -0.5),
        ];
        let population = [pop(2015, 321.0)];

        let report = combined_report(&records, &population, "PRS30006032", "Q01");

        assert_eq!(report.len(), 2);
        assert!(report
            .iter()
            .all(|r| r.series_id == "PRS30006032" && r.period == "Q01"));
        assert_eq!(report[0].population, Some(321.0));
        assert_eq!(report[1].year, 2016);
        assert_eq!(report[1].population, None);
    }

    #[test]
    fn test_combined_report_duplicate_population_years() {
        let records = [ts("S", 2015, "Q01", 1.0)];
        let population = [pop(2015, 1.0), pop(2015, 2.0)];

        let report = combined_report(&records, &population, "S", "Q01");

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].population, Some(1.0));
        assert_eq!(report[1].population, Some(2.0));
    }

    #[test]
    fn test_combined_report_no_matches() {
        let records = [ts("S", 2015, "Q02", 1.0)];
        assert!(combined_report(&records, &[], "S", "Q01").is_empty());
    }
}
