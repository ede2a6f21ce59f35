//! End-to-end properties of the signal, filter, simulation, metrics,
//! grid-search and walk-forward pipeline, driven through a mock data port.

mod common;

use approx::assert_relative_eq;
use common::*;
use macross::domain::error::MacrossError;
use macross::domain::metrics::PerformanceMetrics;
use macross::domain::optimizer::{OptimizerSettings, evaluate_pair, grid_search};
use macross::domain::params::{ParameterGrid, ParameterPair};
use macross::domain::portfolio::simulate;
use macross::domain::position_filter::HoldingPeriodFilter;
use macross::domain::signal::{SignalRecord, generate_signals};
use macross::domain::walkforward::{WalkForwardConfig, walk_forward};
use macross::ports::data_port::DataPort;

fn pair(short: usize, long: usize) -> ParameterPair {
    ParameterPair::new(short, long).unwrap()
}

mod signal_pipeline {
    use super::*;

    #[test]
    fn constant_series_never_crosses() {
        let series = constant_series(60, 100.0);
        let signals = generate_signals(&series, pair(3, 10)).unwrap();

        assert_eq!(signals.len(), 60);
        for r in &signals {
            assert_relative_eq!(r.short_mavg, 100.0);
            assert_relative_eq!(r.long_mavg, 100.0);
            assert_eq!(r.position_delta, 0);
        }
        let metrics = evaluate_pair(&series, pair(3, 10), &OptimizerSettings::default()).unwrap();
        assert_eq!(metrics.overall_performance, Some(0.0));
    }

    #[test]
    fn uptrend_enters_once_and_never_exits() {
        let series = linear_series(100, 100.0, 1.0);
        let signals = generate_signals(&series, pair(3, 10)).unwrap();

        let entries: Vec<usize> = signals
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_entry())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(entries, vec![3]);
        assert!(!signals.iter().any(SignalRecord::is_exit));

        let states = simulate(&series, &signals, 4).unwrap();
        assert_relative_eq!(states[0].total, 400.0);
        assert_relative_eq!(states[3].shares, 4.0);
        assert_relative_eq!(states[3].total, 400.0);
        for w in states[4..].windows(2) {
            assert!(w[1].total >= w[0].total);
        }

        let metrics = PerformanceMetrics::compute(&states, 10).unwrap();
        assert_relative_eq!(metrics.overall_performance.unwrap(), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn mock_port_feeds_the_pipeline() {
        let port = MockDataPort::new(points_from_closes(&[10.0, 11.0, 12.0, 11.0, 10.0, 9.0]));
        let series = port.fetch_series(Some(date(2020, 1, 2)), None).unwrap();
        assert_eq!(series.len(), 5);

        let metrics = evaluate_pair(&series, pair(1, 2), &OptimizerSettings::default()).unwrap();
        assert_eq!(metrics.trade_count, 4);
        assert_eq!(metrics.long_window, 2);
    }

    #[test]
    fn failing_port_surfaces_data_error() {
        let port = MockDataPort::failing("feed offline");
        assert!(matches!(
            port.fetch_series(None, None),
            Err(MacrossError::Data { reason }) if reason == "feed offline"
        ));
    }

    #[test]
    fn empty_range_is_rejected_downstream() {
        let port = MockDataPort::new(points_from_closes(&[10.0, 11.0]));
        let series = port.fetch_series(Some(date(2021, 1, 1)), None).unwrap();
        assert!(matches!(
            generate_signals(&series, pair(1, 2)),
            Err(MacrossError::EmptySeries)
        ));
    }
}

mod holding_filter {
    use super::*;

    fn entry_then_exit(exit_day: usize) -> (macross::domain::price::TimeSeries, Vec<SignalRecord>) {
        let series = constant_series(40, 100.0);
        let records = series
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| SignalRecord {
                date: p.date,
                short_mavg: 100.0,
                long_mavg: 100.0,
                signal: 0,
                position_delta: match i {
                    0 => 1,
                    d if d == exit_day => -1,
                    _ => 0,
                },
            })
            .collect();
        (series, records)
    }

    fn exit_kept(exit_day: usize) -> bool {
        let (series, records) = entry_then_exit(exit_day);
        let revised = HoldingPeriodFilter::default().apply(&series, &records).unwrap();
        assert_eq!(revised[0].position_delta, 1);
        revised[exit_day].position_delta == -1
    }

    #[test]
    fn six_day_exit_cancelled() {
        assert!(!exit_kept(6));
    }

    #[test]
    fn fifteen_day_exit_kept() {
        assert!(exit_kept(15));
    }

    #[test]
    fn thirty_two_day_exit_cancelled() {
        assert!(!exit_kept(32));
    }

    #[test]
    fn filter_changes_grid_outcome_only_through_exits() {
        let series = wave_series(120, 100.0, 10.0, 20.0);
        let filtered = OptimizerSettings {
            filter: Some(HoldingPeriodFilter::default()),
            ..OptimizerSettings::default()
        };
        let plain = generate_signals(&series, pair(2, 6)).unwrap();
        let revised = HoldingPeriodFilter::default().apply(&series, &plain).unwrap();
        for (a, b) in plain.iter().zip(&revised) {
            if a.position_delta != -1 {
                assert_eq!(a.position_delta, b.position_delta);
            }
        }
        assert!(evaluate_pair(&series, pair(2, 6), &filtered).is_ok());
    }
}

mod grid {
    use super::*;

    #[test]
    fn matches_brute_force() {
        let series = wave_series(150, 100.0, 8.0, 25.0);
        let grid = ParameterGrid::new(vec![3, 5], vec![10, 20]);
        let settings = OptimizerSettings::default();

        let result = grid_search(&series, &grid, &settings).unwrap().unwrap();

        let mut expected: Option<(ParameterPair, f64)> = None;
        for short in [3, 5] {
            for long in [10, 20] {
                let p = pair(short, long);
                let perf = evaluate_pair(&series, p, &settings)
                    .unwrap()
                    .overall_performance
                    .unwrap();
                if expected.is_none_or(|(_, best)| perf > best) {
                    expected = Some((p, perf));
                }
            }
        }
        let (best, best_perf) = expected.unwrap();
        assert_eq!(result.best, best);
        assert_eq!(result.best_performance, best_perf);
        assert_eq!(result.results.len(), 4);
    }

    #[test]
    fn ties_resolve_to_first_canonical_pair() {
        let series = constant_series(30, 50.0);
        let grid = ParameterGrid::new(vec![5, 3], vec![20, 10]);
        let result = grid_search(&series, &grid, &OptimizerSettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(result.best, pair(3, 10));
        assert_eq!(result.best_performance, 0.0);
    }

    #[test]
    fn grid_without_valid_pairs_yields_none() {
        let series = constant_series(30, 50.0);
        let grid = ParameterGrid::new(vec![10], vec![5]);
        assert!(
            grid_search(&series, &grid, &OptimizerSettings::default())
                .unwrap()
                .is_none()
        );
    }
}

mod walk_forward_validation {
    use super::*;

    #[test]
    fn eighty_points_four_windows() {
        let series = wave_series(80, 100.0, 6.0, 15.0);
        let config = WalkForwardConfig {
            num_windows: 4,
            grid: ParameterGrid::new(vec![2, 3], vec![5, 8]),
            settings: OptimizerSettings::default(),
        };
        let report = walk_forward(&series, &config).unwrap();

        assert_eq!(report.window_size, 20);
        assert_eq!(report.segments.len(), 3);
        for (i, step) in report.segments.iter().enumerate() {
            assert_eq!(step.in_sample.points, 20);
            assert_eq!(step.out_of_sample.points, 20);
            assert!(step.in_sample.end < step.out_of_sample.start);
            assert_eq!(step.in_sample.start, series.points()[i * 20].date);
        }

        let mean = report
            .segments
            .iter()
            .map(|s| s.metrics.overall_performance.unwrap())
            .sum::<f64>()
            / 3.0;
        assert_relative_eq!(report.average_performance.unwrap(), mean, epsilon = 1e-12);
        assert_eq!(report.latest_pair, report.segments[2].pair);
    }

    #[test]
    fn out_of_sample_uses_in_sample_pair() {
        let series = wave_series(60, 100.0, 6.0, 12.0);
        let config = WalkForwardConfig {
            num_windows: 3,
            grid: ParameterGrid::new(vec![2, 3], vec![5, 8]),
            settings: OptimizerSettings::default(),
        };
        let report = walk_forward(&series, &config).unwrap();
        for step in &report.segments {
            let oos = series.slice((step.index + 1) * 20, (step.index + 2) * 20);
            let expected = evaluate_pair(&oos, step.pair, &config.settings).unwrap();
            assert_eq!(step.metrics, expected);
        }
    }

    #[test]
    fn too_few_points_is_insufficient() {
        let series = constant_series(3, 100.0);
        let config = WalkForwardConfig {
            num_windows: 4,
            grid: ParameterGrid::new(vec![2], vec![5]),
            settings: OptimizerSettings::default(),
        };
        assert!(matches!(
            walk_forward(&series, &config),
            Err(MacrossError::InsufficientWindows { .. })
        ));
    }

    #[test]
    fn live_signals_come_from_latest_pair() {
        let series = linear_series(40, 100.0, 1.0);
        let config = WalkForwardConfig {
            num_windows: 2,
            grid: ParameterGrid::new(vec![2], vec![5]),
            settings: OptimizerSettings::default(),
        };
        let report = walk_forward(&series, &config).unwrap();
        let prediction = linear_series(10, 200.0, 1.0);
        let dates = report.live_signals(&prediction).unwrap();
        assert_eq!(dates.len(), 8);
        assert_eq!(dates[0], prediction.points()[2].date);
    }
}

mod metrics {
    use super::*;

    #[test]
    fn zero_trade_sequence() {
        let metrics = PerformanceMetrics::compute(&[], 10);
        assert!(matches!(metrics, Err(MacrossError::EmptySeries)));

        let series = constant_series(1, 100.0);
        let signals = generate_signals(&series, pair(1, 2)).unwrap();
        let states = simulate(&series, &signals, 4).unwrap();
        let metrics = PerformanceMetrics::compute(&states, 2).unwrap();
        assert_eq!(metrics.trade_count, 0);
        assert_eq!(metrics.positive_trades, 0);
        assert_eq!(metrics.negative_trades, 0);
        assert_eq!(metrics.total_profit, 0.0);
        assert_eq!(metrics.total_loss, 0.0);
        assert_eq!(metrics.average_positive_return, None);
        assert_eq!(metrics.average_negative_return, None);
    }
}
