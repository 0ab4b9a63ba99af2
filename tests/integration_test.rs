//! Integration tests for the simulation pipeline.
//!
//! Tests cover:
//! - Loading a universe through a mock data port and joining it
//! - End-to-end momentum rotation from cash into a risk-off instrument
//! - Buy-and-hold closed form, dividends and splits over a full run
//! - Determinism of repeated runs
//! - Lookback gaps and insufficient history surfaced as errors
//! - Undefined metrics on degenerate series
//! - Full pipeline via SqliteAdapter with a seeded in-memory database

mod common;

use common::*;
use gemtrader::domain::backtest::run_backtest;
use gemtrader::domain::daily_record::{DateRange, InstrumentId};
use gemtrader::domain::error::{GemtraderError, UndefinedMetric};
use gemtrader::domain::metrics::PerformanceSummary;
use gemtrader::domain::series::load_universe_series;
use gemtrader::domain::strategy::StrategyConfig;
use gemtrader::ports::data_port::DataPort;

fn load(port: &dyn DataPort, config: &StrategyConfig) -> gemtrader::domain::series::UniverseSeries {
    load_universe_series(port, &config.members(), DateRange::unbounded()).unwrap()
}

mod universe_loading {
    use super::*;

    #[test]
    fn inner_join_keeps_common_dates_only() {
        let port = MockDataPort::new()
            .with_records(
                "SPY",
                vec![
                    make_record("SPY", "2024-01-02", "100"),
                    make_record("SPY", "2024-01-03", "101"),
                    make_record("SPY", "2024-01-04", "102"),
                ],
            )
            .with_records(
                "BIL",
                vec![
                    make_record("BIL", "2024-01-03", "91"),
                    make_record("BIL", "2024-01-04", "91.01"),
                    make_record("BIL", "2024-01-05", "91.02"),
                ],
            );

        let series =
            load_universe_series(&port, &["SPY".into(), "BIL".into()], DateRange::unbounded())
                .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(date("2024-01-03")));
        assert_eq!(series.last_date(), Some(date("2024-01-04")));
    }

    #[test]
    fn range_limits_rows() {
        let port = MockDataPort::new().with_records(
            "SPY",
            make_daily_records("SPY", "2024-01-01", &["1", "2", "3", "4", "5"]),
        );
        let series = load_universe_series(
            &port,
            &["SPY".into()],
            DateRange::new(date("2024-01-02"), date("2024-01-04")),
        )
        .unwrap();
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn empty_result_is_data_unavailable() {
        let port = MockDataPort::new();
        let err = load_universe_series(&port, &["SPY".into()], DateRange::unbounded()).unwrap_err();
        assert!(matches!(err, GemtraderError::DataUnavailable { .. }));
    }

    #[test]
    fn port_error_propagates() {
        let port = MockDataPort::new().with_error("SPY", "connection refused");
        let err = load_universe_series(&port, &["SPY".into()], DateRange::unbounded()).unwrap_err();
        assert!(matches!(err, GemtraderError::Database { .. }));
    }

    #[test]
    fn non_positive_close_rejected() {
        let port = MockDataPort::new().with_records(
            "SPY",
            vec![
                make_record("SPY", "2024-01-02", "100"),
                make_record("SPY", "2024-01-03", "0"),
            ],
        );
        let err = load_universe_series(&port, &["SPY".into()], DateRange::unbounded()).unwrap_err();
        match err {
            GemtraderError::InvalidRecord { instrument, date: d, .. } => {
                assert_eq!(instrument, "SPY");
                assert_eq!(d, date("2024-01-03"));
            }
            other => panic!("expected InvalidRecord, got {other}"),
        }
    }
}

mod momentum_rotation {
    use super::*;

    /// Risk-free CASHX against a single risk-off instrument A, one-month
    /// lookback.
    fn scenario_port() -> MockDataPort {
        MockDataPort::new()
            .with_records(
                "CASHX",
                vec![
                    make_record("CASHX", "2024-01-02", "10"),
                    make_record("CASHX", "2024-02-02", "10.1"),
                    make_record("CASHX", "2024-02-05", "10.1"),
                    make_record("CASHX", "2024-03-04", "10.1"),
                    make_record("CASHX", "2024-03-05", "10.1"),
                ],
            )
            .with_records(
                "A",
                vec![
                    make_record("A", "2024-01-02", "100"),
                    make_record("A", "2024-02-02", "99"),
                    make_record("A", "2024-02-05", "99"),
                    make_record("A", "2024-03-04", "100"),
                    make_record("A", "2024-03-05", "110"),
                ],
            )
    }

    fn scenario_config() -> StrategyConfig {
        gem(&[], &["A"], "CASHX", 1, "1000")
    }

    #[test]
    fn cash_then_risk_off_switch() {
        let config = scenario_config();
        let series = load(&scenario_port(), &config);
        let result = run_backtest(&series, &config).unwrap();

        // 2024-02-02: CASHX +1 %, A −1 % → cash, nothing held, no switch
        // 2024-03-04: A +1.01 % against a flat CASHX → 1000 / 100 = 10 shares
        let values: Vec<_> = result.valuations.iter().map(|v| v.value).collect();
        assert_eq!(
            values,
            vec![
                decimal("1000"),
                decimal("1000"),
                decimal("1000"),
                decimal("1000"),
                decimal("1100"),
            ]
        );

        assert_eq!(result.switches.len(), 1);
        let switch = &result.switches[0];
        assert_eq!(switch.date, date("2024-03-04"));
        assert_eq!(switch.from, None);
        assert_eq!(switch.to, Some(InstrumentId::new("A")));
        assert_eq!(switch.shares, 10);
        assert_eq!(switch.price, Some(decimal("100")));

        assert_eq!(result.final_state.shares, 10);
        assert_eq!(result.final_state.cash, decimal("0"));
        assert_eq!(result.ending_value(), decimal("1100"));
    }

    #[test]
    fn valuations_follow_series_order() {
        let config = scenario_config();
        let series = load(&scenario_port(), &config);
        let result = run_backtest(&series, &config).unwrap();

        let dates: Vec<_> = result.valuations.iter().map(|v| v.date).collect();
        let series_dates: Vec<_> = series.rows().iter().map(|r| r.date).collect();
        assert_eq!(dates, series_dates);
    }

    #[test]
    fn scenario_metrics() {
        let config = scenario_config();
        let series = load(&scenario_port(), &config);
        let result = run_backtest(&series, &config).unwrap();
        let summary = PerformanceSummary::compute(&result);

        assert_eq!(result.first_effective_date, date("2024-02-02"));
        // 32 days / 365.2425
        assert_eq!(summary.simulation_years, decimal("0.09"));
        assert_eq!(summary.ending_value, decimal("1100"));
        assert!(summary.cagr.is_ok());
        // month ends 1000, 1000, 1100 → returns 0 %, 10 %
        approx::assert_relative_eq!(
            summary.annualized_std_dev.unwrap(),
            24.494_897,
            epsilon = 1e-4
        );
    }

    #[test]
    fn held_leader_is_not_traded_again() {
        // 160 consecutive days from 2024-01-01: A climbs by 1 a day, CASHX flat
        let closes_a: Vec<String> = (0..160).map(|i| (100 + i).to_string()).collect();
        let closes_a: Vec<&str> = closes_a.iter().map(String::as_str).collect();
        let port = MockDataPort::new()
            .with_records("A", make_daily_records("A", "2024-01-01", &closes_a))
            .with_records("CASHX", make_daily_records("CASHX", "2024-01-01", &["10"; 160]));
        let config = scenario_config();
        let series = load(&port, &config);
        let result = run_backtest(&series, &config).unwrap();

        // bought once on the first anchor; the March to June anchors keep A
        assert_eq!(result.switches.len(), 1);
        assert_eq!(result.switches[0].date, date("2024-02-01"));
        // 1000 / 131 → 7 shares, 83 cash; last close 259
        assert_eq!(result.final_state.shares, 7);
        assert_eq!(result.final_state.cash, decimal("83"));
        assert_eq!(result.ending_value(), decimal("1896"));
    }

    #[test]
    fn rotation_into_risk_on_when_cash_dominates() {
        let port = MockDataPort::new()
            .with_records(
                "SPY",
                vec![
                    make_record("SPY", "2024-01-02", "100"),
                    make_record("SPY", "2024-02-02", "120"),
                ],
            )
            .with_records(
                "VEU",
                vec![
                    make_record("VEU", "2024-01-02", "50"),
                    make_record("VEU", "2024-02-02", "45"),
                ],
            )
            .with_records(
                "BIL",
                vec![
                    make_record("BIL", "2024-01-02", "90"),
                    make_record("BIL", "2024-02-02", "91"),
                ],
            );
        let config = gem(&["SPY"], &["VEU"], "BIL", 1, "1000");
        let series = load(&port, &config);
        let result = run_backtest(&series, &config).unwrap();

        // BIL +1.1 % beats VEU −10 % → first risk-on instrument
        assert_eq!(result.final_state.held, Some(InstrumentId::new("SPY")));
        assert_eq!(result.final_state.shares, 8);
        assert_eq!(result.final_state.cash, decimal("40"));
    }

    #[test]
    fn lookback_gap_is_fatal() {
        let port = MockDataPort::new()
            .with_records(
                "A",
                vec![
                    make_record("A", "2024-01-02", "100"),
                    make_record("A", "2024-01-03", "100"),
                    make_record("A", "2024-03-10", "100"),
                ],
            )
            .with_records(
                "CASHX",
                vec![
                    make_record("CASHX", "2024-01-02", "10"),
                    make_record("CASHX", "2024-01-03", "10"),
                    make_record("CASHX", "2024-03-10", "10"),
                ],
            );
        let config = gem(&[], &["A"], "CASHX", 2, "1000");
        let series = load(&port, &config);

        // decision on 2024-03-10 looks back to 2024-01-10; nothing until March
        let err = run_backtest(&series, &config).unwrap_err();
        match err {
            GemtraderError::LookbackGap { from, days, .. } => {
                assert_eq!(from, date("2024-01-10"));
                assert_eq!(days, 30);
            }
            other => panic!("expected LookbackGap, got {other}"),
        }
    }

    #[test]
    fn series_shorter_than_lookback() {
        let port = MockDataPort::new()
            .with_records("A", make_daily_records("A", "2024-01-02", &["1", "2"]))
            .with_records("CASHX", make_daily_records("CASHX", "2024-01-02", &["1", "1"]));
        let config = gem(&[], &["A"], "CASHX", 12, "1000");
        let series = load(&port, &config);
        let err = run_backtest(&series, &config).unwrap_err();
        assert!(matches!(err, GemtraderError::InsufficientData { .. }));
    }
}

mod buy_and_hold {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    #[test]
    fn split_then_dividend_over_a_run() {
        let port = MockDataPort::new().with_records(
            "SPY",
            vec![
                make_record("SPY", "2024-01-02", "100"),
                make_action_record("SPY", "2024-01-03", "50", "0", "2"),
                make_action_record("SPY", "2024-01-04", "50", "2.5", "1"),
            ],
        );
        let config = buy_and_hold("SPY", "1000", true);
        let series = load(&port, &config);
        let result = run_backtest(&series, &config).unwrap();

        // 10 shares → split → 20 → dividend 50 buys one more share at 50
        assert_eq!(result.final_state.shares, 21);
        assert_eq!(result.final_state.cash, decimal("0"));
        assert_eq!(result.ending_value(), decimal("1050"));
    }

    #[test]
    fn dividends_accumulate_as_cash_without_reinvestment() {
        let port = MockDataPort::new().with_records(
            "SPY",
            vec![
                make_record("SPY", "2024-01-02", "100"),
                make_action_record("SPY", "2024-01-03", "100", "2.5", "1"),
            ],
        );
        let config = buy_and_hold("SPY", "1000", false);
        let series = load(&port, &config);
        let result = run_backtest(&series, &config).unwrap();

        assert_eq!(result.final_state.shares, 10);
        assert_eq!(result.final_state.cash, decimal("25"));
        assert_eq!(result.ending_value(), decimal("1025"));
    }

    #[test]
    fn single_day_metrics_are_undefined() {
        let port = MockDataPort::new()
            .with_records("SPY", vec![make_record("SPY", "2024-01-02", "100")]);
        let config = buy_and_hold("SPY", "1000", false);
        let series = load(&port, &config);
        let summary = PerformanceSummary::compute(&run_backtest(&series, &config).unwrap());

        assert_eq!(summary.simulation_years, Decimal::ZERO);
        assert!(matches!(
            summary.cagr,
            Err(UndefinedMetric::ZeroSimulationPeriod { .. })
        ));
        assert!(matches!(
            summary.annualized_std_dev,
            Err(UndefinedMetric::InsufficientMonthlySamples { have: 0, .. })
        ));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let closes: Vec<String> = (0..400).map(|i| format!("{}.{:02}", 100 + i % 37, i % 100)).collect();
        let closes: Vec<&str> = closes.iter().map(String::as_str).collect();
        let port =
            MockDataPort::new().with_records("SPY", make_daily_records("SPY", "2023-01-01", &closes));
        let config = buy_and_hold("SPY", "10000", true);

        let first = run_backtest(&load(&port, &config), &config).unwrap();
        let second = run_backtest(&load(&port, &config), &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            PerformanceSummary::compute(&first),
            PerformanceSummary::compute(&second)
        );
    }

    proptest! {
        #[test]
        fn ending_value_has_closed_form(
            initial_cents in 100_000i64..10_000_000,
            closes_cents in prop::collection::vec(100i64..100_000, 1..60),
        ) {
            let initial = Decimal::new(initial_cents, 2);
            let closes: Vec<String> = closes_cents
                .iter()
                .map(|c| Decimal::new(*c, 2).to_string())
                .collect();
            let closes: Vec<&str> = closes.iter().map(String::as_str).collect();
            let port = MockDataPort::new()
                .with_records("SPY", make_daily_records("SPY", "2024-01-01", &closes));
            let config = buy_and_hold("SPY", &initial.to_string(), false);

            let result = run_backtest(&load(&port, &config), &config).unwrap();

            let first_close = Decimal::new(closes_cents[0], 2);
            let last_close = Decimal::new(*closes_cents.last().unwrap(), 2);
            let shares = (initial / first_close).trunc();
            let leftover = initial - shares * first_close;
            prop_assert_eq!(result.ending_value(), shares * last_close + leftover);
        }
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_pipeline {
    use super::*;
    use gemtrader::adapters::sqlite_adapter::SqliteAdapter;
    use gemtrader::domain::daily_record::DailyRecord;

    fn seeded_store(records: &[DailyRecord]) -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter.insert_records(records).unwrap();
        adapter
    }

    #[test]
    fn sqlite_and_mock_ports_agree() {
        let a = vec![
            make_record("A", "2024-01-02", "100"),
            make_record("A", "2024-02-02", "99"),
            make_record("A", "2024-02-05", "99"),
            make_record("A", "2024-03-04", "100"),
            make_action_record("A", "2024-03-05", "110", "1.1", "1"),
        ];
        let cash = vec![
            make_record("CASHX", "2024-01-02", "10"),
            make_record("CASHX", "2024-02-02", "10.1"),
            make_record("CASHX", "2024-02-05", "10.1"),
            make_record("CASHX", "2024-03-04", "10.1"),
            make_record("CASHX", "2024-03-05", "10.1"),
        ];
        let mut all = a.clone();
        all.extend(cash.clone());

        let store = seeded_store(&all);
        let mock = MockDataPort::new()
            .with_records("A", a)
            .with_records("CASHX", cash);
        let config = gem(&[], &["A"], "CASHX", 1, "1000");

        let from_sqlite = run_backtest(&load(&store, &config), &config).unwrap();
        let from_mock = run_backtest(&load(&mock, &config), &config).unwrap();
        assert_eq!(from_sqlite, from_mock);
        // 10 shares × 1.10 dividend = 11 → no whole share at 110, kept as cash
        assert_eq!(from_sqlite.final_state.cash, decimal("11"));
        assert_eq!(from_sqlite.ending_value(), decimal("1111"));
    }
}
