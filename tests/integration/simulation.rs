//! End-to-end simulation tests.
//!
//! Drives payouts from a mock source or a SQLite JRDB table through the
//! loader, cache, evaluator and report.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;

use paddock::backtest::{self, report::SimulationReport};
use paddock::config::SourceConfig;
use paddock::engine::evaluator::BetEvaluator;
use paddock::engine::loader::{LoadOptions, PayoutLoader, TableOrigin};
use paddock::payout::PayoutTable;
use paddock::source::{self, jrdb, SourceKind};
use paddock::storage::{FileCache, PayoutCache};
use paddock::types::{BetOrder, BetType, SimError, Wager};

use crate::mock_source::MockSource;

fn temp_path(name: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("paddock_it_{name}_{}.{ext}", uuid::Uuid::new_v4()))
}

fn load_from(source: &MockSource, cache: Option<FileCache>, no_cache: bool) -> paddock::types::Result<(PayoutTable, TableOrigin)> {
    let mut loader = PayoutLoader::new(Box::new(source.clone())).with_options(LoadOptions {
        no_cache,
        ..LoadOptions::default()
    });
    if let Some(cache) = cache {
        loader = loader.with_cache(Box::new(cache));
    }
    let loaded = tokio_test::block_on(loader.load())?;
    Ok((loaded.table, loaded.origin))
}

#[test]
fn test_documented_scenarios() {
    let (table, _) = load_from(&MockSource::new(), None, false).unwrap();
    let evaluator = BetEvaluator::new(table);

    let orders = vec![BetOrder::new("R1")
        .with_wager(Wager::new(BetType::Win, vec![5], dec!(1000)))
        .with_wager(Wager::new(BetType::Win, vec![9], dec!(1000)))
        .with_wager(Wager::new(BetType::Quinella, vec![3, 7], dec!(200)))];
    let results = evaluator.evaluate(&orders).unwrap();

    assert_eq!(results[0].combination.as_str(), "05");
    assert_eq!(results[0].payout, dec!(2500));
    assert_eq!(results[0].net, dec!(1500));

    assert_eq!(results[1].payout, Decimal::ZERO);
    assert_eq!(results[1].net, dec!(-1000));

    assert_eq!(results[2].combination.as_str(), "0307");
    assert_eq!(results[2].payout, dec!(2400));
}

#[test]
fn test_every_bet_type_hits() {
    let (table, _) = load_from(&MockSource::new(), None, false).unwrap();
    let evaluator = BetEvaluator::new(table);

    let order = BetOrder::new("R1")
        .with_wager(Wager::new(BetType::Place, vec![7], dec!(100)))
        .with_wager(Wager::new(BetType::Exacta, vec![5, 3], dec!(100)))
        .with_wager(Wager::new(BetType::Wide, vec![5, 7], dec!(100)))
        .with_wager(Wager::new(BetType::Trio, vec![3, 5, 7], dec!(100)))
        .with_wager(Wager::new(BetType::Trifecta, vec![5, 3, 7], dec!(100)));
    let results = evaluator.evaluate(&[order]).unwrap();
    let payouts: Vec<_> = results.iter().map(|r| r.payout).collect();
    assert_eq!(
        payouts,
        vec![dec!(450), dec!(1870), dec!(1010), dec!(3320), dec!(12840)]
    );
}

#[test]
fn test_file_cache_serves_second_load() {
    let source = MockSource::new();
    let cache_path = temp_path("cache", "json");

    let (first, origin) = load_from(&source, Some(FileCache::new(&cache_path)), false).unwrap();
    assert_eq!(origin, TableOrigin::Source);
    assert_eq!(source.fetch_count(), 1);

    let (second, origin) = load_from(&source, Some(FileCache::new(&cache_path)), false).unwrap();
    assert_eq!(origin, TableOrigin::Cache);
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(first, second);

    let (third, origin) = load_from(&source, Some(FileCache::new(&cache_path)), true).unwrap();
    assert_eq!(origin, TableOrigin::Source);
    assert_eq!(source.fetch_count(), 2);
    assert_eq!(first, third);

    FileCache::new(&cache_path).clear().unwrap();
}

#[test]
fn test_corrupt_cache_falls_back_to_source() {
    let source = MockSource::new();
    let cache_path = temp_path("corrupt", "json");
    std::fs::write(&cache_path, "{ not json").unwrap();

    let (table, origin) = load_from(&source, Some(FileCache::new(&cache_path)), false).unwrap();
    assert_eq!(origin, TableOrigin::Source);
    assert_eq!(table.race_count(), 2);

    // The rebuilt table replaced the corrupt file.
    let cached = FileCache::new(&cache_path).get().unwrap().unwrap();
    assert_eq!(cached, table);

    FileCache::new(&cache_path).clear().unwrap();
}

#[test]
fn test_source_failure_leaves_no_cache() {
    let source = MockSource::new();
    source.set_error("missing column trio_payout_1");
    let cache_path = temp_path("failed", "json");

    let result = load_from(&source, Some(FileCache::new(&cache_path)), false);
    assert!(matches!(result, Err(SimError::SourceSchema { .. })));
    assert!(!cache_path.exists());
}

#[test]
fn test_report_over_mock_races() {
    let (table, _) = load_from(&MockSource::with_races(Vec::new()), None, false).unwrap();
    assert!(table.is_empty());

    let (table, _) = load_from(&MockSource::new(), None, false).unwrap();
    let evaluator = BetEvaluator::new(table);
    let orders = vec![
        BetOrder::new("R1").with_wager(Wager::new(BetType::Win, vec![5], dec!(100))),
        BetOrder::new("R2")
            .with_wager(Wager::new(BetType::Win, vec![2], dec!(100)))
            .with_wager(Wager::new(BetType::Quinella, vec![2, 11], dec!(100))),
    ];
    let outcome = backtest::run(&evaluator, &orders).unwrap();
    let report: &SimulationReport = &outcome.report;

    assert_eq!(report.races, 2);
    assert_eq!(report.overall.hits, 2);
    assert_eq!(report.overall.stake, dec!(300));
    assert_eq!(report.overall.payout, dec!(9080));
    assert_eq!(report.best_payout, dec!(8830));
    assert_eq!(report.by_bet_type[&BetType::Win].net, dec!(50));
}

#[tokio::test]
async fn test_jrdb_sqlite_end_to_end() {
    let db_path = temp_path("jrdb", "sqlite");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());

    // Seed a JRDB-shaped table.
    {
        let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
        let columns: Vec<String> = jrdb::expected_columns()
            .into_iter()
            .map(|c| format!("{c} INTEGER"))
            .collect();
        let create = format!(
            "CREATE TABLE {} (race_key TEXT PRIMARY KEY, {})",
            jrdb::DEFAULT_TABLE,
            columns.join(", ")
        );
        sqlx::query(&create).execute(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO d_jrdb_HJC \
             (race_key, win_1, win_payout_1, trio_1_1, trio_1_2, trio_1_3, trio_payout_1) \
             VALUES ('0501110101', 5, 250, 7, 3, 5, 3320)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;
    }

    let env_name = format!("PADDOCK_IT_DB_{}", uuid::Uuid::new_v4().simple());
    std::env::set_var(&env_name, &url);
    let cfg = SourceConfig {
        kind: SourceKind::Jrdb,
        database_url_env: env_name,
        table: jrdb::DEFAULT_TABLE.to_string(),
    };

    let loaded = PayoutLoader::new(source::open(&cfg).unwrap())
        .load()
        .await
        .unwrap();
    assert_eq!(loaded.table.len(), 2);

    let evaluator = BetEvaluator::new(loaded.table);
    let orders = vec![BetOrder::new("0501110101")
        .with_wager(Wager::new(BetType::Trio, vec![5, 7, 3], dec!(100)))];
    let results = evaluator.evaluate(&orders).unwrap();
    assert_eq!(results[0].combination.as_str(), "030507");
    assert_eq!(results[0].payout, dec!(3320));

    let _ = std::fs::remove_file(db_path);
}
