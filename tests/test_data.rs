use airbnb_forecast::data::{MarketHistory, Quarter, QuarterRecord, QuarterlySeries, SnapshotLoader};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_quarter_parse_and_display() {
    let q: Quarter = "2023Q4".parse().unwrap();
    assert_eq!(q.year(), 2023);
    assert_eq!(q.of_year(), 4);
    assert_eq!(q.to_string(), "2023Q4");

    // Dashed form is accepted too
    let dashed: Quarter = "2023-Q4".parse().unwrap();
    assert_eq!(dashed, q);

    assert!("2023Q5".parse::<Quarter>().is_err());
    assert!("2023".parse::<Quarter>().is_err());
    assert!("Q4".parse::<Quarter>().is_err());
}

#[test]
fn test_quarter_ordering_and_succ() {
    let q4 = Quarter::new(2023, 4).unwrap();
    let q1 = Quarter::new(2024, 1).unwrap();
    assert!(q4 < q1);
    assert_eq!(q4.succ(), q1);
    assert_eq!(q1.succ(), Quarter::new(2024, 2).unwrap());
    assert_eq!(q4.first_month(), 10);
    assert_eq!(q1.first_month(), 1);
}

#[test]
fn test_quarter_following_crosses_year_boundary() {
    let q = Quarter::new(2023, 3).unwrap();
    let next = q.following(4);
    let labels: Vec<String> = next.iter().map(|q| q.to_string()).collect();
    assert_eq!(labels, vec!["2023Q4", "2024Q1", "2024Q2", "2024Q3"]);
}

#[test]
fn test_quarter_serde_round_trip() {
    let q = Quarter::new(2024, 2).unwrap();
    let json = serde_json::to_string(&q).unwrap();
    assert_eq!(json, "\"2024Q2\"");
    let back: Quarter = serde_json::from_str(&json).unwrap();
    assert_eq!(back, q);
}

#[test]
fn test_series_operations() {
    let start = Quarter::new(2022, 1).unwrap();
    let series = QuarterlySeries::from_start(start, vec![100.0, 103.0, 106.0]);

    assert_eq!(series.len(), 3);
    assert!(!series.is_empty());
    assert_eq!(series.last_quarter(), Some(Quarter::new(2022, 3).unwrap()));
    assert_eq!(series.last_value(), Some(106.0));

    let subset = series.slice(1, Some(3)).unwrap();
    assert_eq!(subset.len(), 2);
    assert!(series.slice(2, Some(1)).is_err());

    let mean = series.mean().unwrap();
    assert!(mean > 102.0 && mean < 104.0);
    assert!(series.std_dev().unwrap() > 0.0);
}

#[test]
fn test_series_length_mismatch() {
    let quarters = vec![Quarter::new(2022, 1).unwrap()];
    assert!(QuarterlySeries::new(quarters, vec![1.0, 2.0]).is_err());
}

#[test]
fn test_train_test_split() {
    let start = Quarter::new(2021, 1).unwrap();
    let values: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
    let series = QuarterlySeries::from_start(start, values);

    let (train, test) = series.train_test_split(0.25).unwrap();
    assert_eq!(train.len(), 9);
    assert_eq!(test.len(), 3);
    // Test tail continues where the training head stops
    assert_eq!(test.quarters()[0], train.last_quarter().unwrap().succ());

    assert!(series.train_test_split(0.0).is_err());
    assert!(series.train_test_split(1.0).is_err());
}

#[test]
fn test_market_history_sorts_records() {
    let record = |year, quarter, listings| QuarterRecord {
        quarter: Quarter::new(year, quarter).unwrap(),
        total_listings: listings,
        avg_price: 200.0,
        occupancy_rate: 0.5,
        reviews_per_listing: 8.0,
    };

    let history =
        MarketHistory::new(vec![record(2023, 2, 44464.0), record(2022, 4, 40438.0)]).unwrap();
    assert_eq!(history.volume().values(), &[40438.0, 44464.0]);
    assert_eq!(history.last_quarter(), Quarter::new(2023, 2).unwrap());

    assert!(MarketHistory::new(Vec::new()).is_err());
}

#[test]
fn test_sample_history() {
    let history = MarketHistory::sample();
    assert_eq!(history.len(), 4);
    assert_eq!(history.volume().values(), &[40438.0, 42451.0, 44464.0, 44594.0]);
    assert_eq!(history.last_quarter(), Quarter::new(2023, 3).unwrap());
    assert!(history.occupancy().values().iter().all(|o| (0.0..=1.0).contains(o)));
}

#[test]
fn test_snapshot_loader_from_dir() {
    let dir = tempfile::tempdir().unwrap();

    let write_snapshot = |name: &str, rows: &[(f64, i64, i64)]| {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        writeln!(file, "id,price,availability_365,number_of_reviews_ltm").unwrap();
        for (i, (price, avail, reviews)) in rows.iter().enumerate() {
            writeln!(file, "{},{},{},{}", i, price, avail, reviews).unwrap();
        }
    };

    write_snapshot(
        "2023Q1.csv",
        &[(150.0, 200, 10), (250.0, 100, 4), (180.0, 150, 6)],
    );
    write_snapshot("2023Q2.csv", &[(160.0, 180, 12), (240.0, 120, 8)]);
    // Files without a quarter label in the stem are skipped
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let history = SnapshotLoader::from_dir(dir.path()).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.volume().values(), &[3.0, 2.0]);
    assert_eq!(history.last_quarter(), Quarter::new(2023, 2).unwrap());

    let occupancy = history.occupancy().values().to_vec();
    assert!(occupancy.iter().all(|o| *o > 0.0 && *o < 1.0));
}

#[test]
fn test_snapshot_loader_empty_dir() {
    let dir = tempfile::tempdir().unwrap();
    assert!(SnapshotLoader::from_dir(dir.path()).is_err());
}
