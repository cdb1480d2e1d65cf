//! End-to-end pipeline scenarios: raw text in, rendered report (or silence) out.

use chrono::{DateTime, TimeZone, Utc};
use perp_sentinel::config::Config;
use perp_sentinel::engine::Engine;

fn ts(step: i64) -> DateTime<Utc> {
    // five-minute cadence
    Utc.timestamp_opt(step * 300, 0).unwrap()
}

fn engine_from(toml_src: &str) -> Engine {
    let config: Config = toml::from_str(toml_src).unwrap();
    Engine::new(&config).unwrap()
}

#[test]
fn steady_price_stays_silent_until_a_jump() {
    let mut engine = engine_from(
        r#"
        [[metrics]]
        metric = "price"
        label = "Price"
        comparison = "percent"
        threshold = 2.0
        baseline = { mode = "fixed_count_average", window = 12 }
        "#,
    );

    for i in 0..3 {
        assert_eq!(engine.ingest_at("$ 100.00", ts(i)), None);
    }

    let report = engine.ingest_at("$ 106.00", ts(3)).expect("jump must alert");
    // average over [100, 100, 100, 106] = 101.5 -> +4.43%
    assert!(report.contains("Price"));
    assert!(report.contains("+4.43%"));
    assert!(report.contains("106.0000"));
    assert!(report.contains("101.5000"));
}

#[test]
fn ratio_point_swing_fires_against_previous_sample() {
    let mut engine = engine_from(
        r#"
        [[metrics]]
        metric = "long_ratio"
        label = "Long Ratio"
        comparison = "points"
        threshold = 5.0
        baseline = { mode = "previous_sample" }
        "#,
    );

    assert_eq!(engine.ingest_at("LONG : 50.00%", ts(0)), None);
    // delta 0 on the second sample
    assert_eq!(engine.ingest_at("LONG : 50.00%", ts(1)), None);

    let report = engine
        .ingest_at("LONG : 56.00%", ts(2))
        .expect("6-point swing must alert");
    assert!(report.contains("Long Ratio"));
    assert!(report.contains("+6.00 pts"));
}

#[test]
fn absent_field_never_surfaces_in_findings() {
    let mut engine = engine_from(
        r#"
        [[metrics]]
        metric = "price"
        label = "Price"
        comparison = "percent"
        threshold = 2.0
        baseline = { mode = "previous_sample" }

        [[metrics]]
        metric = "open_interest"
        label = "Open Interest"
        comparison = "percent"
        threshold = 5.0
        baseline = { mode = "previous_sample" }
        "#,
    );

    for i in 0..4 {
        let _ = engine.ingest_at("$ 100.00 Open Interest 50.00 BTC", ts(i));
    }

    // Price jumps wildly in the market, but the message omits it entirely;
    // open interest is steady, so the round stays silent.
    assert_eq!(engine.ingest_at("Open Interest 50.00 BTC", ts(4)), None);
}

#[test]
fn magnitude_suffixes_feed_real_values_into_detection() {
    let mut engine = engine_from(
        r#"
        [detector]
        warmup_floor = 2

        [[metrics]]
        metric = "open_interest"
        label = "Open Interest"
        comparison = "percent"
        threshold = 5.0
        baseline = { mode = "previous_sample" }
        "#,
    );

    // 12.5K = 12500, 3M = 3000000: a ~239x jump
    assert_eq!(engine.ingest_at("Open Interest 12.5K BTC", ts(0)), None);
    let report = engine
        .ingest_at("Open Interest 3M BTC", ts(1))
        .expect("suffix values must be comparable");
    assert!(report.contains("3000000.0000"));
    assert!(report.contains("12500.0000"));
}

#[test]
fn identical_passes_render_identical_reports() {
    let config_src = r#"
        [[metrics]]
        metric = "price"
        label = "Price"
        comparison = "percent"
        threshold = 2.0
        baseline = { mode = "fixed_count_average", window = 12 }
    "#;

    let mut run = || {
        let mut engine = engine_from(config_src);
        for i in 0..3 {
            let _ = engine.ingest_at("$ 100.00", ts(i));
        }
        engine.ingest_at("$ 106.00", ts(3)).unwrap()
    };
    assert_eq!(run(), run());
}
