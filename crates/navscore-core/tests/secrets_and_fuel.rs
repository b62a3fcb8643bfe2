use chrono::{DateTime, Duration, TimeZone, Utc};
use navscore_core::{
    score_flight, Checkpoint, FlightPlan, Position, Route, ScoreRequest, ScoringConfig, Secret,
    SecretKind, StartGate, MAX_SCORE,
};
use std::io::Write;

// --- Mock Helpers ---

fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 14, 16, 0, 0).unwrap() + Duration::seconds(secs)
}

fn create_mock_secret(name: &str, lat: f64, lon: f64, kind: SecretKind) -> Secret {
    Secret {
        name: name.to_string(),
        lat,
        lon,
        kind,
        radius_nm: 0.5,
    }
}

/// Due east along 40N at ~72 kt, a sample every 30 s for 20 minutes.
fn create_mock_request(secrets: Vec<Secret>, actual_fuel: f64) -> ScoreRequest {
    ScoreRequest {
        route: Route::new(vec![Checkpoint {
            sequence: 1,
            name: "Silo".to_string(),
            lat: 40.0,
            lon: -104.7,
        }]),
        secrets,
        start_gate: StartGate {
            name: "Gate".to_string(),
            lat: 40.0,
            lon: -105.0,
        },
        plan: FlightPlan {
            leg_time_estimates: vec![1000.0],
            total_time_estimate: 1000.0,
            fuel_estimate: 10.0,
        },
        trajectory: (0..=40)
            .map(|i| Position::new(t(i * 30), 40.0, -105.0 + i as f64 * 0.0125))
            .collect(),
        actual_fuel,
        config: ScoringConfig::default(),
    }
}

// --- Test Suite ---

#[test]
fn test_secrets_found_out_of_order() {
    let secrets = vec![
        create_mock_secret("Windmill", 40.0, -104.75, SecretKind::Enroute),
        create_mock_secret("Church", 40.001, -104.95, SecretKind::Checkpoint),
    ];
    let breakdown = score_flight(&create_mock_request(secrets, 10.0)).unwrap();

    assert_eq!(breakdown.secrets_found.len(), 2);
    let windmill = &breakdown.secrets_found[0];
    let church = &breakdown.secrets_found[1];
    assert_eq!(windmill.name, "Windmill");
    assert_eq!(church.name, "Church");
    assert_eq!(church.kind, SecretKind::Checkpoint);
    // Church lies under sample 4, Windmill under sample 20.
    assert_eq!(church.timestamp, t(120));
    assert_eq!(windmill.timestamp, t(600));
    assert_eq!(breakdown.secrets_missed_checkpoint, 0);
    assert_eq!(breakdown.secrets_missed_enroute, 0);
    assert_eq!(breakdown.secrets_penalty, 0.0);
}

#[test]
fn test_missed_secrets_are_counted_and_charged() {
    let secrets = vec![
        create_mock_secret("Quarry", 40.3, -104.9, SecretKind::Checkpoint),
        create_mock_secret("Tower", 39.7, -104.9, SecretKind::Enroute),
        create_mock_secret("Dam", 40.5, -104.5, SecretKind::Enroute),
        create_mock_secret("Bridge", 40.0, -104.8, SecretKind::Enroute),
    ];
    let request = create_mock_request(secrets, 10.0);
    let baseline = score_flight(&create_mock_request(Vec::new(), 10.0)).unwrap();
    let breakdown = score_flight(&request).unwrap();

    assert_eq!(breakdown.secrets_found.len(), 1);
    assert_eq!(breakdown.secrets_missed_checkpoint, 1);
    assert_eq!(breakdown.secrets_missed_enroute, 2);
    let expected = request.config.secrets.checkpoint_penalty
        + 2.0 * request.config.secrets.enroute_penalty;
    assert_eq!(breakdown.secrets_penalty, expected);
    assert!((baseline.overall_score - breakdown.overall_score - expected).abs() < 1e-9);
}

#[test]
fn test_fuel_sign() {
    let over = score_flight(&create_mock_request(Vec::new(), 1.1 * 10.0)).unwrap();
    assert!((over.fuel_error_pct - 10.0).abs() < 1e-9);

    let under = score_flight(&create_mock_request(Vec::new(), 0.9 * 10.0)).unwrap();
    assert!((under.fuel_error_pct + 10.0).abs() < 1e-9);
}

#[test]
fn test_fuel_penalty_reduces_score() {
    let exact = score_flight(&create_mock_request(Vec::new(), 10.0)).unwrap();
    let heavy = score_flight(&create_mock_request(Vec::new(), 13.0)).unwrap();
    let light = score_flight(&create_mock_request(Vec::new(), 7.0)).unwrap();

    assert_eq!(exact.fuel_penalty, 0.0);
    // 30% off with a 10% band: 20 points over the band at each rate.
    assert!((heavy.fuel_penalty - 20.0 * 0.5).abs() < 1e-9);
    assert!((light.fuel_penalty - 20.0 * 0.25).abs() < 1e-9);
    assert!(heavy.overall_score < light.overall_score);
    assert!(light.overall_score < exact.overall_score);
    assert!(exact.overall_score <= MAX_SCORE);
}

#[test]
fn test_track_imported_from_csv() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "time,lat,lon,alt").unwrap();
    for i in 0..=40 {
        writeln!(
            file,
            "{},40.0,{},2500",
            t(i * 30).to_rfc3339(),
            -105.0 + i as f64 * 0.0125
        )
        .unwrap();
    }

    let mut request = create_mock_request(Vec::new(), 10.0);
    let imported = navscore_core::import::TrackCsvParser::parse_file(file.path()).unwrap();
    assert_eq!(imported.len(), request.trajectory.len());
    let expected = score_flight(&request).unwrap();

    request.trajectory = imported;
    let breakdown = score_flight(&request).unwrap();
    assert_eq!(breakdown.checkpoint_results, expected.checkpoint_results);
    assert_eq!(breakdown.overall_score, expected.overall_score);
}
