/// Synthetic analysis generators, one routine per kind
use crate::domain::{AnalysisKind, AnalysisRecord, Coordinates, Severity};
use chrono::{DateTime, Utc};

/// Produce the findings for `kind` around `at`
pub fn synthesize(kind: AnalysisKind, at: Coordinates, now: DateTime<Utc>) -> Vec<AnalysisRecord> {
    match kind {
        AnalysisKind::Anomaly => anomaly(at, now),
        AnalysisKind::Thermal => thermal(at, now),
        AnalysisKind::Spectral => spectral(at, now),
        AnalysisKind::Structural => structural(at, now),
    }
}

fn anomaly(at: Coordinates, now: DateTime<Utc>) -> Vec<AnalysisRecord> {
    let tiers = [
        (
            Severity::High,
            94.0,
            Coordinates::new(at.latitude + 0.001, at.longitude + 0.001),
            "Unusual surface disturbance detected, consistent with recent structural change",
        ),
        (
            Severity::Medium,
            78.0,
            Coordinates::new(at.latitude - 0.002, at.longitude + 0.002),
            "Surface pattern deviates from the seasonal baseline",
        ),
        (
            Severity::Low,
            62.0,
            Coordinates::new(at.latitude + 0.003, at.longitude - 0.003),
            "Minor reflectance variation within natural variability",
        ),
    ];

    tiers
        .into_iter()
        .map(|(severity, confidence, location, description)| AnalysisRecord {
            kind: AnalysisKind::Anomaly,
            confidence_percent: confidence,
            location: clamp(location),
            severity,
            description: description.to_string(),
            produced_at: now,
        })
        .collect()
}

fn thermal(at: Coordinates, now: DateTime<Utc>) -> Vec<AnalysisRecord> {
    let delta = 2.0 + (at.latitude.abs() + at.longitude.abs()) % 10.0;
    vec![AnalysisRecord {
        kind: AnalysisKind::Thermal,
        confidence_percent: 95.0,
        location: at,
        severity: Severity::Medium,
        description: format!(
            "Thermal signature peaks at {:.1}°C above the regional baseline",
            delta
        ),
        produced_at: now,
    }]
}

fn spectral(at: Coordinates, now: DateTime<Utc>) -> Vec<AnalysisRecord> {
    let matched = 60.0 + (at.latitude.abs() * at.longitude.abs()) % 35.0;
    vec![AnalysisRecord {
        kind: AnalysisKind::Spectral,
        confidence_percent: 92.0,
        location: at,
        severity: Severity::Low,
        description: format!(
            "Spectral profile matches reference mineral signature at {:.1}%",
            matched
        ),
        produced_at: now,
    }]
}

fn structural(at: Coordinates, now: DateTime<Utc>) -> Vec<AnalysisRecord> {
    let index = 0.7 + ((at.latitude + at.longitude).abs() % 30.0) / 100.0;
    vec![AnalysisRecord {
        kind: AnalysisKind::Structural,
        confidence_percent: 89.0,
        location: at,
        severity: Severity::Medium,
        description: format!(
            "Structural integrity index of {:.2} across the surveyed area",
            index
        ),
        produced_at: now,
    }]
}

fn clamp(at: Coordinates) -> Coordinates {
    Coordinates::new(at.latitude.clamp(-90.0, 90.0), at.longitude.clamp(-180.0, 180.0))
}
