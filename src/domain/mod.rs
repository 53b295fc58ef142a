/// Domain models for the application
use crate::errors::ApiError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Body whose surface (or sky) is being imaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CelestialBody {
    Earth,
    Mars,
    Moon,
    Universe,
}

impl CelestialBody {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earth => "earth",
            Self::Mars => "mars",
            Self::Moon => "moon",
            Self::Universe => "universe",
        }
    }

    /// Only Earth imagery carries a meaningful cloud cover figure
    pub fn has_cloud_cover(&self) -> bool {
        matches!(self, Self::Earth)
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CelestialBody {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earth" => Ok(Self::Earth),
            "mars" => Ok(Self::Mars),
            "moon" => Ok(Self::Moon),
            "universe" => Ok(Self::Universe),
            other => Err(ApiError::Validation(format!(
                "unknown celestial body '{}'",
                other
            ))),
        }
    }
}

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reject non-finite or out-of-range values
    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ApiError::Validation(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ApiError::Validation(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// One acquired image tile and its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageryRecord {
    pub id: String,
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub cloud_cover_percent: f64,
    pub resolution_meters: f64,
    pub source_name: String,
}

/// Parameters of an imagery acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct ImageryQuery {
    pub body: CelestialBody,
    pub coordinates: Coordinates,
    pub source_hint: String,
    pub date: Option<NaiveDate>,
}

impl ImageryQuery {
    pub fn new(body: CelestialBody, latitude: f64, longitude: f64, source_hint: &str) -> Self {
        Self {
            body,
            coordinates: Coordinates::new(latitude, longitude),
            source_hint: source_hint.to_string(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Outcome of an imagery acquisition
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    /// Records came from an upstream endpoint
    Live(Vec<ImageryRecord>),
    /// Every endpoint failed; records are synthetic placeholders
    Degraded {
        records: Vec<ImageryRecord>,
        reason: String,
    },
}

impl Acquisition {
    pub fn records(&self) -> &[ImageryRecord] {
        match self {
            Acquisition::Live(records) => records,
            Acquisition::Degraded { records, .. } => records,
        }
    }

    pub fn into_records(self) -> Vec<ImageryRecord> {
        match self {
            Acquisition::Live(records) => records,
            Acquisition::Degraded { records, .. } => records,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Acquisition::Degraded { .. })
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Acquisition::Live(_) => None,
            Acquisition::Degraded { reason, .. } => Some(reason.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Anomaly,
    Thermal,
    Spectral,
    Structural,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anomaly => "anomaly",
            Self::Thermal => "thermal",
            Self::Spectral => "spectral",
            Self::Structural => "structural",
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anomaly" => Ok(Self::Anomaly),
            "thermal" => Ok(Self::Thermal),
            "spectral" => Ok(Self::Spectral),
            "structural" => Ok(Self::Structural),
            other => Err(ApiError::Validation(format!(
                "unknown analysis kind '{}'",
                other
            ))),
        }
    }
}

/// Ordered low < medium < high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One finding of an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub kind: AnalysisKind,
    pub confidence_percent: f64,
    pub location: Coordinates,
    pub severity: Severity,
    pub description: String,
    pub produced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    GeoJson,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::GeoJson => "application/geo+json",
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::GeoJson => "geojson",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geojson" => Ok(Self::GeoJson),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ApiError::Validation(format!(
                "unknown export format '{}'",
                other
            ))),
        }
    }
}

/// Encoded export ready for download
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub file_name: String,
}

/// Which displayed collection an export draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportSubject {
    #[default]
    Imagery,
    Analysis,
}

impl ExportSubject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imagery => "imagery",
            Self::Analysis => "analysis",
        }
    }
}

impl FromStr for ExportSubject {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imagery" => Ok(Self::Imagery),
            "analysis" => Ok(Self::Analysis),
            other => Err(ApiError::Validation(format!(
                "unknown export subject '{}'",
                other
            ))),
        }
    }
}

/// Coordinator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Read-only view of coordinator state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub body: CelestialBody,
    pub phase: Phase,
    pub imagery: Vec<ImageryRecord>,
    pub analysis_results: Vec<AnalysisRecord>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub notice: Option<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}

/// Cache occupancy report
#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validate_ranges() {
        assert!(Coordinates::new(90.0, -180.0).validate().is_ok());
        assert!(Coordinates::new(95.0, 20.0).validate().is_err());
        assert!(Coordinates::new(10.0, 180.5).validate().is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("Mars".parse::<CelestialBody>().unwrap(), CelestialBody::Mars);
        assert_eq!(
            "thermal".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::Thermal
        );
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            "Analysis".parse::<ExportSubject>().unwrap(),
            ExportSubject::Analysis
        );
        assert!(matches!(
            "weather".parse::<ExportSubject>(),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            "radar".parse::<AnalysisKind>(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_imagery_record_serializes_camel_case() {
        let record = ImageryRecord {
            id: "a".into(),
            source_url: "https://example.test/tile.png".into(),
            captured_at: Utc::now(),
            coordinates: Coordinates::new(1.0, 2.0),
            cloud_cover_percent: 0.0,
            resolution_meters: 30.0,
            source_name: "NASA".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("sourceUrl").is_some());
        assert!(json.get("cloudCoverPercent").is_some());
        assert_eq!(json["coordinates"]["latitude"], 1.0);
    }
}
