/// Upstream imagery adapters: endpoint lists and response extraction
use crate::clients::UpstreamPayload;
use crate::domain::{CelestialBody, Coordinates, ImageryQuery, ImageryRecord};
use crate::utils::{n_pick, s_pick, t_pick, tile_xy};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Upper bound on records taken from one multi-item response
const MAX_RECORDS: usize = 12;
/// Half-width in degrees of the search box sent to catalogue endpoints
const BBOX_HALF_DEG: f64 = 0.05;
/// OSM zoom used for Earth fallback tiles
const FALLBACK_ZOOM: u32 = 12;

const URL_KEYS: &[&str] = &["url", "hdurl", "image_url", "img_src", "href", "link"];
const DATE_KEYS: &[&str] = &["date", "datetime", "acquired", "earth_date", "captured_at"];
const CLOUD_KEYS: &[&str] = &["cloud_score", "cloud_cover", "cloudCover", "eo:cloud_cover"];
const RESOLUTION_KEYS: &[&str] = &["gsd", "resolution"];
const ITEM_LIST_KEYS: &[&str] = &["photos", "latest_photos", "features", "items", "results"];

/// Named strategy mapping (body, source hint) to a prioritized endpoint list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adapter {
    Nasa,
    Sentinel2,
    Modis,
    Esa,
    Usgs,
    Planet,
    Maxar,
    Mars,
    Moon,
    Universe,
}

impl Adapter {
    /// Pick the adapter for a body; the hint only matters for Earth
    pub fn resolve(body: CelestialBody, source_hint: &str) -> Self {
        match body {
            CelestialBody::Mars => Self::Mars,
            CelestialBody::Moon => Self::Moon,
            CelestialBody::Universe => Self::Universe,
            CelestialBody::Earth => match source_hint.trim().to_ascii_lowercase().as_str() {
                "nasa" | "" => Self::Nasa,
                "sentinel2" | "sentinel" => Self::Sentinel2,
                "modis" => Self::Modis,
                "esa" => Self::Esa,
                "usgs" | "landsat" => Self::Usgs,
                "planet" => Self::Planet,
                "maxar" => Self::Maxar,
                other => {
                    warn!("Unknown earth source '{}', using nasa", other);
                    Self::Nasa
                }
            },
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Nasa => "earth:nasa",
            Self::Sentinel2 => "earth:sentinel2",
            Self::Modis => "earth:modis",
            Self::Esa => "earth:esa",
            Self::Usgs => "earth:usgs",
            Self::Planet => "earth:planet",
            Self::Maxar => "earth:maxar",
            Self::Mars => "mars",
            Self::Moon => "moon",
            Self::Universe => "universe",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Nasa => "NASA Earth Imagery",
            Self::Sentinel2 => "Sentinel-2 L2A",
            Self::Modis => "MODIS Corrected Reflectance",
            Self::Esa => "ESA Copernicus",
            Self::Usgs => "USGS Landsat",
            Self::Planet => "Planet Basemaps",
            Self::Maxar => "Maxar Discovery",
            Self::Mars => "NASA Mars Rover Imagery",
            Self::Moon => "LRO WAC Global Mosaic",
            Self::Universe => "NASA APOD",
        }
    }

    /// Nominal ground sample distance when the upstream does not report one
    pub fn resolution_meters(&self) -> f64 {
        match self {
            Self::Nasa => 30.0,
            Self::Sentinel2 | Self::Esa => 10.0,
            Self::Modis => 250.0,
            Self::Usgs => 30.0,
            Self::Planet => 3.0,
            Self::Maxar => 0.3,
            Self::Mars => 0.25,
            Self::Moon => 100.0,
            Self::Universe => 1.0,
        }
    }

    /// Endpoints in priority order
    pub fn endpoints(&self, at: Coordinates, date: Option<NaiveDate>, api_key: &str) -> Vec<String> {
        let (lat, lon) = (at.latitude, at.longitude);
        let bbox = bbox(at);
        let day = date.map(|d| d.format("%Y-%m-%d").to_string());
        let date_q = day.as_deref().map(|d| format!("&date={}", d)).unwrap_or_default();
        let time_q = day.as_deref().map(|d| format!("&TIME={}", d)).unwrap_or_default();
        let range_q = day
            .as_deref()
            .map(|d| format!("&datetime={}T00:00:00Z/{}T23:59:59Z", d, d))
            .unwrap_or_default();

        match self {
            Self::Nasa => vec![
                format!(
                    "https://api.nasa.gov/planetary/earth/assets?lat={}&lon={}&dim=0.15{}&api_key={}",
                    lat, lon, date_q, api_key
                ),
                format!(
                    "https://api.nasa.gov/planetary/earth/imagery?lat={}&lon={}&dim=0.15{}&api_key={}",
                    lat, lon, date_q, api_key
                ),
                gibs_snapshot("MODIS_Terra_CorrectedReflectance_TrueColor", at, &time_q),
            ],
            Self::Sentinel2 => vec![
                format!(
                    "https://earth-search.aws.element84.com/v1/search?collections=sentinel-2-l2a&bbox={}&limit=5{}",
                    bbox, range_q
                ),
                format!(
                    "https://planetarycomputer.microsoft.com/api/stac/v1/search?collections=sentinel-2-l2a&bbox={}&limit=5{}",
                    bbox, range_q
                ),
            ],
            Self::Modis => vec![
                gibs_snapshot("MODIS_Terra_CorrectedReflectance_TrueColor", at, &time_q),
                gibs_snapshot("MODIS_Aqua_CorrectedReflectance_TrueColor", at, &time_q),
            ],
            Self::Esa => vec![
                format!(
                    "https://catalogue.dataspace.copernicus.eu/stac/collections/SENTINEL-2/items?bbox={}&limit=5{}",
                    bbox, range_q
                ),
                format!(
                    "https://earth-search.aws.element84.com/v1/search?collections=sentinel-2-l1c&bbox={}&limit=5{}",
                    bbox, range_q
                ),
            ],
            Self::Usgs => vec![
                format!(
                    "https://landsatlook.usgs.gov/stac-server/search?collections=landsat-c2l2-sr&bbox={}&limit=5{}",
                    bbox, range_q
                ),
                format!(
                    "https://earth-search.aws.element84.com/v1/search?collections=landsat-c2-l2&bbox={}&limit=5{}",
                    bbox, range_q
                ),
            ],
            Self::Planet => vec![format!(
                "https://api.planet.com/basemaps/v1/mosaics?bbox={}&api_key={}",
                bbox, api_key
            )],
            Self::Maxar => vec![format!(
                "https://api.maxar.com/discovery/v1/search?collections=wv02,wv03-vnir&bbox={}&limit=5{}",
                bbox, range_q
            )],
            Self::Mars => vec![
                format!(
                    "https://api.nasa.gov/mars-photos/api/v1/rovers/perseverance/latest_photos?api_key={}",
                    api_key
                ),
                format!(
                    "https://api.nasa.gov/mars-photos/api/v1/rovers/curiosity/latest_photos?api_key={}",
                    api_key
                ),
            ],
            Self::Moon => {
                let (x, y) = equirect_tile(at, 3);
                vec![format!(
                    "https://trek.nasa.gov/tiles/Moon/EQ/LRO_WAC_Mosaic_Global_303ppd_v02/1.0.0/default/default028mm/3/{}/{}.jpg",
                    y, x
                )]
            }
            Self::Universe => vec![format!(
                "https://api.nasa.gov/planetary/apod?thumbs=true{}&api_key={}",
                date_q, api_key
            )],
        }
    }
}

fn bbox(at: Coordinates) -> String {
    format!(
        "{},{},{},{}",
        (at.longitude - BBOX_HALF_DEG).max(-180.0),
        (at.latitude - BBOX_HALF_DEG).max(-90.0),
        (at.longitude + BBOX_HALF_DEG).min(180.0),
        (at.latitude + BBOX_HALF_DEG).min(90.0)
    )
}

fn gibs_snapshot(layer: &str, at: Coordinates, time_q: &str) -> String {
    format!(
        "https://gibs.earthdata.nasa.gov/wms/epsg4326/best/wms.cgi?SERVICE=WMS&REQUEST=GetMap&VERSION=1.3.0&LAYERS={}&CRS=EPSG:4326&BBOX={},{},{},{}&WIDTH=512&HEIGHT=512&FORMAT=image/jpeg{}",
        layer,
        at.latitude - BBOX_HALF_DEG,
        at.longitude - BBOX_HALF_DEG,
        at.latitude + BBOX_HALF_DEG,
        at.longitude + BBOX_HALF_DEG,
        time_q
    )
}

/// Tile in a 2^(z+1) x 2^z equirectangular grid
fn equirect_tile(at: Coordinates, zoom: u32) -> (u32, u32) {
    let cols = f64::from(1u32 << (zoom + 1));
    let rows = f64::from(1u32 << zoom);
    let x = ((at.longitude + 180.0) / 360.0 * cols).floor().clamp(0.0, cols - 1.0);
    let y = ((90.0 - at.latitude) / 180.0 * rows).floor().clamp(0.0, rows - 1.0);
    (x as u32, y as u32)
}

/// Turn a successful upstream response into fully populated records.
///
/// Any response counts as success; fields it lacks are filled from the
/// request so no record leaves here partially populated.
pub fn records_from_payload(
    adapter: Adapter,
    query: &ImageryQuery,
    endpoint: &str,
    payload: &UpstreamPayload,
    now: DateTime<Utc>,
) -> Vec<ImageryRecord> {
    let json = match payload {
        UpstreamPayload::Json(json) => json,
        UpstreamPayload::Binary { .. } => {
            return vec![build_record(adapter, query, endpoint.to_string(), None, None, None, now)]
        }
    };

    let items = item_list(json);
    if items.is_empty() {
        return vec![record_from_item(adapter, query, endpoint, json, now)];
    }

    items
        .iter()
        .take(MAX_RECORDS)
        .map(|item| record_from_item(adapter, query, endpoint, item, now))
        .collect()
}

fn item_list(json: &Value) -> &[Value] {
    if let Some(arr) = json.as_array() {
        return arr;
    }
    ITEM_LIST_KEYS
        .iter()
        .filter_map(|k| json.get(*k).and_then(Value::as_array))
        .chain(
            json.get("collection")
                .and_then(|c| c.get("items"))
                .and_then(Value::as_array),
        )
        .find(|arr| !arr.is_empty())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn record_from_item(
    adapter: Adapter,
    query: &ImageryQuery,
    endpoint: &str,
    item: &Value,
    now: DateTime<Utc>,
) -> ImageryRecord {
    let properties = item.get("properties").unwrap_or(&Value::Null);
    let views = [item, properties];

    let url = views
        .iter()
        .find_map(|v| s_pick(v, URL_KEYS))
        .or_else(|| asset_href(item))
        .unwrap_or_else(|| endpoint.to_string());
    let captured_at = views.iter().find_map(|v| t_pick(v, DATE_KEYS));
    let cloud = views.iter().find_map(|v| n_pick(v, CLOUD_KEYS));
    let resolution = views.iter().find_map(|v| n_pick(v, RESOLUTION_KEYS));

    build_record(adapter, query, url, captured_at, cloud, resolution, now)
}

fn asset_href(item: &Value) -> Option<String> {
    let assets = item.get("assets")?;
    ["thumbnail", "visual", "rendered_preview", "QUICKLOOK"]
        .iter()
        .filter_map(|name| assets.get(*name))
        .find_map(|asset| s_pick(asset, &["href"]))
}

fn build_record(
    adapter: Adapter,
    query: &ImageryQuery,
    source_url: String,
    captured_at: Option<DateTime<Utc>>,
    cloud: Option<f64>,
    resolution: Option<f64>,
    now: DateTime<Utc>,
) -> ImageryRecord {
    ImageryRecord {
        id: Uuid::new_v4().to_string(),
        source_url,
        captured_at: captured_at.unwrap_or(now),
        coordinates: query.coordinates,
        cloud_cover_percent: normalize_cloud(query.body, cloud),
        resolution_meters: resolution
            .filter(|r| *r > 0.0)
            .unwrap_or_else(|| adapter.resolution_meters()),
        source_name: adapter.label().to_string(),
    }
}

/// Percent in [0, 100); fractions are scaled, airless bodies report 0
fn normalize_cloud(body: CelestialBody, cloud: Option<f64>) -> f64 {
    if !body.has_cloud_cover() {
        return 0.0;
    }
    match cloud {
        Some(c) if c <= 1.0 => (c * 100.0).clamp(0.0, 99.9),
        Some(c) => c.clamp(0.0, 99.9),
        None => 0.0,
    }
}

/// Synthetic record substituted when every endpoint failed
pub fn fallback_record<R: Rng + ?Sized>(
    adapter: Adapter,
    query: &ImageryQuery,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ImageryRecord {
    let at = query.coordinates;
    let (source_url, cloud_cover_percent) = if query.body.has_cloud_cover() {
        let (x, y) = tile_xy(at.latitude, at.longitude, FALLBACK_ZOOM);
        (
            format!("https://tile.openstreetmap.org/{}/{}/{}.png", FALLBACK_ZOOM, x, y),
            rng.gen_range(0.0..30.0),
        )
    } else {
        (
            format!(
                "https://placehold.co/512x512/png?text={}+{:.4}+{:.4}",
                query.body, at.latitude, at.longitude
            ),
            0.0,
        )
    };

    ImageryRecord {
        id: Uuid::new_v4().to_string(),
        source_url,
        captured_at: now,
        coordinates: at,
        cloud_cover_percent,
        resolution_meters: adapter.resolution_meters(),
        source_name: format!("{} (fallback)", adapter.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn earth_query() -> ImageryQuery {
        ImageryQuery::new(CelestialBody::Earth, 10.0, 20.0, "sentinel2")
    }

    #[test]
    fn test_resolve_ignores_hint_off_earth() {
        assert_eq!(Adapter::resolve(CelestialBody::Mars, "maxar"), Adapter::Mars);
        assert_eq!(Adapter::resolve(CelestialBody::Earth, "MODIS"), Adapter::Modis);
        assert_eq!(Adapter::resolve(CelestialBody::Earth, "bogus"), Adapter::Nasa);
    }

    #[test]
    fn test_every_adapter_has_endpoints() {
        let at = Coordinates::new(10.0, 20.0);
        for adapter in [
            Adapter::Nasa,
            Adapter::Sentinel2,
            Adapter::Modis,
            Adapter::Esa,
            Adapter::Usgs,
            Adapter::Planet,
            Adapter::Maxar,
            Adapter::Mars,
            Adapter::Moon,
            Adapter::Universe,
        ] {
            assert!(!adapter.endpoints(at, None, "KEY").is_empty(), "{:?}", adapter);
        }
    }

    #[test]
    fn test_nasa_endpoints_carry_date_and_key() {
        let date = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let urls = Adapter::Nasa.endpoints(Coordinates::new(1.5, -2.5), Some(date), "KEY");
        assert!(urls[0].contains("lat=1.5&lon=-2.5"));
        assert!(urls[0].contains("date=2023-05-01"));
        assert!(urls[0].ends_with("api_key=KEY"));
        assert!(urls[2].contains("TIME=2023-05-01"));
    }

    #[test]
    fn test_stac_features_become_records() {
        let payload = UpstreamPayload::Json(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "properties": {"datetime": "2024-03-01T10:00:00Z", "eo:cloud_cover": 12.5, "gsd": 10},
                    "assets": {"thumbnail": {"href": "https://img.test/a.jpg"}}
                },
                {
                    "properties": {"datetime": "2024-02-01T10:00:00Z"},
                    "assets": {"visual": {"href": "https://img.test/b.tif"}}
                }
            ]
        }));
        let query = earth_query();
        let records = records_from_payload(Adapter::Sentinel2, &query, "https://e", &payload, Utc::now());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_url, "https://img.test/a.jpg");
        assert_eq!(records[0].cloud_cover_percent, 12.5);
        assert_eq!(records[1].source_url, "https://img.test/b.tif");
        assert_eq!(records[1].cloud_cover_percent, 0.0);
        assert_eq!(records[0].coordinates, query.coordinates);
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn test_empty_object_is_still_a_full_record() {
        let now = Utc::now();
        let payload = UpstreamPayload::Json(json!({}));
        let records = records_from_payload(Adapter::Nasa, &earth_query(), "https://endpoint", &payload, now);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_url, "https://endpoint");
        assert_eq!(records[0].captured_at, now);
        assert_eq!(records[0].resolution_meters, 30.0);
    }

    #[test]
    fn test_binary_payload_points_at_endpoint() {
        let payload = UpstreamPayload::Binary {
            content_type: "image/jpeg".into(),
            len: 1024,
        };
        let records = records_from_payload(Adapter::Modis, &earth_query(), "https://gibs/x", &payload, Utc::now());
        assert_eq!(records[0].source_url, "https://gibs/x");
        assert_eq!(records[0].source_name, "MODIS Corrected Reflectance");
    }

    #[test]
    fn test_cloud_fraction_scaled_and_zero_off_earth() {
        assert_eq!(normalize_cloud(CelestialBody::Earth, Some(0.25)), 25.0);
        assert_eq!(normalize_cloud(CelestialBody::Earth, Some(140.0)), 99.9);
        assert_eq!(normalize_cloud(CelestialBody::Mars, Some(40.0)), 0.0);
    }

    #[test]
    fn test_mars_photos_capped() {
        let photos: Vec<Value> = (0..20)
            .map(|i| json!({"img_src": format!("https://mars.test/{}.jpg", i), "earth_date": "2024-01-01"}))
            .collect();
        let payload = UpstreamPayload::Json(json!({ "latest_photos": photos }));
        let query = ImageryQuery::new(CelestialBody::Mars, 4.5, 137.4, "");
        let records = records_from_payload(Adapter::Mars, &query, "https://e", &payload, Utc::now());
        assert_eq!(records.len(), MAX_RECORDS);
        assert!(records.iter().all(|r| r.cloud_cover_percent == 0.0));
    }

    #[test]
    fn test_fallback_record_shape() {
        let mut rng = rand::thread_rng();
        let query = ImageryQuery::new(CelestialBody::Earth, 51.5074, -0.1278, "nasa");
        let record = fallback_record(Adapter::Nasa, &query, Utc::now(), &mut rng);
        assert_eq!(record.source_url, "https://tile.openstreetmap.org/12/2046/1362.png");
        assert!((0.0..30.0).contains(&record.cloud_cover_percent));
        assert_eq!(record.coordinates, query.coordinates);
        assert!(record.source_name.ends_with("(fallback)"));

        let moon = ImageryQuery::new(CelestialBody::Moon, 0.0, 0.0, "");
        let record = fallback_record(Adapter::Moon, &moon, Utc::now(), &mut rng);
        assert!(record.source_url.starts_with("https://placehold.co/"));
        assert_eq!(record.cloud_cover_percent, 0.0);
    }

    #[test]
    fn test_equirect_tile_corners() {
        assert_eq!(equirect_tile(Coordinates::new(90.0, -180.0), 3), (0, 0));
        assert_eq!(equirect_tile(Coordinates::new(-90.0, 180.0), 3), (15, 7));
    }
}
