/// GeoJSON / CSV / JSON encoders for record downloads
use crate::domain::{AnalysisRecord, Coordinates, ExportFormat, ImageryRecord};
use crate::errors::{ApiError, ApiResult};
use csv::{Terminator, WriterBuilder};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Records that can be placed on a map
pub trait Geolocated {
    fn position(&self) -> Coordinates;
}

impl Geolocated for ImageryRecord {
    fn position(&self) -> Coordinates {
        self.coordinates
    }
}

impl Geolocated for AnalysisRecord {
    fn position(&self) -> Coordinates {
        self.location
    }
}

/// Encode `records` in `format`
pub fn encode<T: Serialize + Geolocated>(format: ExportFormat, records: &[T]) -> ApiResult<Vec<u8>> {
    match format {
        ExportFormat::GeoJson => geojson(records),
        ExportFormat::Csv => csv(records),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(records)?),
    }
}

fn geojson<T: Serialize + Geolocated>(records: &[T]) -> ApiResult<Vec<u8>> {
    let features = records
        .iter()
        .map(|record| -> ApiResult<Value> {
            let at = record.position();
            let properties = serde_json::to_value(record)?;
            // GeoJSON axis order is lon, lat
            Ok(json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [at.longitude, at.latitude] },
                "properties": properties,
            }))
        })
        .collect::<ApiResult<Vec<Value>>>()?;

    let collection = json!({ "type": "FeatureCollection", "features": features });
    Ok(serde_json::to_vec_pretty(&collection)?)
}

fn csv<T: Serialize>(records: &[T]) -> ApiResult<Vec<u8>> {
    let mut rows: Vec<Map<String, Value>> = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        match serde_json::to_value(record)? {
            Value::Object(obj) => {
                let mut flat = Map::new();
                flatten("", obj, &mut flat);
                rows.push(flat);
            }
            other => {
                return Err(ApiError::Export(format!(
                    "record {} is not an object (got {})",
                    i,
                    type_name(&other)
                )))
            }
        }
    }

    // Union of keys in first-seen order
    let mut header: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !header.contains(key) {
                header.push(key.clone());
            }
        }
    }

    if header.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(&header)?;
    for row in &rows {
        writer.write_record(header.iter().map(|h| cell(row.get(h.as_str()))))?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::Export(format!("csv flush failed: {}", e.error())))
}

fn flatten(prefix: &str, obj: Map<String, Value>, out: &mut Map<String, Value>) {
    for (key, value) in obj {
        let name = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => flatten(&name, inner, out),
            other => {
                out.insert(name, other);
            }
        }
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
