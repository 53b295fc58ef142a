/// Imagery/analysis façade: cached, multi-endpoint acquisition
use crate::adapters::{fallback_record, records_from_payload, Adapter};
use crate::analysis::synthesize;
use crate::cache::{cache_key, ResponseCache};
use crate::clients::{Transport, UpstreamPayload};
use crate::config::{AnalysisSettings, AppConfig};
use crate::domain::{
    Acquisition, AnalysisKind, AnalysisRecord, CacheStats, Coordinates, ExportFormat,
    ExportPayload, ImageryQuery,
};
use crate::errors::{ApiError, ApiResult};
use crate::export::{encode, Geolocated};
use crate::utils::redact_key;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Single access point for imagery, analysis and export.
///
/// Owns the response cache; nothing else mutates it.
pub struct DataFacade {
    transport: Arc<dyn Transport>,
    cache: Mutex<ResponseCache<Acquisition>>,
    api_key: String,
    endpoint_timeout: Duration,
    analysis: AnalysisSettings,
}

impl DataFacade {
    pub fn new(config: &AppConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: Mutex::new(ResponseCache::new(
                config.cache.ttl,
                config.cache.max_entries,
            )),
            api_key: config.api_key().to_string(),
            endpoint_timeout: config.endpoint_timeout,
            analysis: config.analysis.clone(),
        }
    }

    /// Acquire imagery for a body and coordinate.
    ///
    /// Endpoints are tried in priority order; the first one that answers
    /// without a transport error wins. When all fail the result is a
    /// `Degraded` synthetic record rather than an error.
    pub async fn acquire_imagery(&self, query: &ImageryQuery) -> ApiResult<Acquisition> {
        query.coordinates.validate()?;

        let adapter = Adapter::resolve(query.body, &query.source_hint);
        let at = query.coordinates;
        let key = cache_key("imagery", adapter.id(), at.latitude, at.longitude, query.date);

        if let Some(hit) = self.cache.lock().await.get(&key) {
            debug!("Cache hit for {} ({} records)", key, hit.records().len());
            return Ok(hit);
        }
        debug!("Cache miss for {}", key);

        let acquisition = self.fetch_first(adapter, query).await;
        self.cache.lock().await.insert(key, acquisition.clone());
        Ok(acquisition)
    }

    async fn fetch_first(&self, adapter: Adapter, query: &ImageryQuery) -> Acquisition {
        let endpoints = adapter.endpoints(query.coordinates, query.date, &self.api_key);
        let mut failures = Vec::with_capacity(endpoints.len());

        for url in &endpoints {
            let outcome = tokio::time::timeout(self.endpoint_timeout, self.transport.get(url))
                .await
                .unwrap_or_else(|_| {
                    Err(ApiError::Timeout(format!(
                        "no response within {:?}",
                        self.endpoint_timeout
                    )))
                });

            match outcome {
                Ok(payload) => {
                    if let UpstreamPayload::Binary { content_type, len } = &payload {
                        debug!("{} returned {} bytes of {}", redact_key(url), len, content_type);
                    }
                    let records = records_from_payload(adapter, query, url, &payload, Utc::now());
                    info!(
                        "{} answered from {} ({} records)",
                        adapter.id(),
                        redact_key(url),
                        records.len()
                    );
                    return Acquisition::Live(records);
                }
                Err(e) => {
                    warn!("{} endpoint {} failed: {}", adapter.id(), redact_key(url), e);
                    failures.push(e.to_string());
                }
            }
        }

        let reason = ApiError::ExhaustedFallback(format!(
            "{} of {} endpoints for {} failed ({})",
            failures.len(),
            endpoints.len(),
            adapter.id(),
            failures.join("; ")
        ))
        .to_string();
        warn!("Serving synthetic imagery: {}", reason);

        let record = fallback_record(adapter, query, Utc::now(), &mut rand::thread_rng());
        Acquisition::Degraded {
            records: vec![record],
            reason,
        }
    }

    /// Run one analysis kind; never cached, failures surface to the caller
    pub async fn run_analysis(
        &self,
        kind: AnalysisKind,
        at: Coordinates,
    ) -> ApiResult<Vec<AnalysisRecord>> {
        at.validate()?;

        let delay = self.analysis.delay;
        let work = async move {
            tokio::time::sleep(delay).await;
            synthesize(kind, at, Utc::now())
        };

        match tokio::time::timeout(self.analysis.timeout, work).await {
            Ok(records) => {
                debug!("{} analysis produced {} records", kind.as_str(), records.len());
                Ok(records)
            }
            Err(_) => {
                error!(
                    "{} analysis exceeded {:?}",
                    kind.as_str(),
                    self.analysis.timeout
                );
                Err(ApiError::Analysis(format!(
                    "{} analysis did not finish within {:?}",
                    kind.as_str(),
                    self.analysis.timeout
                )))
            }
        }
    }

    /// Encode records for download
    pub fn export_records<T: Serialize + Geolocated>(
        &self,
        format: ExportFormat,
        records: &[T],
        stem: &str,
    ) -> ApiResult<ExportPayload> {
        let bytes = encode(format, records)?;
        Ok(ExportPayload {
            bytes,
            media_type: format.media_type(),
            file_name: format!(
                "{}-{}.{}",
                stem,
                Utc::now().format("%Y%m%dT%H%M%S"),
                format.extension()
            ),
        })
    }

    /// Drop every cached entry
    pub async fn clear_cache(&self) -> usize {
        let dropped = self.cache.lock().await.clear();
        info!("Cache cleared ({} entries dropped)", dropped);
        dropped
    }

    pub async fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.lock().await;
        CacheStats {
            entries: cache.len(),
            capacity: cache.capacity(),
        }
    }
}
