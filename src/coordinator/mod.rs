/// View-state coordinator: drives the façade and holds what the UI shows
use crate::domain::{
    AnalysisKind, AnalysisRecord, CelestialBody, Coordinates, ExportFormat, ExportPayload,
    ExportSubject, ImageryQuery, ImageryRecord, Phase, ViewSnapshot,
};
use crate::errors::ApiResult;
use crate::services::DataFacade;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

struct ViewState {
    body: CelestialBody,
    phase: Phase,
    imagery: Vec<ImageryRecord>,
    analysis_results: Vec<AnalysisRecord>,
    error_message: Option<String>,
    notice: Option<String>,
    // Latest issued token per operation kind
    imagery_token: u64,
    analysis_token: u64,
    imagery_pending: bool,
    analysis_pending: bool,
}

impl ViewState {
    fn new(body: CelestialBody) -> Self {
        Self {
            body,
            phase: Phase::Idle,
            imagery: Vec::new(),
            analysis_results: Vec::new(),
            error_message: None,
            notice: None,
            imagery_token: 0,
            analysis_token: 0,
            imagery_pending: false,
            analysis_pending: false,
        }
    }

    fn is_loading(&self) -> bool {
        self.imagery_pending || self.analysis_pending
    }

    /// Phase after a request settles; stays Loading while another is out.
    /// An error recorded by an overlapping request keeps the phase Failed
    /// until the next request clears it.
    fn settle(&mut self, failed: bool) {
        self.phase = if self.is_loading() {
            Phase::Loading
        } else if failed || self.error_message.is_some() {
            Phase::Failed
        } else {
            Phase::Ready
        };
    }

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            body: self.body,
            phase: self.phase,
            imagery: self.imagery.clone(),
            analysis_results: self.analysis_results.clone(),
            is_loading: self.is_loading(),
            error_message: self.error_message.clone(),
            notice: self.notice.clone(),
        }
    }
}

/// Only writer of view state; rebuilds it wholesale from façade results.
///
/// Each request takes a token; a result whose token is no longer the latest
/// for its operation kind is dropped instead of overwriting newer state.
pub struct ViewCoordinator {
    facade: Arc<DataFacade>,
    state: Mutex<ViewState>,
}

impl ViewCoordinator {
    pub fn new(facade: Arc<DataFacade>, body: CelestialBody) -> Self {
        Self {
            facade,
            state: Mutex::new(ViewState::new(body)),
        }
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Switch the active body; display state resets, the façade cache stays
    pub async fn set_body(&self, body: CelestialBody) -> ViewSnapshot {
        let mut state = self.state.lock().await;
        if state.body != body {
            info!("Active body changed {} -> {}", state.body, body);
            let (imagery_token, analysis_token) = (state.imagery_token, state.analysis_token);
            *state = ViewState::new(body);
            // In-flight results for the old body must not land
            state.imagery_token = imagery_token + 1;
            state.analysis_token = analysis_token + 1;
        }
        state.snapshot()
    }

    pub async fn acquire(
        &self,
        latitude: f64,
        longitude: f64,
        source_hint: &str,
        date: Option<NaiveDate>,
    ) -> ApiResult<ViewSnapshot> {
        let at = Coordinates::new(latitude, longitude);
        if let Err(e) = at.validate() {
            self.reject(&e.to_string()).await;
            return Err(e);
        }

        let (token, body) = {
            let mut state = self.state.lock().await;
            state.imagery_token += 1;
            state.imagery_pending = true;
            state.phase = Phase::Loading;
            state.error_message = None;
            (state.imagery_token, state.body)
        };

        let mut query = ImageryQuery::new(body, latitude, longitude, source_hint);
        if let Some(date) = date {
            query = query.with_date(date);
        }
        let result = self.facade.acquire_imagery(&query).await;

        let mut state = self.state.lock().await;
        if state.imagery_token != token {
            debug!("Discarding stale imagery result (token {})", token);
            // The caller still learns its own request failed
            return result.map(|_| state.snapshot());
        }
        state.imagery_pending = false;

        match result {
            Ok(acquisition) => {
                debug!(
                    "Imagery settled (token {}, degraded: {})",
                    token,
                    acquisition.is_degraded()
                );
                state.notice = acquisition
                    .degraded_reason()
                    .map(|reason| format!("Showing synthetic imagery: {}", reason));
                state.imagery = acquisition.into_records();
                state.settle(false);
                Ok(state.snapshot())
            }
            Err(e) => {
                state.error_message = Some(e.to_string());
                state.settle(true);
                Err(e)
            }
        }
    }

    pub async fn run_analysis(
        &self,
        kind: AnalysisKind,
        latitude: f64,
        longitude: f64,
    ) -> ApiResult<ViewSnapshot> {
        let at = Coordinates::new(latitude, longitude);
        if let Err(e) = at.validate() {
            self.reject(&e.to_string()).await;
            return Err(e);
        }

        let token = {
            let mut state = self.state.lock().await;
            state.analysis_token += 1;
            state.analysis_pending = true;
            state.phase = Phase::Loading;
            state.error_message = None;
            state.analysis_results.clear();
            state.analysis_token
        };

        let result = self.facade.run_analysis(kind, at).await;

        let mut state = self.state.lock().await;
        if state.analysis_token != token {
            debug!("Discarding stale {} analysis (token {})", kind.as_str(), token);
            return result.map(|_| state.snapshot());
        }
        state.analysis_pending = false;

        match result {
            Ok(records) => {
                state.analysis_results = records;
                state.settle(false);
                Ok(state.snapshot())
            }
            Err(e) => {
                state.error_message = Some(e.to_string());
                state.settle(true);
                Err(e)
            }
        }
    }

    /// Encode what is currently displayed
    pub async fn export_current(
        &self,
        format: ExportFormat,
        subject: ExportSubject,
    ) -> ApiResult<ExportPayload> {
        let stem = format!("satellitepro-{}", subject.as_str());
        let state = self.state.lock().await;
        match subject {
            ExportSubject::Imagery => self.facade.export_records(format, &state.imagery, &stem),
            ExportSubject::Analysis => {
                self.facade
                    .export_records(format, &state.analysis_results, &stem)
            }
        }
    }

    async fn reject(&self, message: &str) {
        let mut state = self.state.lock().await;
        state.error_message = Some(message.to_string());
        if !state.is_loading() {
            state.phase = Phase::Failed;
        }
    }
}
