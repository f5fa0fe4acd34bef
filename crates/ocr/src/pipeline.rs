use idscan_core::{ExtractedRecord, QualityBucket, RecognitionResult, RegionSpec, ScanConfig};
use image::DynamicImage;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::classify::classify;
use crate::preprocess::{ImagePrimitive, PreprocessError, RasterOps};
use crate::profile::DocumentProfile;
use crate::progress::{PipelineState, ProgressSchedule, ProgressTracker, Stage};
use crate::recognizer::{OcrBackend, OcrError, RecognitionRequest};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("Scan cancelled")]
    Cancelled,
    #[error("A scan is already running")]
    Busy,
    #[error("Background task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// Message shown to the user. Engine messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Ocr(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// The result of a single scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub record: ExtractedRecord,
    pub quality: QualityBucket,
}

/// Orchestrates: decode → detect → classify → per-region recognize → extract.
///
/// One scan runs at a time; a second call while busy fails with
/// [`PipelineError::Busy`]. Engine calls never overlap, even when a timed out
/// call is still draining on its blocking thread.
pub struct ScanPipeline<R: OcrBackend> {
    recognizer: Arc<R>,
    images: Arc<dyn ImagePrimitive>,
    config: Arc<ScanConfig>,
    progress: ProgressTracker,
    run_lock: tokio::sync::Mutex<()>,
    engine_lock: Arc<Mutex<()>>,
}

impl<R: OcrBackend + 'static> ScanPipeline<R> {
    pub fn new(recognizer: R, config: ScanConfig) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            images: Arc::new(RasterOps),
            config: Arc::new(config),
            progress: ProgressTracker::new(),
            run_lock: tokio::sync::Mutex::new(()),
            engine_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the default `image`-crate decode/crop/enhance implementation.
    pub fn with_image_ops(mut self, images: impl ImagePrimitive + 'static) -> Self {
        self.images = Arc::new(images);
        self
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Observe stage and progress changes.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.progress.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.progress.snapshot()
    }

    /// Scan an image file on disk.
    pub async fn process_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome, PipelineError> {
        let _guard = self.run_lock.try_lock().map_err(|_| PipelineError::Busy)?;
        let run = self.progress.begin();
        info!(run, path = %path.display(), "scan started");
        let result = match tokio::fs::read(path).await {
            Ok(bytes) => self.run(run, &bytes, cancel).await,
            Err(e) => Err(e.into()),
        };
        self.conclude(run, result)
    }

    /// Scan raw image bytes (camera capture, upload, …).
    pub async fn process_bytes(
        &self,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome, PipelineError> {
        let _guard = self.run_lock.try_lock().map_err(|_| PipelineError::Busy)?;
        let run = self.progress.begin();
        info!(run, bytes = data.len(), "scan started");
        let result = self.run(run, data, cancel).await;
        self.conclude(run, result)
    }

    fn conclude(
        &self,
        run: u64,
        result: Result<ScanOutcome, PipelineError>,
    ) -> Result<ScanOutcome, PipelineError> {
        match &result {
            Ok(outcome) => {
                self.progress.complete(run);
                info!(
                    run,
                    doc_type = %outcome.record.doc_type,
                    found = outcome.record.found_count(),
                    quality = %outcome.quality,
                    "scan finished"
                );
            }
            Err(e) => {
                self.progress.fail(run, e.user_message());
                warn!(run, error = %e, "scan failed");
            }
        }
        let delay = Duration::from_millis(self.config.progress.reset_delay_ms);
        self.progress.schedule_reset(run, delay);
        result
    }

    async fn run(
        &self,
        run: u64,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome, PipelineError> {
        let config = &self.config;

        // 1. Decode.
        let data = data.to_vec();
        let images = self.images.clone();
        let image = Arc::new(self.blocking(cancel, move || images.decode(&data)).await??);

        // 2. Detect: a cheap strip is read to pick the document type. Its share
        //    of the bar assumes the heaviest plan so progress never jumps back.
        let detect_schedule = ProgressSchedule::new(
            0,
            100,
            vec![
                config.detection.weight,
                config.heaviest_plan_weight() + config.progress.extraction_weight,
            ],
        );
        let detect_text = self
            .read_region(run, &image, &config.detection, &detect_schedule, 0, cancel)
            .await?;
        let doc_type = classify(&detect_text);
        let profile = DocumentProfile::resolve(doc_type, config);
        info!(run, %doc_type, regions = profile.plan().len(), "document classified");

        // 3. Recognize each planned region, rescaled into what is left of the bar.
        let mut weights: Vec<u32> = profile.plan().iter().map(|r| r.weight).collect();
        weights.push(config.progress.extraction_weight);
        let schedule = ProgressSchedule::new(detect_schedule.stage_end(0), 100, weights);

        let mut results = Vec::with_capacity(profile.plan().len());
        for (index, region) in profile.plan().iter().enumerate() {
            self.progress.enter(
                run,
                Stage::Recognizing { index, label: region.label.clone() },
                schedule.percent(index, 0),
            );
            let text = self.read_region(run, &image, region, &schedule, index, cancel).await?;
            results.push(RecognitionResult::new(region.label.as_str(), text));
        }

        // 4. Extract.
        self.progress
            .enter(run, Stage::Extracting, schedule.percent(profile.plan().len(), 0));
        let record = profile.extract(results);
        let quality = record.quality(&config.quality);
        Ok(ScanOutcome { record, quality })
    }

    async fn read_region(
        &self,
        run: u64,
        image: &Arc<DynamicImage>,
        region: &RegionSpec,
        schedule: &ProgressSchedule,
        stage: usize,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let bytes = {
            let images = self.images.clone();
            let image = image.clone();
            let region = region.clone();
            self.blocking(cancel, move || images.extract_region(&image, &region)).await??
        };
        self.recognize_with_retry(run, region, Arc::new(bytes), schedule, stage, cancel)
            .await
    }

    async fn recognize_with_retry(
        &self,
        run: u64,
        region: &RegionSpec,
        bytes: Arc<Vec<u8>>,
        schedule: &ProgressSchedule,
        stage: usize,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let attempts = self.config.recognition.attempts.max(1);
        let backoff = Duration::from_millis(self.config.recognition.retry_backoff_ms);
        let mut attempt = 1;
        loop {
            match self.recognize_once(run, region, bytes.clone(), schedule, stage, cancel).await {
                Ok(text) => return Ok(text),
                Err(OcrError::Cancelled) => return Err(PipelineError::Cancelled),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(run, region = %region.label, attempt, error = %e, "recognition failed, retrying");
                    attempt += 1;
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn recognize_once(
        &self,
        run: u64,
        region: &RegionSpec,
        bytes: Arc<Vec<u8>>,
        schedule: &ProgressSchedule,
        stage: usize,
        cancel: &CancellationToken,
    ) -> Result<String, OcrError> {
        if cancel.is_cancelled() {
            return Err(OcrError::Cancelled);
        }
        let recognizer = self.recognizer.clone();
        let engine = self.engine_lock.clone();
        let tracker = self.progress.clone();
        let schedule = schedule.clone();
        let label = region.label.clone();
        let languages = region.languages.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
            let request = RecognitionRequest { image_bytes: &bytes, languages: &languages, label: &label };
            recognizer.recognize(&request, &|update| {
                tracker.advance(run, schedule.percent(stage, update.percent));
            })
        });

        let timeout_secs = self.config.recognition.timeout_secs;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(OcrError::Cancelled),
            joined = tokio::time::timeout(Duration::from_secs(timeout_secs), handle) => match joined {
                Err(_) => Err(OcrError::Timeout(timeout_secs)),
                Ok(Err(join)) => Err(OcrError::Engine(join.to_string())),
                Ok(Ok(result)) => result,
            },
        }
    }

    /// Run CPU-bound work off the async runtime, abandoning it on cancellation.
    async fn blocking<T, F>(&self, cancel: &CancellationToken, work: F) -> Result<T, PipelineError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let handle = tokio::task::spawn_blocking(work);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            joined = handle => joined.map_err(|e| PipelineError::Task(e.to_string())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
