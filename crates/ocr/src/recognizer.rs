use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available, build with the `tesseract` feature")]
    NotAvailable,
    #[error("OCR timed out after {0}s")]
    Timeout(u64),
    #[error("OCR cancelled")]
    Cancelled,
}

impl OcrError {
    /// Text surfaced to the user. Engine failures pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            OcrError::Engine(msg) | OcrError::ImageDecode(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, OcrError::Engine(_) | OcrError::Timeout(_))
    }
}

/// One call into the OCR engine.
#[derive(Debug, Clone, Copy)]
pub struct RecognitionRequest<'a> {
    /// PNG/JPEG bytes of the region to read.
    pub image_bytes: &'a [u8],
    /// Tesseract-style language list, e.g. `eng+tam`.
    pub languages: &'a str,
    /// Region label, for logging and scripted backends.
    pub label: &'a str,
}

/// Incremental progress reported by the engine while it works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate<'a> {
    pub status: &'a str,
    /// 0–100 within the current call.
    pub percent: u8,
}

/// Abstraction over an OCR backend.
/// Implementations accept raw PNG/JPEG image bytes and return the recognized text.
pub trait OcrBackend: Send + Sync {
    fn recognize(
        &self,
        request: &RecognitionRequest<'_>,
        progress: &dyn Fn(ProgressUpdate<'_>),
    ) -> Result<String, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns pre-set text, optionally per region label. Exercises
/// the pipeline without Tesseract installed.
pub struct MockRecognizer {
    pub text: String,
    by_label: HashMap<String, String>,
    failure: Option<String>,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            by_label: HashMap::new(),
            failure: None,
            failures_left: AtomicUsize::new(0),
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Text returned for a specific region label instead of the default.
    pub fn with_region(mut self, label: &str, text: impl Into<String>) -> Self {
        self.by_label.insert(label.to_string(), text.into());
        self
    }

    /// Every call fails with `message`.
    pub fn failing(self, message: impl Into<String>) -> Self {
        self.failing_times(usize::MAX, message)
    }

    /// The first `times` calls fail with `message`, later calls succeed.
    pub fn failing_times(mut self, times: usize, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self.failures_left = AtomicUsize::new(times);
        self
    }

    /// Block each call for `delay` to simulate a slow engine.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Labels of every call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Option<String> {
        let message = self.failure.as_ref()?;
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| message.clone())
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(
        &self,
        request: &RecognitionRequest<'_>,
        progress: &dyn Fn(ProgressUpdate<'_>),
    ) -> Result<String, OcrError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.label.to_string());
        }
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        progress(ProgressUpdate { status: "recognizing text", percent: 0 });
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        progress(ProgressUpdate { status: "recognizing text", percent: 50 });

        let result = match self.take_failure() {
            Some(message) => Err(OcrError::Engine(message)),
            None => {
                progress(ProgressUpdate { status: "recognizing text", percent: 100 });
                Ok(self.by_label.get(request.label).unwrap_or(&self.text).clone())
            }
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError, ProgressUpdate, RecognitionRequest};
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>) -> Self {
            Self { data_path }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(
            &self,
            request: &RecognitionRequest<'_>,
            progress: &dyn Fn(ProgressUpdate<'_>),
        ) -> Result<String, OcrError> {
            progress(ProgressUpdate { status: "initializing api", percent: 0 });
            let mut lt = LepTess::new(self.data_path.as_deref(), request.languages)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(request.image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            progress(ProgressUpdate { status: "recognizing text", percent: 10 });
            let text = lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))?;
            progress(ProgressUpdate { status: "recognizing text", percent: 100 });
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn request<'a>(label: &'a str) -> RecognitionRequest<'a> {
        RecognitionRequest { image_bytes: b"fake image data", languages: "eng", label }
    }

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("GOVERNMENT OF INDIA\nArun Kumar");
        assert_eq!(
            r.recognize(&request("detect"), &|_| {}).unwrap(),
            "GOVERNMENT OF INDIA\nArun Kumar"
        );
    }

    #[test]
    fn mock_prefers_region_text() {
        let r = MockRecognizer::new("default").with_region("number", "1234 5678 9012");
        assert_eq!(r.recognize(&request("number"), &|_| {}).unwrap(), "1234 5678 9012");
        assert_eq!(r.recognize(&request("details"), &|_| {}).unwrap(), "default");
        assert_eq!(r.calls(), vec!["number", "details"]);
    }

    #[test]
    fn mock_reports_increasing_progress() {
        let seen = RefCell::new(Vec::new());
        let r = MockRecognizer::new("hello");
        r.recognize(&request("x"), &|u| seen.borrow_mut().push(u.percent)).unwrap();
        assert_eq!(*seen.borrow(), vec![0, 50, 100]);
    }

    #[test]
    fn failing_times_recovers() {
        let r = MockRecognizer::new("ok").failing_times(1, "engine busy");
        let err = r.recognize(&request("x"), &|_| {}).unwrap_err();
        assert_eq!(err.user_message(), "engine busy");
        assert_eq!(r.recognize(&request("x"), &|_| {}).unwrap(), "ok");
    }

    #[test]
    fn user_message_is_verbatim_for_engine_errors() {
        let err = OcrError::Engine("Failed loading language 'tam'".into());
        assert_eq!(err.user_message(), "Failed loading language 'tam'");
        assert!(err.is_retryable());
        assert!(!OcrError::Cancelled.is_retryable());
    }
}
