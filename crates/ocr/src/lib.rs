/// Lazily compiled regex behind a function, so each pattern compiles once.
macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod classify;
pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod profile;
pub mod progress;
pub mod recognizer;

pub use classify::{classify, classify_with_signal};
pub use extract::{detect_name_line, sanitize_dob, Evaluation, FieldRules, Rule};
pub use pipeline::{PipelineError, ScanOutcome, ScanPipeline};
pub use preprocess::{ImagePrimitive, PreprocessError, RasterOps};
pub use profile::DocumentProfile;
pub use progress::{PipelineState, ProgressSchedule, ProgressTracker, Stage};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, ProgressUpdate, RecognitionRequest};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
