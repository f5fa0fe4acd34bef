use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use idscan_core::{export_record, render, ExportFormat, ExtractedRecord, QualityBucket, ScanConfig};
use idscan_ocr::{
    MockRecognizer, OcrBackend, OcrError, PipelineState, ProgressUpdate, RecognitionRequest,
    ScanPipeline,
};
use idscan_storage::{ResultCache, SqliteStore};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const CONFIG_FILE: &str = "idscan.toml";

/// The OCR engine picked on the command line.
pub enum Engine {
    Mock(MockRecognizer),
    #[cfg(feature = "tesseract")]
    Tesseract(idscan_ocr::TesseractRecognizer),
}

impl Engine {
    /// Scripted text wins; otherwise Tesseract when compiled in.
    pub fn select(mock_text: Option<String>, tessdata: Option<String>) -> Result<Self, OcrError> {
        if let Some(text) = mock_text {
            return Ok(Engine::Mock(MockRecognizer::new(text.replace("\\n", "\n"))));
        }
        #[cfg(feature = "tesseract")]
        {
            Ok(Engine::Tesseract(idscan_ocr::TesseractRecognizer::new(tessdata)))
        }
        #[cfg(not(feature = "tesseract"))]
        {
            let _ = tessdata;
            Err(OcrError::NotAvailable)
        }
    }
}

impl OcrBackend for Engine {
    fn recognize(
        &self,
        request: &RecognitionRequest<'_>,
        progress: &dyn Fn(ProgressUpdate<'_>),
    ) -> Result<String, OcrError> {
        match self {
            Engine::Mock(mock) => mock.recognize(request, progress),
            #[cfg(feature = "tesseract")]
            Engine::Tesseract(tesseract) => tesseract.recognize(request, progress),
        }
    }
}

/// `--config` if given, else `idscan.toml` in `config_dir` when present, else defaults.
pub fn load_config(explicit: Option<&Path>, config_dir: &Path) -> Result<ScanConfig> {
    if let Some(path) = explicit {
        return ScanConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }
    let default_path = config_dir.join(CONFIG_FILE);
    if default_path.is_file() {
        info!(path = %default_path.display(), "using configuration file");
        return ScanConfig::load(&default_path)
            .with_context(|| format!("Failed to load configuration from {}", default_path.display()));
    }
    Ok(ScanConfig::default())
}

/// Open the result cache. A cache that cannot be opened only disables caching.
pub async fn open_cache(path: &Path, config: &ScanConfig) -> Option<ResultCache<SqliteStore>> {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(error = %e, "cannot create data directory, caching disabled");
            return None;
        }
    }
    match SqliteStore::open(path).await {
        Ok(store) => Some(ResultCache::from_config(store, &config.cache)),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "cannot open result cache, caching disabled");
            None
        }
    }
}

pub struct ScanOptions {
    pub image: PathBuf,
    pub export: Option<PathBuf>,
    pub format: ExportFormat,
}

pub async fn scan(
    engine: Engine,
    config: ScanConfig,
    cache: Option<&ResultCache<SqliteStore>>,
    options: ScanOptions,
) -> Result<()> {
    let pipeline = ScanPipeline::new(engine, config);
    let printer = spawn_progress_printer(pipeline.subscribe());

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling scan");
                cancel.cancel();
            }
        })
    };

    let result = pipeline.process_file(&options.image, &cancel).await;
    interrupt.abort();
    // The printer exits on the terminal state; don't hang if it was missed.
    let _ = tokio::time::timeout(Duration::from_millis(250), printer).await;

    let outcome = result.map_err(|e| anyhow!("Scan failed: {}", e.user_message()))?;
    print!("{}", format_record(&outcome.record, Some(outcome.quality)));

    if let Some(cache) = cache {
        cache.save(&outcome.record).await;
    }
    if let Some(dir) = options.export {
        let path = export_record(&outcome.record, &dir, options.format, Utc::now().timestamp_millis())
            .with_context(|| format!("Failed to export record to {}", dir.display()))?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

pub async fn show_last(cache: Option<&ResultCache<SqliteStore>>, json: bool) -> Result<()> {
    let Some(cached) = (match cache {
        Some(cache) => cache.load().await,
        None => None,
    }) else {
        println!("No cached scan.");
        return Ok(());
    };

    if json {
        println!("{}", render(&cached.record, ExportFormat::Json)?);
        return Ok(());
    }
    let saved = chrono::DateTime::from_timestamp_millis(cached.saved_at_epoch_millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| cached.saved_at_epoch_millis.to_string());
    println!("Scanned at {saved}");
    print!("{}", format_record(&cached.record, None));
    Ok(())
}

/// Stage/progress lines on stderr until the run ends.
fn spawn_progress_printer(mut rx: watch::Receiver<PipelineState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            eprintln!("[{:>3}%] {}", state.progress_percent, state.stage);
            if state.stage.is_terminal() {
                break;
            }
        }
    })
}

/// Human-readable field listing in the document type's field order.
pub fn format_record(record: &ExtractedRecord, quality: Option<QualityBucket>) -> String {
    let fields = record.fields();
    let mut out = String::new();
    let _ = write!(out, "{}", record.doc_type.label());
    if let Some(quality) = quality {
        let _ = write!(out, " ({quality}, {}/{} fields)", record.found_count(), fields.len());
    }
    out.push('\n');
    for (kind, value) in &fields {
        let _ = writeln!(out, "  {:<11} {}", kind.key(), value);
    }
    out
}
