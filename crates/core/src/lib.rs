pub mod config;
pub mod document;
pub mod export;
pub mod record;

pub use config::{
    CacheConfig, ConfigError, Enhancement, PlanConfig, ProgressConfig, RecognitionConfig,
    RectRatio, RegionPlan, RegionSpec, ScanConfig,
};
pub use document::{DocumentType, FieldKind};
pub use export::{export_file_name, export_record, render, ExportError, ExportFormat};
pub use record::{
    ExtractedRecord, FieldValue, QualityBucket, QualityPolicy, RecognitionResult, NOT_FOUND,
};
