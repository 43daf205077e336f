pub mod captcha_solver;
pub mod content_analyzer;
pub mod csv_sink;
pub mod llm_service;
pub mod snapshot_writer;
pub mod status_endpoint;

pub use captcha_solver::{read_operator_input, CaptchaSolver, SolveCaptcha};
pub use content_analyzer::{AnalyzeContent, ContentAnalyzer, ANALYSIS_FAILED};
pub use csv_sink::CsvSink;
pub use llm_service::LlmService;
pub use snapshot_writer::SnapshotWriter;
pub use status_endpoint::StatusEndpoint;
