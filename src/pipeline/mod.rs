pub mod artifact;
pub mod canonical;
pub mod datasets;
pub mod encoding;
pub mod extract;
pub mod loader;
pub mod orchestrator;
pub mod output;
pub mod processor;
pub mod quality;
pub mod rules;
pub mod sink;

pub use artifact::{assemble_artifact, ArtifactError, TrainingArtifact};
pub use datasets::{DatasetKind, RawDatasets};
pub use encoding::{build_encodings, EncodingError};
pub use extract::{extract_list, extract_named_list, ExtractionError};
pub use loader::{load_raw_datasets, LoadError};
pub use orchestrator::{DataPipeline, PipelineError, PipelineOutput, PipelineStage, RunReport};
pub use output::{create_backup, write_processed, OutputError};
pub use processor::ProcessingError;
pub use quality::{QualityGate, QualityGateError};
pub use rules::{build_rule_maps, RuleMaps};
pub use sink::{persist_output, InMemorySink, RecordSink, SinkError};
