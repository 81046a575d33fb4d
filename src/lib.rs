pub mod app;
pub mod completion;
pub mod config;
pub mod cost;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod transcript;
pub mod transport;

pub use app::App;
pub use completion::{
    CallRecord, CallResults, CallStore, CompletionCoordinator, CompletionSummary, Extractor,
    MemoryCallStore, MemoryResultsStore, ResultsStore, RetryPolicy,
};
pub use config::Config;
pub use cost::{CostBreakdown, CostEstimator, CostRequest};
pub use error::{SessionError, SessionResult};
pub use http::{create_router, AppState};
pub use orchestrator::{OrchestratorParts, SessionOrchestrator, SessionStatus, StartedSession};
pub use pipeline::{Frame, FrameProcessor, PipelineAssembler, PipelineExecutor, StageRegistry};
pub use prompt::CallRequest;
pub use session::{PipelineConfig, ProviderSelection, SessionRegistry, TransportKind};
pub use transport::{
    ConnectionInfo, SocketHub, TransportError, TransportRegistry, TransportStrategy,
};
