//! Per-session processing chains
//!
//! A chain is a transport source followed by an ordered list of
//! `FrameProcessor` stages. The `PipelineAssembler` builds one from a
//! session's `PipelineConfig` using provider stages registered in a
//! `StageRegistry`; the `PipelineExecutor` runs it as a task until the caller
//! hangs up, a stage faults, or the session is ended.

mod assembler;
mod context;
mod executor;
mod frame;
mod processor;
mod providers;
mod stages;

pub use assembler::{Chain, PipelineAssembler};
pub use context::{ContextMessage, ConversationContext};
pub use executor::{ChainControl, ChainExit, ChainHandle, PipelineExecutor};
pub use frame::{AudioChunk, Frame, Usage};
pub use processor::{FrameProcessor, FrameSource};
pub use providers::{DialogueFactory, StageFactory, StageRegistry};
pub use stages::{ContextAppend, TranscriptCapture, TransportInput, TransportOutput};
