//! Session state and lifecycle tracking
//!
//! This module provides:
//! - `PipelineConfig`: immutable provider/transport choices for a session
//! - `Session`: persisted record plus runtime-only handles
//! - `SessionRegistry`: active/completed partitions and the maintenance sweep

mod config;
mod registry;
mod session;
mod stats;

pub use config::{PipelineConfig, ProviderSelection, TransportKind};
pub use registry::SessionRegistry;
pub use session::{LaunchState, Session, SessionRecord, SessionRuntime};
pub use stats::{Role, SessionMetrics, TranscriptEntry};
