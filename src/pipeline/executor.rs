use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info};

use super::assembler::Chain;
use super::frame::Frame;
use crate::session::{LaunchState, Session};

/// How a chain task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainExit {
    /// The caller's side closed and the chain drained
    Completed,
    /// The chain was aborted by an explicit end
    Cancelled,
    /// A stage failed or panicked
    Faulted(String),
}

/// Control over a running chain, kept on the session runtime
pub struct ChainControl {
    abort: AbortHandle,
    exited: watch::Receiver<Option<ChainExit>>,
}

impl ChainControl {
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }

    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Resolves once the chain's exit has been observed
    pub async fn exited(&self) -> ChainExit {
        wait_for_exit(self.exited.clone()).await
    }
}

/// Owner of a launched chain task
pub struct ChainHandle {
    session: Arc<Session>,
    join: JoinHandle<Result<()>>,
    exit_tx: watch::Sender<Option<ChainExit>>,
}

impl ChainHandle {
    /// Wait for the chain to end, however it ends.
    ///
    /// Faults are logged and reported as `ChainExit::Faulted`, never raised.
    pub async fn wait(self) -> ChainExit {
        let session_id = self.session.id().to_string();

        let exit = match self.join.await {
            Ok(Ok(())) => {
                info!("Pipeline for session {} completed", session_id);
                ChainExit::Completed
            }
            Ok(Err(e)) => {
                error!("Pipeline error for session {}: {:#}", session_id, e);
                ChainExit::Faulted(format!("{:#}", e))
            }
            Err(e) if e.is_cancelled() => {
                info!("Pipeline cancelled for session {}", session_id);
                ChainExit::Cancelled
            }
            Err(e) => {
                error!("Pipeline task for session {} panicked: {}", session_id, e);
                ChainExit::Faulted(format!("pipeline task panicked: {}", e))
            }
        };

        // Clear before publishing: an empty slot means the task has exited.
        self.session.runtime().await.chain.take();
        self.exit_tx.send_replace(Some(exit.clone()));

        exit
    }
}

/// Runs assembled chains as tokio tasks
#[derive(Debug, Clone, Default)]
pub struct PipelineExecutor;

impl PipelineExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Spawn the chain and record its control on the session runtime
    pub async fn launch(&self, chain: Chain, session: &Arc<Session>) -> ChainHandle {
        let (exit_tx, exited) = watch::channel(None);

        // Hold the runtime lock across spawn so the control is in place before
        // the task can finish and clear it.
        let mut runtime = session.runtime().await;
        let join = tokio::spawn(drive(chain, session.clone()));
        runtime.chain = Some(ChainControl {
            abort: join.abort_handle(),
            exited,
        });
        drop(runtime);
        session.mark_launched();

        debug!("Launched pipeline for session {}", session.id());

        ChainHandle {
            session: session.clone(),
            join,
            exit_tx,
        }
    }

    /// Run the chain to its end
    pub async fn run(&self, chain: Chain, session: &Arc<Session>) -> ChainExit {
        self.launch(chain, session).await.wait().await
    }

    /// Cancel the session's running chain, if any, and wait for it to stop.
    ///
    /// A session still starting is waited on until its chain is launched.
    /// Concurrent callers all wait for the same exit.
    pub async fn cancel(&self, session: &Session) -> Option<ChainExit> {
        if session.launch_settled().await == LaunchState::Abandoned {
            debug!("Session {} was never launched", session.id());
            return None;
        }

        let exited = {
            let runtime = session.runtime().await;
            let control = runtime.chain.as_ref()?;
            info!("Cancelling pipeline for session {}", session.id());
            control.abort();
            control.exited.clone()
        };
        Some(wait_for_exit(exited).await)
    }
}

async fn wait_for_exit(mut exited: watch::Receiver<Option<ChainExit>>) -> ChainExit {
    loop {
        if let Some(exit) = exited.borrow().clone() {
            return exit;
        }
        if exited.changed().await.is_err() {
            // The owning handle went away without reporting
            return ChainExit::Cancelled;
        }
    }
}

async fn drive(mut chain: Chain, session: Arc<Session>) -> Result<()> {
    info!(
        "Pipeline for session {} running: {}",
        session.id(),
        chain.stage_names().join(" -> ")
    );

    while let Some(frame) = chain.source.next_frame().await {
        let mut frames = vec![frame];

        for stage in chain.stages.iter_mut() {
            let mut produced = Vec::with_capacity(frames.len());
            for frame in frames {
                let out = stage
                    .process(frame)
                    .await
                    .with_context(|| format!("Stage '{}' failed", stage.name()))?;
                produced.extend(out);
            }
            frames = produced;
            if frames.is_empty() {
                break;
            }
        }

        for frame in frames {
            if let Frame::Usage(usage) = frame {
                session.add_usage(usage).await;
            }
        }
    }

    debug!("Transport input for session {} closed", session.id());
    Ok(())
}
