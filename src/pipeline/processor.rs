use anyhow::Result;
use async_trait::async_trait;

use super::frame::Frame;

/// A stage in a session chain.
///
/// Each call receives one frame and returns the frames to hand to the next
/// stage: the same frame (forward), replacements (transform), or the frame
/// plus extras (tap-and-forward). Returning an error faults the whole chain.
#[async_trait]
pub trait FrameProcessor: Send {
    /// Stage name for logging and chain introspection
    fn name(&self) -> &str;

    async fn process(&mut self, frame: Frame) -> Result<Vec<Frame>>;
}

/// Head of a chain: yields frames until the transport closes
#[async_trait]
pub trait FrameSource: Send {
    fn name(&self) -> &str;

    /// Next inbound frame, or `None` once the far end hung up
    async fn next_frame(&mut self) -> Option<Frame>;
}
