use crate::error::PortError;
use tokio::sync::mpsc;

/// Samples of one channel for one block
pub type ChannelData = Vec<f32>;

/// Ordered channel buffers of one block. An empty frame marks end-of-stream.
pub type Frame = Vec<ChannelData>;

/// Outbound endpoint towards the encoding stage
///
/// Posting must never block: it runs inside the block callback.
pub trait EncoderPort {
    /// Hand a frame to the consumer. The frame is moved, not copied.
    fn post(&mut self, frame: Frame) -> Result<(), PortError>;

    /// Release the endpoint. Nothing is posted afterwards.
    fn close(&mut self);

    /// Whether buffers can be handed over by ownership. When false the
    /// forwarder keeps the host's buffers and posts a copy.
    fn supports_transfer(&self) -> bool {
        true
    }
}

/// Encoder port backed by a bounded tokio channel
#[derive(Debug)]
pub struct ChannelPort {
    tx: Option<mpsc::Sender<Frame>>,
}

impl ChannelPort {
    pub fn new(tx: mpsc::Sender<Frame>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Create a port together with the receiving end the consumer drains
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().is_none_or(|tx| tx.is_closed())
    }
}

impl EncoderPort for ChannelPort {
    fn post(&mut self, frame: Frame) -> Result<(), PortError> {
        let tx = self.tx.as_ref().ok_or(PortError::Closed)?;
        tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PortError::Full,
            mpsc::error::TrySendError::Closed(_) => PortError::Closed,
        })
    }

    fn close(&mut self) {
        // Dropping the sender lets the receiver observe the end of the channel
        self.tx = None;
    }
}

/// Exclusively owned destination of forwarded audio
///
/// Released exactly once through [`Destination::release`], which consumes the
/// value. A destination dropped without release closes its port but sends no
/// end-of-stream frame.
#[derive(Debug)]
pub struct Destination<P: EncoderPort> {
    port: Option<P>,
}

impl<P: EncoderPort> Destination<P> {
    pub fn new(port: P) -> Self {
        Self { port: Some(port) }
    }

    /// Forward the block's channel buffers.
    ///
    /// With transfer support `input` is left empty and the host must supply
    /// fresh buffers for the next block.
    pub fn forward(&mut self, input: &mut Frame) {
        let Some(port) = self.port.as_mut() else {
            return;
        };

        let frame = if port.supports_transfer() {
            std::mem::take(input)
        } else {
            input.clone()
        };

        if let Err(e) = port.post(frame) {
            tracing::warn!("Failed to forward block to encoder port: {}", e);
        }
    }

    /// Send the end-of-stream frame, then close the port.
    pub fn release(mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.post(Frame::new()) {
                tracing::warn!("Failed to send end-of-stream to encoder port: {}", e);
            }
            port.close();
        }
    }
}

impl<P: EncoderPort> Drop for Destination<P> {
    fn drop(&mut self) {
        if let Some(mut port) = self.port.take() {
            tracing::debug!("Destination dropped before release, closing encoder port");
            port.close();
        }
    }
}
