use crate::audio::{AudioFormat, EncoderPort, Frame};
use crate::error::ProcessError;
use crate::messages::{Request, RequestId, Response};
use crate::processor::RecorderProcessor;
use crate::state::RecordingState;
use anyhow::Result;
use ringbuf::traits::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};

/// Supplies input blocks to the render loop
pub trait BlockSource {
    /// Inputs for the next block, or `None` while no full block is available.
    fn next_block(&mut self) -> Option<Vec<Frame>>;

    /// Wait before polling again
    fn wait(&mut self);
}

/// Cuts the interleaved capture ring into fixed-size, deinterleaved blocks
///
/// Once the capture stream is disconnected and the ring holds less than a
/// block, a zero-channel block is produced.
pub struct RingBlockSource<C: Consumer<Item = f32>> {
    consumer: C,
    connected: Arc<AtomicBool>,
    format: AudioFormat,
    scratch: Vec<f32>,
}

impl<C: Consumer<Item = f32>> RingBlockSource<C> {
    pub fn new(consumer: C, connected: Arc<AtomicBool>, format: AudioFormat) -> Self {
        Self {
            consumer,
            connected,
            format,
            scratch: vec![0.0; format.samples_per_block()],
        }
    }
}

impl<C: Consumer<Item = f32>> BlockSource for RingBlockSource<C> {
    fn next_block(&mut self) -> Option<Vec<Frame>> {
        if self.consumer.occupied_len() >= self.scratch.len() {
            let n = self.consumer.pop_slice(&mut self.scratch);
            let frame = deinterleave(&self.scratch[..n], self.format.channels as usize);
            return Some(vec![frame]);
        }

        if !self.connected.load(Ordering::Acquire) {
            return Some(vec![Frame::new()]);
        }

        None
    }

    fn wait(&mut self) {
        std::thread::sleep(self.format.block_duration() / 2);
    }
}

fn deinterleave(samples: &[f32], channels: usize) -> Frame {
    (0..channels)
        .map(|channel| samples.iter().skip(channel).step_by(channels).copied().collect())
        .collect()
}

/// Host side of the recorder: drives the processor once per block
///
/// Queued commands are answered between blocks, never during one.
pub struct RecorderNode<P: EncoderPort> {
    processor: RecorderProcessor<P>,
    commands: mpsc::Receiver<Request<P>>,
    responses: mpsc::UnboundedSender<Response>,
    finished: Option<oneshot::Sender<RecordingState>>,
}

/// Create a connected controller handle and node
pub fn recorder_channel<P: EncoderPort>(capacity: usize) -> (RecorderHandle<P>, RecorderNode<P>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
    let (resp_tx, resp_rx) = mpsc::unbounded_channel();

    let handle = RecorderHandle::new(cmd_tx, resp_rx);
    let node = RecorderNode {
        processor: RecorderProcessor::new(),
        commands: cmd_rx,
        responses: resp_tx,
        finished: None,
    };
    (handle, node)
}

impl<P: EncoderPort> RecorderNode<P> {
    pub fn state(&self) -> RecordingState {
        self.processor.state()
    }

    /// Resolves with the final state once the render loop stops taking blocks,
    /// before late commands are answered.
    pub fn finished(&mut self) -> oneshot::Receiver<RecordingState> {
        let (tx, rx) = oneshot::channel();
        self.finished = Some(tx);
        rx
    }

    /// Answer every command queued since the last block
    pub fn drain_commands(&mut self) {
        while let Ok(request) = self.commands.try_recv() {
            self.dispatch(request);
        }
    }

    fn dispatch(&mut self, request: Request<P>) {
        if let Some(response) = self.processor.handle_message(request) {
            if self.responses.send(response).is_err() {
                tracing::debug!("Controller is gone, dropping response");
            }
        }
    }

    /// Answer pending commands, then process one block
    pub fn render(&mut self, inputs: &mut [Frame]) -> Result<bool, ProcessError> {
        self.drain_commands();
        self.processor.process(inputs)
    }

    /// Render blocks until the processor no longer wants them.
    ///
    /// Afterwards commands keep being answered until every handle is dropped,
    /// so that late requests still get their reply.
    pub fn run<S: BlockSource>(mut self, mut source: S) -> Result<(), ProcessError> {
        tracing::debug!("Render loop started");

        let result = loop {
            self.drain_commands();
            if self.processor.state().is_terminal() {
                break Ok(());
            }

            let Some(mut inputs) = source.next_block() else {
                source.wait();
                continue;
            };

            match self.processor.process(&mut inputs) {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(e) => {
                    tracing::error!("Block processing failed: {}", e);
                    break Err(e);
                }
            }
        };

        tracing::info!("Render loop finished in state {}", self.processor.state());
        if let Some(finished) = self.finished.take() {
            let _ = finished.send(self.processor.state());
        }

        while let Some(request) = self.commands.blocking_recv() {
            self.dispatch(request);
        }

        result
    }
}

/// Handle for communicating with the RecorderNode
pub struct RecorderHandle<P> {
    tx: mpsc::Sender<Request<P>>,
    rx: mpsc::UnboundedReceiver<Response>,
    next_id: RequestId,
}

impl<P> RecorderHandle<P> {
    fn new(tx: mpsc::Sender<Request<P>>, rx: mpsc::UnboundedReceiver<Response>) -> Self {
        Self { tx, rx, next_id: 1 }
    }

    fn next_id(&mut self) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub async fn record(&mut self, destination: P) -> Result<()> {
        let id = self.next_id();
        self.call(Request::record(id, destination)).await
    }

    pub async fn pause(&mut self) -> Result<()> {
        let id = self.next_id();
        self.call(Request::pause(id)).await
    }

    pub async fn resume(&mut self) -> Result<()> {
        let id = self.next_id();
        self.call(Request::resume(id)).await
    }

    pub async fn stop(&mut self) -> Result<()> {
        let id = self.next_id();
        self.call(Request::stop(id)).await
    }

    async fn call(&mut self, request: Request<P>) -> Result<()> {
        let id = request.id;
        let method = request.method.clone();

        self.tx
            .send(request)
            .await
            .map_err(|_| anyhow::anyhow!("Failed to send {} command: recorder is gone", method))?;

        loop {
            let response = self.rx.recv().await.ok_or_else(|| {
                anyhow::anyhow!("Failed to receive {} response: recorder is gone", method)
            })?;

            if response.id() != id {
                tracing::warn!("Discarding response with unexpected id {:?}", response.id());
                continue;
            }

            return response.into_result().map_err(|e| {
                anyhow::anyhow!("Recorder rejected {} ({}): {}", method, e.code, e.message)
            });
        }
    }
}
