use crate::audio::port::{Destination, EncoderPort, Frame};
use crate::error::{ProcessError, ProtocolError};
use crate::messages::{Method, RecordParams, Request, Response};
use crate::state::RecordingState;

/// Per-block recorder core
///
/// Answers control requests and forwards input blocks to the destination
/// received with `record`. Both entry points run on the render thread and
/// are never interleaved mid-call, so the state needs no locking.
///
/// `process` neither blocks nor allocates: forwarded buffers are moved to the
/// destination and the end-of-stream frame is an empty `Vec`.
pub struct RecorderProcessor<P: EncoderPort> {
    state: RecordingState,
    destination: Option<Destination<P>>,
}

impl<P: EncoderPort> Default for RecorderProcessor<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: EncoderPort> RecorderProcessor<P> {
    pub fn new() -> Self {
        Self {
            state: RecordingState::Inactive,
            destination: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn has_destination(&self) -> bool {
        self.destination.is_some()
    }

    /// Apply one request and build its reply.
    ///
    /// Returns `None` only for an unsupported method without an id, which
    /// cannot be answered.
    pub fn handle_message(&mut self, request: Request<P>) -> Option<Response> {
        let Request { id, method, params } = request;

        let method = match method.parse::<Method>() {
            Ok(method) => method,
            Err(err) => {
                let Some(id) = id else {
                    tracing::debug!("Ignoring unsupported method {:?} without an id", method);
                    return None;
                };
                tracing::debug!("Rejecting unsupported method {:?}", method);
                return Some(Response::failure(Some(id), err));
            }
        };

        let response = match self.apply(method, params) {
            Ok(()) => Response::success(id),
            Err(err) => {
                tracing::debug!(
                    "Rejecting {} in state {}: {}",
                    method.as_str(),
                    self.state,
                    err
                );
                Response::failure(id, err)
            }
        };

        Some(response)
    }

    fn apply(
        &mut self,
        method: Method,
        params: Option<RecordParams<P>>,
    ) -> Result<(), ProtocolError> {
        use RecordingState::*;

        match (self.state, method) {
            (Inactive, Method::Record) => {
                let params = params.ok_or(ProtocolError::InvalidParams)?;
                self.destination = Some(Destination::new(params.destination));
                self.transition(Active);
            }
            (Active | Recording, Method::Pause) => self.transition(Paused),
            (Paused, Method::Resume) => self.transition(Active),
            (Active | Recording | Paused, Method::Stop) => self.terminate(),
            _ => return Err(ProtocolError::InvalidState),
        }

        Ok(())
    }

    /// Handle one block of the first input.
    ///
    /// `inputs[0]` holds the first input's channel buffers. A missing first
    /// input is a host fault while audio is expected; zero channels is a
    /// normal condition. Returns whether the node wants the next block.
    pub fn process(&mut self, inputs: &mut [Frame]) -> Result<bool, ProcessError> {
        match self.state {
            RecordingState::Inactive | RecordingState::Paused => return Ok(true),
            RecordingState::Stopped => return Ok(false),
            RecordingState::Active => {
                let input = inputs.first().ok_or(ProcessError::MissingInput)?;
                if input.is_empty() {
                    return Ok(true);
                }
                self.transition(RecordingState::Recording);
            }
            RecordingState::Recording => {}
        }

        let input = inputs.first_mut().ok_or(ProcessError::MissingInput)?;

        if input.is_empty() {
            // Upstream went away
            self.terminate();
            return Ok(false);
        }

        match self.destination.as_mut() {
            Some(destination) => {
                destination.forward(input);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn terminate(&mut self) {
        match self.destination.take() {
            Some(destination) => destination.release(),
            None => tracing::error!("Terminating in state {} without a destination", self.state),
        }
        self.transition(RecordingState::Stopped);
    }

    fn transition(&mut self, next: RecordingState) {
        tracing::debug!("Recorder state {} -> {}", self.state, next);
        self.state = next;
        debug_assert_eq!(
            self.state.holds_destination(),
            self.destination.is_some(),
            "destination must be held exactly while active, recording or paused"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    enum PortEvent {
        Post(Frame),
        Close,
    }

    #[derive(Clone, Default)]
    struct SpyPort {
        events: Rc<RefCell<Vec<PortEvent>>>,
    }

    impl SpyPort {
        fn events(&self) -> std::cell::Ref<'_, Vec<PortEvent>> {
            self.events.borrow()
        }
    }

    impl EncoderPort for SpyPort {
        fn post(&mut self, frame: Frame) -> Result<(), PortError> {
            self.events.borrow_mut().push(PortEvent::Post(frame));
            Ok(())
        }

        fn close(&mut self) {
            self.events.borrow_mut().push(PortEvent::Close);
        }
    }

    fn invalid_state(id: i64) -> Option<Response> {
        Some(Response::failure(Some(id), ProtocolError::InvalidState))
    }

    fn recording(port: &SpyPort) -> RecorderProcessor<SpyPort> {
        let mut processor = RecorderProcessor::new();
        processor.handle_message(Request::record(1, port.clone()));
        processor
    }

    fn stereo_block() -> Vec<Frame> {
        vec![vec![vec![1.0; 128], vec![-1.0; 128]]]
    }

    #[test]
    fn stop_before_record_is_rejected() {
        let mut processor = RecorderProcessor::<SpyPort>::new();
        assert_eq!(processor.handle_message(Request::stop(34)), invalid_state(34));
        assert_eq!(processor.state(), RecordingState::Inactive);
    }

    #[test]
    fn record_attaches_destination() {
        let port = SpyPort::default();
        let mut processor = RecorderProcessor::new();

        let response = processor.handle_message(Request::record(34, port.clone()));

        assert_eq!(response, Some(Response::success(Some(34))));
        assert_eq!(processor.state(), RecordingState::Active);
        assert!(processor.has_destination());
        assert!(port.events().is_empty());
    }

    #[test]
    fn record_without_destination_is_invalid_params() {
        let mut processor = RecorderProcessor::<SpyPort>::new();
        let response = processor.handle_message(Request::new(Some(2), "record"));
        assert_eq!(
            response,
            Some(Response::failure(Some(2), ProtocolError::InvalidParams))
        );
        assert_eq!(processor.state(), RecordingState::Inactive);
    }

    #[test]
    fn second_record_is_rejected() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        let response = processor.handle_message(Request::record(35, SpyPort::default()));
        assert_eq!(response, invalid_state(35));
        assert_eq!(processor.state(), RecordingState::Active);
    }

    #[test]
    fn stop_sends_sentinel_then_closes() {
        let port = SpyPort::default();
        let mut processor = recording(&port);

        let response = processor.handle_message(Request::stop(35));

        assert_eq!(response, Some(Response::success(Some(35))));
        assert_eq!(
            *port.events(),
            vec![PortEvent::Post(Frame::new()), PortEvent::Close]
        );
        assert_eq!(processor.state(), RecordingState::Stopped);
        assert!(!processor.has_destination());

        assert_eq!(processor.handle_message(Request::stop(36)), invalid_state(36));
        assert_eq!(port.events().len(), 2);
    }

    #[test]
    fn transition_table_rejects_unlisted_pairs() {
        let port = SpyPort::default();
        let mut processor = RecorderProcessor::new();
        assert_eq!(processor.handle_message(Request::pause(1)), invalid_state(1));
        assert_eq!(processor.handle_message(Request::resume(2)), invalid_state(2));

        processor.handle_message(Request::record(3, port.clone()));
        assert_eq!(processor.handle_message(Request::resume(4)), invalid_state(4));

        processor.handle_message(Request::pause(5));
        assert_eq!(processor.state(), RecordingState::Paused);
        assert_eq!(processor.handle_message(Request::pause(6)), invalid_state(6));
        assert_eq!(
            processor.handle_message(Request::record(7, SpyPort::default())),
            invalid_state(7)
        );

        processor.handle_message(Request::resume(8));
        assert_eq!(processor.state(), RecordingState::Active);
        assert!(port.events().is_empty());
    }

    #[test]
    fn stop_while_paused_sends_sentinel_then_closes() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        processor.process(&mut [vec![vec![0.5; 4]]]).expect("process block");
        processor.handle_message(Request::pause(3));

        let response = processor.handle_message(Request::stop(4));

        assert_eq!(response, Some(Response::success(Some(4))));
        assert_eq!(
            *port.events(),
            vec![
                PortEvent::Post(vec![vec![0.5; 4]]),
                PortEvent::Post(Frame::new()),
                PortEvent::Close
            ]
        );
        assert_eq!(processor.state(), RecordingState::Stopped);
        assert!(!processor.has_destination());
    }

    #[test]
    fn resume_while_recording_is_rejected() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        processor.process(&mut stereo_block()).expect("process block");

        assert_eq!(processor.handle_message(Request::resume(5)), invalid_state(5));
        assert_eq!(processor.state(), RecordingState::Recording);
        assert_eq!(port.events().len(), 1);
    }

    #[test]
    fn pause_from_recording() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        processor.process(&mut stereo_block()).expect("process block");
        assert_eq!(processor.state(), RecordingState::Recording);

        assert_eq!(
            processor.handle_message(Request::pause(2)),
            Some(Response::success(Some(2)))
        );
        assert_eq!(processor.state(), RecordingState::Paused);
    }

    #[test]
    fn unknown_method_is_answered_only_with_an_id() {
        let mut processor = RecorderProcessor::<SpyPort>::new();
        assert_eq!(
            processor.handle_message(Request::new(Some(9), "flush")),
            Some(Response::failure(Some(9), ProtocolError::UnknownMethod))
        );
        assert_eq!(processor.handle_message(Request::new(None, "flush")), None);
        assert_eq!(processor.state(), RecordingState::Inactive);
    }

    #[test]
    fn known_method_without_id_still_gets_a_reply() {
        let mut processor = RecorderProcessor::<SpyPort>::new();
        assert_eq!(
            processor.handle_message(Request::new(None, "pause")),
            Some(Response::failure(None, ProtocolError::InvalidState))
        );
    }

    #[test]
    fn inactive_keeps_alive_without_input() {
        let mut processor = RecorderProcessor::<SpyPort>::new();
        assert_eq!(processor.process(&mut []), Ok(true));
    }

    #[test]
    fn missing_input_is_a_fault_once_active() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        assert_eq!(processor.process(&mut []), Err(ProcessError::MissingInput));
    }

    #[test]
    fn missing_input_is_a_fault_while_recording() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        processor.process(&mut stereo_block()).expect("process block");
        assert_eq!(processor.process(&mut []), Err(ProcessError::MissingInput));
        assert_eq!(processor.state(), RecordingState::Recording);
    }

    #[test]
    fn active_waits_for_channels() {
        let port = SpyPort::default();
        let mut processor = recording(&port);

        assert_eq!(processor.process(&mut [Frame::new()]), Ok(true));
        assert_eq!(processor.state(), RecordingState::Active);
        assert!(port.events().is_empty());
    }

    #[test]
    fn first_block_with_channels_is_forwarded() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        let mut inputs = stereo_block();

        assert_eq!(processor.process(&mut inputs), Ok(true));

        assert_eq!(processor.state(), RecordingState::Recording);
        assert_eq!(
            *port.events(),
            vec![PortEvent::Post(vec![vec![1.0; 128], vec![-1.0; 128]])]
        );
        assert!(inputs[0].is_empty());
    }

    #[test]
    fn zero_channels_while_recording_terminates() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        processor.process(&mut stereo_block()).expect("process block");

        assert_eq!(processor.process(&mut [Frame::new()]), Ok(false));

        assert_eq!(processor.state(), RecordingState::Stopped);
        assert_eq!(port.events().len(), 3);
        assert_eq!(port.events()[1], PortEvent::Post(Frame::new()));
        assert_eq!(port.events()[2], PortEvent::Close);
        assert_eq!(processor.process(&mut stereo_block()), Ok(false));
        assert_eq!(port.events().len(), 3);
    }

    #[test]
    fn paused_drops_blocks() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        processor.handle_message(Request::pause(2));

        assert_eq!(processor.process(&mut stereo_block()), Ok(true));
        assert_eq!(processor.process(&mut [Frame::new()]), Ok(true));
        assert_eq!(processor.process(&mut []), Ok(true));
        assert!(port.events().is_empty());
    }

    #[test]
    fn stopped_never_forwards() {
        let port = SpyPort::default();
        let mut processor = recording(&port);
        processor.handle_message(Request::stop(2));

        assert_eq!(processor.process(&mut []), Ok(false));
        assert_eq!(processor.process(&mut stereo_block()), Ok(false));
        assert_eq!(port.events().len(), 2);
    }
}
