//! Scripted in-memory channel for testing.
//!
//! Plays back pre-built responses frame by frame so tests can drive the
//! buffering engine without a server, and can inject transport failures at
//! any point in a response.

use std::collections::VecDeque;

use tabwire_core::channel::{ResponseChannel, TransportError};
use tabwire_core::types::{Frame, PacketRows, Row, Value};

/// One scripted event: either a frame to hand out, or a failure to raise.
#[derive(Debug)]
pub enum ScriptStep {
    Frame(Frame),
    Fail(String),
}

/// In-memory `ResponseChannel` that serves scripted responses in order.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    responses: VecDeque<VecDeque<ScriptStep>>,
    current: Option<VecDeque<ScriptStep>>,
    started: usize,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response as a plain frame sequence.
    pub fn push_response(&mut self, frames: Vec<Frame>) {
        self.responses
            .push_back(frames.into_iter().map(ScriptStep::Frame).collect());
    }

    /// Queue a response with explicit steps (frames and/or failures).
    pub fn push_steps(&mut self, steps: Vec<ScriptStep>) {
        self.responses.push_back(steps.into());
    }

    /// Number of responses started so far (i.e. statements executed).
    pub fn responses_started(&self) -> usize {
        self.started
    }
}

impl ResponseChannel for ScriptedChannel {
    fn start_response(&mut self) -> Result<(), TransportError> {
        if let Some(cur) = &self.current {
            if !cur.is_empty() {
                return Err(TransportError::Protocol(
                    "previous response not fully drained".to_string(),
                ));
            }
        }
        match self.responses.pop_front() {
            Some(frames) => {
                self.current = Some(frames);
                self.started += 1;
                Ok(())
            }
            None => Err(TransportError::Protocol(
                "no scripted response available".to_string(),
            )),
        }
    }

    fn next_frame(&mut self) -> Result<Frame, TransportError> {
        let cur = self
            .current
            .as_mut()
            .ok_or_else(|| TransportError::Protocol("no response in flight".to_string()))?;
        match cur.pop_front() {
            Some(ScriptStep::Frame(frame)) => {
                if matches!(
                    frame,
                    Frame::ResultBoundary {
                        more_results: false
                    }
                ) {
                    self.current = None;
                }
                Ok(frame)
            }
            Some(ScriptStep::Fail(msg)) => Err(TransportError::Protocol(msg)),
            None => Err(TransportError::Protocol(
                "read past end of response".to_string(),
            )),
        }
    }
}

/// Build a rows frame of `count` rows, each accounting `bytes_per_row` wire
/// bytes; the packet byte size includes `header_bytes` of framing overhead.
pub fn rows_frame(count: usize, bytes_per_row: usize, header_bytes: usize) -> Frame {
    let rows = (0..count)
        .map(|i| Row::new(vec![Value::Str(format!("row-{i}"))], bytes_per_row))
        .collect::<Vec<_>>();
    Frame::Rows(PacketRows::new(rows, count * bytes_per_row + header_bytes))
}

/// Boundary ending the current result set with more result sets following.
pub fn more_results_frame() -> Frame {
    Frame::ResultBoundary { more_results: true }
}

/// Boundary ending the response.
pub fn end_frame() -> Frame {
    Frame::ResultBoundary {
        more_results: false,
    }
}
