//! Server-sent event aggregation for streamed chat completions.
//!
//! The reply is requested as a stream but only the final text is used, so
//! this folds every `delta.content` into one string.

use crate::error::RemoteCallFailure;
use serde::Deserialize;

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    #[serde(default)]
    message: String,
}

/// Accumulates a streamed reply from raw response chunks.
///
/// Chunks may split lines (and multi-byte characters) anywhere; bytes are
/// buffered until a full line is available.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    buffer: Vec<u8>,
    text: String,
    done: bool,
}

impl SseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of the response body
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<(), RemoteCallFailure> {
        if self.done {
            return Ok(());
        }
        self.buffer.extend_from_slice(chunk);

        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            self.process_line(&String::from_utf8_lossy(&line))?;
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        Ok(())
    }

    /// Whether the `[DONE]` marker has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Flush any unterminated final line and return the aggregated text.
    ///
    /// A stream that closes before `[DONE]` is a cut-off reply, not an answer.
    pub fn finish(mut self) -> Result<String, RemoteCallFailure> {
        if !self.done && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.process_line(&String::from_utf8_lossy(&rest))?;
        }

        if !self.done {
            return Err(RemoteCallFailure::malformed("stream ended before [DONE]"));
        }
        Ok(self.text)
    }

    fn process_line(&mut self, line: &str) -> Result<(), RemoteCallFailure> {
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:") else {
            // event:, id:, retry: and comment lines carry nothing we use
            return Ok(());
        };
        let data = data.trim_start();

        if data == "[DONE]" {
            self.done = true;
            return Ok(());
        }

        let chunk: StreamChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparseable stream line");
                return Ok(());
            }
        };

        if let Some(error) = chunk.error {
            return Err(RemoteCallFailure::api(format!(
                "Completion API error in stream: {}",
                error.message
            )));
        }

        if let Some(content) = chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
        {
            self.text.push_str(&content);
        }
        Ok(())
    }
}
