// src/exec/drain.rs

//! Output drain tasks.
//!
//! Each child pipe gets its own Tokio task that reads until end-of-input and
//! appends every line to a shared [`AggregatedLog`]. The two tasks never wait
//! on each other, so a child blocked writing to a full stderr pipe cannot
//! stall while we sit on stdout (or the other way round).

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, info};

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSource {
    Stdout,
    Stderr,
}

/// One line of child output, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub source: OutputSource,
    pub text: String,
}

impl OutputLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            source: OutputSource::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            source: OutputSource::Stderr,
            text: text.into(),
        }
    }
}

/// Receives lines as they are drained, before the execution finishes.
///
/// Unbounded so a slow observer can never hold up a drain task.
pub type LineSink = mpsc::UnboundedSender<OutputLine>;

/// Append-only log shared by the drain tasks of one execution.
///
/// Appends are serialized by a mutex; order within a single source is the
/// order the lines were read, order across sources is whatever the scheduler
/// produced.
#[derive(Debug, Clone, Default)]
pub struct AggregatedLog {
    lines: Arc<Mutex<Vec<OutputLine>>>,
}

impl AggregatedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, line: OutputLine) {
        self.lock().push(line);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<OutputLine> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<OutputLine>> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Join lines back into text, one `\n` per line.
pub fn render_lines(lines: &[OutputLine]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.text.len() + 1).sum());
    for line in lines {
        out.push_str(&line.text);
        out.push('\n');
    }
    out
}

/// Spawn a task that drains `reader` into `log` until end-of-input.
///
/// The task resolves to the number of lines read. `label` is the prefix used
/// when echoing lines to the log (`[label]` / `[label-ERROR]`).
pub fn spawn_drain<R>(
    source: OutputSource,
    reader: R,
    log: AggregatedLog,
    label: Arc<str>,
    sink: Option<LineSink>,
) -> JoinHandle<io::Result<usize>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(
        async move {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            let mut count = 0usize;

            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }

                let text = decode_line(&buf);
                match source {
                    OutputSource::Stdout => info!(target: "scriptrun::output", "[{label}] {text}"),
                    OutputSource::Stderr => {
                        info!(target: "scriptrun::output", "[{label}-ERROR] {text}")
                    }
                }

                let line = OutputLine { source, text };
                if let Some(sink) = &sink {
                    // Observer hung up; keep draining regardless.
                    let _ = sink.send(line.clone());
                }
                log.append(line);
                count += 1;
            }

            Ok(count)
        }
        .in_current_span(),
    )
}

/// Strip the line terminator and decode, replacing invalid UTF-8.
fn decode_line(buf: &[u8]) -> String {
    let mut end = buf.len();
    if end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && buf[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
