//! Trace records emitted by a region when debugging is enabled.

use std::path::PathBuf;

/// One traced operation on an [`crate::AlignedRegion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// The backing resource was opened and mapped.
    Mapped {
        path: PathBuf,
        page_aligned_base: u64,
        mapped_length: usize,
    },
    /// `byte_count` bytes are about to be read from the user `offset`.
    Read { offset: usize, byte_count: usize },
    /// `byte_count` bytes are about to be written at the user `offset`.
    Write { offset: usize, byte_count: usize },
    /// A single word store at the mapping `position`.
    WordWritten { position: usize, value: u32 },
}

impl std::fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceEvent::Mapped {
                path,
                page_aligned_base,
                mapped_length,
            } => write!(
                f,
                "init with base_addr = {page_aligned_base:#x} and length = {mapped_length:#x} on {}",
                path.display()
            ),
            TraceEvent::Read { offset, byte_count } => {
                write!(f, "reading {byte_count} bytes from offset {offset:#x}")
            }
            TraceEvent::Write { offset, byte_count } => {
                write!(f, "writing {byte_count} bytes to offset {offset:#x}")
            }
            TraceEvent::WordWritten { position, value } => {
                write!(f, "writing at position = {position:#x}: {value:#x}")
            }
        }
    }
}

/// Receiver of trace records.
///
/// Closures taking a `&TraceEvent` implement this trait, which keeps test sinks short.
pub trait TraceSink: Send + Sync {
    fn record(&self, event: &TraceEvent);
}

impl<F> TraceSink for F
where
    F: Fn(&TraceEvent) + Send + Sync,
{
    fn record(&self, event: &TraceEvent) {
        self(event)
    }
}

/// Forwards trace records to the `log` facade at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn record(&self, event: &TraceEvent) {
        log::debug!(target: "devmem", "{event}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |event: &TraceEvent| seen.lock().unwrap().push(event.clone());
        sink.record(&TraceEvent::Read {
            offset: 0x80,
            byte_count: 4,
        });
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[TraceEvent::Read {
                offset: 0x80,
                byte_count: 4
            }]
        );
    }

    #[test]
    fn test_event_display() {
        let event = TraceEvent::Write {
            offset: 0x80,
            byte_count: 8,
        };
        assert_eq!(event.to_string(), "writing 8 bytes to offset 0x80");
        let event = TraceEvent::WordWritten {
            position: 0x84,
            value: 0x2a,
        };
        assert_eq!(event.to_string(), "writing at position = 0x84: 0x2a");
    }
}
