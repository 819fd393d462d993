use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::trace::trace::TraceEvent;

/// Appends one JSON line per step to a trace file.
///
/// A file that cannot be opened disables the logger instead of failing the
/// run. Every line is flushed as soon as it is written so that a crashed
/// run still leaves a complete prefix behind.
pub struct TraceLogger {
    sink: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
}

impl TraceLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => TraceLogger {
                sink: Some(Mutex::new(BufWriter::new(file))),
                path: Some(path.to_path_buf()),
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "trace file unavailable, step tracing disabled");
                TraceLogger::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        TraceLogger {
            sink: None,
            path: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        let Ok(mut out) = sink.lock() else {
            warn!("trace sink poisoned, event dropped");
            return;
        };

        let written = serde_json::to_writer(&mut *out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush());
        if let Err(e) = written {
            warn!(step = event.step, error = %e, "trace event not written");
        }
    }
}
