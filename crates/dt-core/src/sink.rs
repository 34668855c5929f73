//! Append-only diagnostic record sinks.
//!
//! Regression procedures emit one [`TrendSample`] per calculate call for
//! retrospective prediction-vs-actual analysis. The sink is an injected
//! capability: production hosts use [`FileSink`] (the gnuplot-friendly
//! semicolon format), tests use [`MemorySink`]. A sink is scoped to one
//! procedure instance and must be released on every exit path of close.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use dt_common::Result;

use crate::estimator::TrendSample;

/// Append-only record writer owned by one procedure instance.
pub trait DiagnosticSink: std::fmt::Debug {
    /// Append one record. Called once per calculate on regression kinds.
    fn record(&mut self, sample: &TrendSample) -> Result<()>;

    /// Release the sink. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// File-backed sink writing the semicolon diagnostic format.
#[derive(Debug)]
pub struct FileSink {
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create (truncating) the diagnostic file and write the two header
    /// lines. The file is open from this point on, before configure
    /// completes.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "##;##")?;
        writeln!(
            writer,
            "idx;x;y;slope;intercept;slopeStdErr;interceptStdErr;yPredicted"
        )?;
        writer.flush()?;
        Ok(Self {
            writer: Some(writer),
        })
    }
}

impl DiagnosticSink for FileSink {
    fn record(&mut self, sample: &TrendSample) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", sample.record_line())?;
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Release even when close was never reached.
        let _ = self.close();
    }
}

/// In-memory sink retaining every record, for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<TrendSample>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[TrendSample] {
        &self.records
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&mut self, sample: &TrendSample) -> Result<()> {
        if !self.closed {
            self.records.push(*sample);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Clonable handle over a [`MemorySink`] so a test can hand the sink to
/// a procedure and still inspect the records afterwards. Procedures are
/// single-threaded by contract, so `Rc<RefCell<_>>` suffices.
#[derive(Debug, Clone, Default)]
pub struct SharedMemorySink {
    inner: std::rc::Rc<std::cell::RefCell<MemorySink>>,
}

impl SharedMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TrendSample> {
        self.inner.borrow().records().to_vec()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().is_closed()
    }
}

impl DiagnosticSink for SharedMemorySink {
    fn record(&mut self, sample: &TrendSample) -> Result<()> {
        self.inner.borrow_mut().record(sample)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.borrow_mut().close()
    }
}
