//! Ticket output writers

use crate::{ExportPage, TicketRecord};

pub mod csv;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush buffered rows and sync them to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing exported tickets
pub trait TicketWriter: OutputWriter {
    /// Fix the column order. Only the first call has an effect.
    fn set_columns(&mut self, columns: Vec<String>) -> OutputResult<()>;

    /// Write a single ticket as one row
    fn write_ticket(&mut self, ticket: &TicketRecord) -> OutputResult<()>;

    /// Write every ticket of a page, then flush.
    ///
    /// The first page that yields a column list fixes the column order for
    /// the rest of the run.
    fn write_page(&mut self, page: &ExportPage) -> OutputResult<usize> {
        if let Some(columns) = page.columns() {
            self.set_columns(columns)?;
        }
        for ticket in &page.tickets {
            self.write_ticket(ticket)?;
        }
        self.flush()?;
        Ok(page.tickets.len())
    }
}
