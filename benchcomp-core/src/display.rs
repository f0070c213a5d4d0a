//! Clearable line-oriented output.
//!
//! A report is printed line by line through a [`DisplaySink`]. Between live
//! updates the reporter calls [`DisplaySink::clear`] so a terminal can erase
//! the previous report before the next one is drawn.

use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

/// Destination for report lines.
pub trait DisplaySink {
    /// Print one line of text.
    fn print(&mut self, line: &str) -> io::Result<()>;

    /// Erase everything printed since the last clear, where supported.
    fn clear(&mut self) -> io::Result<()>;

    /// Flush any buffered output.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn print(&mut self, _line: &str) -> io::Result<()> {
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A terminal that can erase the lines it has printed.
#[derive(Debug)]
pub struct TerminalDisplay<W: Write = Stdout> {
    writer: W,
    lines_displayed: usize,
}

impl TerminalDisplay<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for TerminalDisplay<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            lines_displayed: 0,
        }
    }

    /// Lines printed since the last clear.
    pub fn lines_displayed(&self) -> usize {
        self.lines_displayed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DisplaySink for TerminalDisplay<W> {
    fn print(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        self.lines_displayed += 1;
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        for _ in 0..self.lines_displayed {
            queue!(self.writer, MoveUp(1), Clear(ClearType::CurrentLine))?;
        }
        self.writer.flush()?;
        self.lines_displayed = 0;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Appends lines to a file or stream. Clearing does nothing.
#[derive(Debug)]
pub struct FileDisplay<W: Write> {
    writer: W,
}

impl FileDisplay<BufWriter<File>> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> FileDisplay<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DisplaySink for FileDisplay<W> {
    fn print(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)
    }

    fn clear(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
