//! Single-line console status
//!
//! Each update blanks the previous message and writes the new one followed by
//! a carriage return, so consecutive updates redraw the same terminal line.

use std::io::{self, Write};

/// Redrawable status line over any writer
pub struct StatusLine<W: Write> {
    out: W,
    last_len: usize,
}

impl StatusLine<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StatusLine<W> {
    pub fn new(out: W) -> Self {
        Self { out, last_len: 0 }
    }

    /// Replace the current status text
    pub fn update(&mut self, msg: &str) -> io::Result<()> {
        write!(self.out, "{}\r{}\r", " ".repeat(self.last_len), msg)?;
        self.out.flush()?;
        self.last_len = msg.chars().count();
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
