use std::io::{self, Write};

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use thiserror::Error;

use crate::error::LayoutError;
use crate::geometry::Size;

use super::LayoutRuntime;

pub type DriverResult<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("runtime error: {0}")]
    Runtime(#[from] LayoutError),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Minimal terminal driver that owns a `LayoutRuntime` and manages raw
/// mode + alternate screen transitions. The terminal is the container:
/// the driver seeds the initial size and then lets resize events drive
/// repacking.
pub struct TerminalDriver {
    runtime: LayoutRuntime,
}

impl TerminalDriver {
    pub fn new(runtime: LayoutRuntime) -> Self {
        Self { runtime }
    }

    pub fn run(mut self) -> DriverResult<()> {
        let mut stdout = io::stdout();
        self.enter(&mut stdout)?;
        let result = self.run_inner();
        self.exit(&mut stdout);
        result
    }

    fn run_inner(&mut self) -> DriverResult<()> {
        let (width, height) = terminal::size()?;
        self.runtime.resize(Size::new(width, height))?;
        self.runtime.run()?;
        Ok(())
    }

    fn enter(&self, stdout: &mut impl Write) -> DriverResult<()> {
        terminal::enable_raw_mode().map_err(|err| DriverError::Terminal(err.to_string()))?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(())
    }

    fn exit(&self, stdout: &mut impl Write) {
        execute!(stdout, Show, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}
