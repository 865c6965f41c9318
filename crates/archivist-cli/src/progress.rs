//! Workflow progress line for CLI output.
//!
//! Uses raw ANSI escape sequences. Also drives the OSC 9;4 terminal progress
//! protocol (ConEmu/Windows Terminal/iTerm2).

use std::io::{self, Write};

/// Default progress bar width (in characters).
const DEFAULT_BAR_WIDTH: usize = 30;

const FILLED: char = '\u{2588}'; // █
const EMPTY: char = '\u{2591}'; // ░

/// Emit an OSC 9;4 progress sequence. `state`: 1 = set progress, 0 = clear.
fn osc_progress(state: u8, percent: u8) {
    let _ = write!(io::stderr(), "\x1b]9;4;{state};{percent}\x1b\\");
    let _ = io::stderr().flush();
}

/// A percentage bar followed by the current workflow status.
///
/// ```text
/// [████████████░░░░░░░░░░░░░░░░░░]  40% Task 3/7: Piston door
/// ```
pub struct ProgressBar {
    percent: f64,
    status: String,
    width: usize,
    visible: bool,
    use_osc: bool,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBar {
    pub fn new() -> Self {
        Self {
            percent: 0.0,
            status: String::new(),
            width: DEFAULT_BAR_WIDTH,
            visible: false,
            use_osc: true,
        }
    }

    /// Disable OSC 9;4 terminal progress protocol.
    pub fn no_osc(mut self) -> Self {
        self.use_osc = false;
        self
    }

    pub fn set(&mut self, percent: f64, status: &str) {
        self.percent = percent.clamp(0.0, 100.0);
        self.status = status.to_string();
        self.draw();
    }

    fn render(&self) -> String {
        let filled = (self.percent / 100.0 * self.width as f64) as usize;
        let empty = self.width.saturating_sub(filled);
        let bar = format!(
            "{}{}",
            FILLED.to_string().repeat(filled),
            EMPTY.to_string().repeat(empty)
        );
        format!("[{bar}] {:>3}% {}", self.percent as u8, self.status)
    }

    fn draw(&mut self) {
        self.visible = true;
        eprint!("\r\x1b[2K{}", self.render());
        let _ = io::stderr().flush();
        if self.use_osc {
            osc_progress(1, self.percent as u8);
        }
    }

    /// Finish the line and clear the terminal indicator.
    pub fn finish(&mut self) {
        if self.visible {
            eprintln!();
            self.visible = false;
        }
        if self.use_osc {
            osc_progress(0, 0);
        }
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        if self.use_osc && self.visible {
            osc_progress(0, 0);
        }
    }
}
