//! Console display adapter.
//!
//! Renders the four status lines to the log whenever they change. Panel
//! drivers implement the same [`DisplayPort`].

use log::debug;

use crate::app::ports::{DISPLAY_LINES, DisplayPort};

#[derive(Debug, Default)]
pub struct LogDisplay {
    last: [String; DISPLAY_LINES],
    frames: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames that differed from the previous one.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl DisplayPort for LogDisplay {
    fn render_lines(&mut self, lines: &[&str; DISPLAY_LINES]) {
        if self.last.iter().zip(lines).all(|(a, b)| a == b) {
            return;
        }
        for (slot, line) in self.last.iter_mut().zip(lines) {
            slot.clear();
            slot.push_str(line);
        }
        self.frames += 1;
        debug!("DISPLAY | {} | {} | {} | {}", lines[0], lines[1], lines[2], lines[3]);
    }
}
