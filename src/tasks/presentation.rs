//! Presentation task: four status lines on the local display.

use core::fmt::Write as _;

use heapless::String;
use log::warn;

use crate::app::ports::{DISPLAY_LINES, DisplayPort};
use crate::error::Result;
use crate::state::{AppContext, SensorReading};

/// Characters per display line (128 px at 6 px per glyph, with margin).
pub const LINE_WIDTH: usize = 24;

pub type Line = String<LINE_WIDTH>;

pub fn format_lines(reading: &SensorReading, link_connected: bool) -> [Line; DISPLAY_LINES] {
    let mut lines: [Line; DISPLAY_LINES] = Default::default();
    // Width overflow truncates the line; it never fails the frame.
    let _ = write!(lines[0], "Temp: {:.1} C", reading.temperature);
    let _ = write!(lines[1], "Hum: {:.1} %", reading.humidity);
    let _ = write!(lines[2], "Press: {:.1} hPa", reading.pressure);
    let _ = write!(lines[3], "Link: {}", if link_connected { "OK" } else { "---" });
    lines
}

/// Render one frame. The sensor lock is held only for the snapshot.
pub fn render_once<D: DisplayPort>(ctx: &AppContext, display: &mut D) -> Result<()> {
    let reading = ctx.reading.snapshot()?;
    let lines = format_lines(&reading, ctx.flags.link_connected());
    display.render_lines(&[lines[0].as_str(), lines[1].as_str(), lines[2].as_str(), lines[3].as_str()]);
    Ok(())
}

/// Task body for [`super::PRESENTATION`].
pub fn cycle<D: DisplayPort>(ctx: &AppContext, display: &mut D) {
    if let Err(e) = render_once(ctx, display) {
        warn!("DISPLAY | frame skipped: {}", e);
    }
}
