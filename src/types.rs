//! Shared value types for frames and regions of interest

use serde::{Deserialize, Serialize};
use std::fmt;

/// Region of interest in image pixel coordinates.
///
/// Coordinates are signed so a rectangle hanging off the frame edge can be
/// expressed; it is clipped against the frame before use. A zero-area
/// rectangle means "whole frame".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Roi {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle covering a whole `width` x `height` frame
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersect with the frame bounds. Returns `None` when nothing remains.
    pub fn clip(&self, frame_width: u32, frame_height: u32) -> Option<Roi> {
        if self.is_empty() {
            return None;
        }
        let fw = i64::from(frame_width);
        let fh = i64::from(frame_height);

        let x0 = i64::from(self.x).clamp(0, fw);
        let y0 = i64::from(self.y).clamp(0, fh);
        let x1 = (i64::from(self.x) + i64::from(self.width)).clamp(0, fw);
        let y1 = (i64::from(self.y) + i64::from(self.height)).clamp(0, fh);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Roi::new(
            x0 as i32,
            y0 as i32,
            (x1 - x0) as i32,
            (y1 - y0) as i32,
        ))
    }

    /// Parse the `x,y,w,h` form used by the CLI and the export map
    pub fn parse(text: &str) -> Option<Roi> {
        let parts: Vec<i32> = text
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [x, y, w, h] => Some(Roi::new(*x, *y, *w, *h)),
            _ => None,
        }
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// Frame geometry of the last evaluated frame, kept for export metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub frame_width: u32,
    pub frame_height: u32,
    /// ROI as requested by the caller, before clipping
    pub requested_roi: Option<Roi>,
    /// Region the evaluator actually analysed
    pub effective_region: Roi,
}
