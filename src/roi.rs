//! Region-of-interest extraction.

use serde::Serialize;

use crate::device::Frame;

/// Arithmetic mean of each color channel over the ROI, in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMeans {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl ChannelMeans {
    pub fn brightness(&self) -> f64 {
        (self.red + self.green + self.blue) / 3.0
    }
}

/// Mean channel intensities over a square region of edge length `edge`
/// centered in the frame. The edge is clamped to the frame dimensions.
///
/// Returns `None` when the frame reports no valid dimensions yet; the
/// caller skips that tick rather than failing.
pub fn channel_means(frame: &Frame, edge: u32) -> Option<ChannelMeans> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 || edge == 0 {
        return None;
    }

    let edge = edge.min(width).min(height);
    let x0 = (width - edge) / 2;
    let y0 = (height - edge) / 2;

    let pixels = frame.pixels();
    let mut sums = [0u64; 3];
    for y in y0..y0 + edge {
        for x in x0..x0 + edge {
            let pixel = pixels.get_pixel(x, y);
            sums[0] += u64::from(pixel[0]);
            sums[1] += u64::from(pixel[1]);
            sums[2] += u64::from(pixel[2]);
        }
    }

    let count = f64::from(edge) * f64::from(edge);
    Some(ChannelMeans {
        red: sums[0] as f64 / count,
        green: sums[1] as f64 / count,
        blue: sums[2] as f64 / count,
    })
}
