use serde::{Deserialize, Serialize};

use crate::{Result, SyncError};

/// Point in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Screen size and the rectangle a stimulus image occupies on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenGeometry {
    pub screen_width: f64,
    pub screen_height: f64,
    pub stimulus_left: f64,
    pub stimulus_right: f64,
    pub stimulus_top: f64,
    pub stimulus_bottom: f64,
}

impl Default for ScreenGeometry {
    /// RSVP app at 175% zoom on a 1920x1080 display.
    fn default() -> Self {
        Self {
            screen_width: 1920.0,
            screen_height: 1080.0,
            stimulus_left: 523.0,
            stimulus_right: 1397.8,
            stimulus_top: 11.0,
            stimulus_bottom: 810.8,
        }
    }
}

impl ScreenGeometry {
    pub fn validate(&self) -> Result<()> {
        if !(self.screen_width > 0.0 && self.screen_height > 0.0) {
            return Err(SyncError::configuration("screen dimensions must be positive"));
        }
        if !(self.stimulus_left < self.stimulus_right && self.stimulus_top < self.stimulus_bottom)
        {
            return Err(SyncError::configuration(
                "stimulus rectangle must have positive width and height",
            ));
        }
        Ok(())
    }

    pub fn stimulus_width(&self) -> f64 {
        self.stimulus_right - self.stimulus_left
    }

    pub fn stimulus_height(&self) -> f64 {
        self.stimulus_bottom - self.stimulus_top
    }

    /// Scales display-normalized coordinates (0..1) to screen pixels.
    pub fn to_screen(&self, x: f64, y: f64) -> ScreenPoint {
        ScreenPoint {
            x: x * self.screen_width,
            y: y * self.screen_height,
        }
    }

    /// Strictly inside the stimulus rectangle. Missing gaze is never inside.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        self.stimulus_left < point.x
            && point.x < self.stimulus_right
            && self.stimulus_top < point.y
            && point.y < self.stimulus_bottom
    }

    /// Maps a screen point inside the stimulus rectangle to pixel coordinates
    /// of an image of `width` x `height`, truncating toward zero.
    pub fn to_image(&self, point: ScreenPoint, width: u32, height: u32) -> (i64, i64) {
        let x = (point.x - self.stimulus_left) / self.stimulus_width() * f64::from(width);
        let y = (point.y - self.stimulus_top) / self.stimulus_height() * f64::from(height);
        (x as i64, y as i64)
    }
}

/// Midpoint of both eyes' normalized gaze coordinates.
pub fn binocular_center(left_x: f64, left_y: f64, right_x: f64, right_y: f64) -> (f64, f64) {
    ((left_x + right_x) / 2.0, (left_y + right_y) / 2.0)
}
