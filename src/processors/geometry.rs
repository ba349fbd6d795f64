//! Axis-aligned region boxes.

use serde::{Deserialize, Serialize};

/// An axis-aligned box `(x_min, y_min, x_max, y_max)`.
///
/// Detector boxes arrive in model-input coordinates; after filtering they are
/// mapped back to page pixels with [`BoundingBox::unscale`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    /// Creates a box from its corner coordinates.
    #[inline]
    pub fn from_coords(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates a box from the first four values of a detector row.
    ///
    /// Returns `None` if the row is shorter than four values.
    pub fn from_row(row: &[f32]) -> Option<Self> {
        match row {
            [x_min, y_min, x_max, y_max, ..] => {
                Some(Self::from_coords(*x_min, *y_min, *x_max, *y_max))
            }
            _ => None,
        }
    }

    /// Divides x-coordinates by `scale_x` and y-coordinates by `scale_y`.
    pub fn unscale(&self, scale_x: f32, scale_y: f32) -> Self {
        Self {
            x_min: self.x_min / scale_x,
            y_min: self.y_min / scale_y,
            x_max: self.x_max / scale_x,
            y_max: self.y_max / scale_y,
        }
    }

    /// Multiplies x-coordinates by `scale_x` and y-coordinates by `scale_y`.
    pub fn scale(&self, scale_x: f32, scale_y: f32) -> Self {
        Self {
            x_min: self.x_min * scale_x,
            y_min: self.y_min * scale_y,
            x_max: self.x_max * scale_x,
            y_max: self.y_max * scale_y,
        }
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// The box as `[x_min, y_min, x_max, y_max]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }
}
