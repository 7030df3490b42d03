//! Bounding boxes and pixel coordinates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Element bounding box in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub l: f64,
    /// Top edge
    pub t: f64,
    /// Right edge
    pub r: f64,
    /// Bottom edge
    pub b: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(l: f64, t: f64, r: f64, b: f64) -> Self {
        Self { l, t, r, b }
    }

    /// Read a box from an object with `l`/`t`/`r`/`b` (or
    /// `left`/`top`/`right`/`bottom`) keys.
    ///
    /// Missing edges default to zero; a value with no recognizable edge at
    /// all yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let edge = |short: &str, long: &str| {
            obj.get(short)
                .or_else(|| obj.get(long))
                .and_then(Value::as_f64)
        };

        let (l, t, r, b) = (
            edge("l", "left"),
            edge("t", "top"),
            edge("r", "right"),
            edge("b", "bottom"),
        );
        if l.is_none() && t.is_none() && r.is_none() && b.is_none() {
            return None;
        }

        Some(Self {
            l: l.unwrap_or(0.0),
            t: t.unwrap_or(0.0),
            r: r.unwrap_or(0.0),
            b: b.unwrap_or(0.0),
        })
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        (self.r - self.l).abs()
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        (self.b - self.t).abs()
    }

    /// Integer coordinates used by tabular collaborators.
    pub fn to_coords(&self) -> Coords {
        Coords {
            coords_x: self.l as i64,
            coords_y: self.t as i64,
            coords_cx: self.width() as i64,
            coords_cy: self.height() as i64,
        }
    }
}

/// Origin plus extent, truncated to integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coords {
    /// Left edge
    pub coords_x: i64,
    /// Top edge
    pub coords_y: i64,
    /// Width
    pub coords_cx: i64,
    /// Height
    pub coords_cy: i64,
}
