// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Output point records.
//!
//! Decoders are generic over [`LidarPoint`] so callers choose the record
//! layout, and over [`PointSink`] so callers own (and reuse) the storage.

/// A point record the decoder can populate.
pub trait LidarPoint {
    /// Build a point from Cartesian coordinates (meters) and intensity.
    fn from_xyzi(x: f32, y: f32, z: f32, intensity: f32) -> Self;

    /// Attach extended attributes. Records without them ignore the call.
    #[inline]
    fn set_extended(&mut self, _distance: f32, _ring: u16, _echo: u8) {}

    /// Placeholder for a gated-out firing: every numeric field is NaN.
    #[inline]
    fn nan() -> Self
    where
        Self: Sized,
    {
        Self::from_xyzi(f32::NAN, f32::NAN, f32::NAN, f32::NAN)
    }
}

/// Destination for decoded points. The decoder only appends.
pub trait PointSink<P> {
    fn push_point(&mut self, point: P);
}

impl<P> PointSink<P> for Vec<P> {
    #[inline]
    fn push_point(&mut self, point: P) {
        self.push(point);
    }
}

/// Coordinates and intensity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointXyzi {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
}

impl PointXyzi {
    /// False for gated-out (NaN) points.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.x.is_nan()
    }
}

impl LidarPoint for PointXyzi {
    #[inline]
    fn from_xyzi(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        Self { x, y, z, intensity }
    }
}

/// Coordinates, intensity, measured distance, ring (channel) and echo index.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointXyzire {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
    /// Measured distance in meters, also set on gated-out points
    pub distance: f32,
    /// Channel index within the block
    pub ring: u16,
    /// 0 for the first (or only) return, 1 for the second return
    pub echo: u8,
}

impl PointXyzire {
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.x.is_nan()
    }
}

impl LidarPoint for PointXyzire {
    #[inline]
    fn from_xyzi(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        Self {
            x,
            y,
            z,
            intensity,
            ..Default::default()
        }
    }

    #[inline]
    fn set_extended(&mut self, distance: f32, ring: u16, echo: u8) {
        self.distance = distance;
        self.ring = ring;
        self.echo = echo;
    }
}
