// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Pre-allocated structure-of-arrays point storage.
//!
//! [`PointBuffer`] is a [`PointSink`] that never allocates after
//! construction, so a caller can decode packet after packet into the same
//! storage and clear it between frames.
//!
//! # Example
//!
//! ```
//! use edgefirst_rs32::{buffer::PointBuffer, point::{LidarPoint, PointSink, PointXyzire}};
//!
//! let mut buf = PointBuffer::for_packets(2);
//! buf.push_point(PointXyzire::from_xyzi(1.0, 2.0, 3.0, 128.0));
//! buf.push_point(PointXyzire::nan());
//!
//! assert_eq!(buf.len(), 2);
//! assert_eq!(buf.valid_count(), 1);
//! assert_eq!(buf.x()[0], 1.0);
//! ```

use crate::{
    packet::{BLOCKS_PER_PACKET, CHANNELS_PER_BLOCK},
    point::{PointSink, PointXyzire},
};

/// Points emitted by one full MSOP packet.
pub const POINTS_PER_PACKET: usize = BLOCKS_PER_PACKET * CHANNELS_PER_BLOCK;

/// Pre-allocated point cloud buffer.
///
/// Gated-out firings are stored as NaN so that index `i` always corresponds
/// to block `i / 32`, channel `i % 32` of the packets pushed so far.
#[derive(Debug, Clone)]
pub struct PointBuffer {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    intensity: Vec<f32>,
    distance: Vec<f32>,
    ring: Vec<u16>,
    echo: Vec<u8>,
    len: usize,
}

impl PointBuffer {
    /// Buffer holding up to `capacity` points, all columns allocated up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: vec![0.0; capacity],
            y: vec![0.0; capacity],
            z: vec![0.0; capacity],
            intensity: vec![0.0; capacity],
            distance: vec![0.0; capacity],
            ring: vec![0; capacity],
            echo: vec![0; capacity],
            len: 0,
        }
    }

    /// Buffer sized for `packets` full MSOP packets.
    pub fn for_packets(packets: usize) -> Self {
        Self::with_capacity(packets * POINTS_PER_PACKET)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.x.len()
    }

    /// Returns true when no further point can be stored.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Forget stored points. Column memory is kept and not zeroed.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Number of points that passed range and angle gating.
    pub fn valid_count(&self) -> usize {
        self.x().iter().filter(|x| !x.is_nan()).count()
    }

    /// Point at `idx`, if within the valid length.
    pub fn get(&self, idx: usize) -> Option<PointXyzire> {
        (idx < self.len).then(|| PointXyzire {
            x: self.x[idx],
            y: self.y[idx],
            z: self.z[idx],
            intensity: self.intensity[idx],
            distance: self.distance[idx],
            ring: self.ring[idx],
            echo: self.echo[idx],
        })
    }

    #[inline]
    pub fn x(&self) -> &[f32] {
        &self.x[..self.len]
    }

    #[inline]
    pub fn y(&self) -> &[f32] {
        &self.y[..self.len]
    }

    #[inline]
    pub fn z(&self) -> &[f32] {
        &self.z[..self.len]
    }

    #[inline]
    pub fn intensity(&self) -> &[f32] {
        &self.intensity[..self.len]
    }

    /// Measured distances; zero unless extended attributes are enabled.
    #[inline]
    pub fn distance(&self) -> &[f32] {
        &self.distance[..self.len]
    }

    #[inline]
    pub fn ring(&self) -> &[u16] {
        &self.ring[..self.len]
    }

    #[inline]
    pub fn echo(&self) -> &[u8] {
        &self.echo[..self.len]
    }
}

impl Default for PointBuffer {
    fn default() -> Self {
        Self::for_packets(1)
    }
}

impl PointSink<PointXyzire> for PointBuffer {
    /// Points beyond capacity are dropped; debug builds assert instead.
    #[inline]
    fn push_point(&mut self, p: PointXyzire) {
        debug_assert!(
            self.len < self.capacity(),
            "PointBuffer overflow: {} >= {}",
            self.len,
            self.capacity()
        );

        if self.len < self.capacity() {
            let i = self.len;
            self.x[i] = p.x;
            self.y[i] = p.y;
            self.z[i] = p.z;
            self.intensity[i] = p.intensity;
            self.distance[i] = p.distance;
            self.ring[i] = p.ring;
            self.echo[i] = p.echo;
            self.len += 1;
        }
    }
}
