// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! EdgeFirst RoboSense RS32 Decoder Library
//!
//! Decodes the two UDP packet streams of the RoboSense RS-LiDAR-32 into
//! Cartesian point clouds.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  decode_difop   ┌──────────────────┐
//! │   DIFOP    │ ──────────────► │ CalibrationState │
//! │ (1248 B)   │    (&mut)       │ (client-owned)   │
//! └────────────┘                 └──────────────────┘
//!                                         │ (&)
//! ┌────────────┐  decode_msop    ┌────────▼─────────┐    ┌──────────────┐
//! │   MSOP     │ ──────────────► │   Rs32Decoder    │ ─► │  PointSink   │
//! │ (1248 B)   │                 │ (tables, gating) │    │ Vec / Buffer │
//! └────────────┘                 └──────────────────┘    └──────────────┘
//! ```
//!
//! The client owns the calibration state and the point storage:
//! 1. Client creates the decoder and a state: `decoder.new_state()?`
//! 2. DIFOP packets update the state: `decoder.decode_difop(data, &mut state)`
//! 3. MSOP packets append 384 points: `decoder.decode_msop(data, &state, &mut points)`
//! 4. Client groups packets into frames using `state.pkts_per_frame()`
//!
//! # Modules
//!
//! - [`rs32`]: RS32 decoder
//! - [`packet`]: MSOP/DIFOP wire layouts and borrowed slice views
//! - [`calibration`]: Session state and angle calibration
//! - [`base`]: Trigonometry tables, temperature, trigger angles
//! - [`param`]: Decoder configuration (clap/serde)
//! - [`point`]: Point record and sink traits
//! - [`buffer`]: Pre-allocated structure-of-arrays point storage
//! - [`lidar`]: Error handling and common types
//!
//! # Example
//!
//! ```no_run
//! use edgefirst_rs32::{DecoderParam, PointXyzi, Rs32Decoder};
//! use std::net::UdpSocket;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut decoder = Rs32Decoder::new(DecoderParam::default());
//! let mut state = decoder.new_state()?;
//! let msop = UdpSocket::bind("0.0.0.0:6699")?;
//! let difop = UdpSocket::bind("0.0.0.0:7788")?;
//! difop.set_nonblocking(true)?;
//!
//! let mut buf = [0u8; 1500];
//! let mut points: Vec<PointXyzi> = Vec::new();
//! loop {
//!     if let Ok(len) = difop.recv(&mut buf) {
//!         decoder.decode_difop(&buf[..len], &mut state)?;
//!     }
//!
//!     let len = msop.recv(&mut buf)?;
//!     match decoder.decode_msop(&buf[..len], &state, &mut points) {
//!         Ok(info) if info.is_truncated() => log::debug!("short packet"),
//!         Ok(_) => {}
//!         Err(e) => log::warn!("dropping packet: {}", e),
//!     }
//!     if points.len() >= state.pkts_per_frame() as usize * 384 {
//!         // Frame complete
//!         points.clear();
//!     }
//! }
//! # }
//! ```

pub mod base;
pub mod buffer;
pub mod calibration;
pub mod lidar;
pub mod packet;
pub mod param;
pub mod point;
pub mod rs32;

// Re-exports for convenience
pub use buffer::PointBuffer;
pub use calibration::CalibrationState;
pub use lidar::{EchoMode, Error};
pub use param::DecoderParam;
pub use point::{LidarPoint, PointSink, PointXyzi, PointXyzire};
pub use rs32::{MsopInfo, Rs32Decoder};
