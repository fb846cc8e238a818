// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Session calibration state.
//!
//! [`CalibrationState`] is written only by DIFOP decoding (`&mut`) and read by
//! MSOP decoding (`&`). Callers that deliver packets from several threads wrap
//! it in a lock; single-threaded callers simply hold it next to the decoder.
//!
//! Angle tables are stored in hundredths of a degree. They are filled from the
//! first DIFOP whose calibration block is not a placeholder and are latched for
//! the rest of the session.

use crate::{
    base::ANGLE_STEPS,
    lidar::{EchoMode, Error},
    packet::{CHANNELS_PER_BLOCK, DeviceInfo},
};
use log::{debug, warn};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// MSOP packets emitted per second in single-return mode
pub const PKT_RATE: u32 = 1500;

/// Rotation speed assumed until the first DIFOP arrives
const DEFAULT_RPM: u16 = 600;

/// Per-session configuration and angle calibration.
#[derive(Clone, Debug)]
pub struct CalibrationState {
    rpm: u16,
    echo_mode: EchoMode,
    pkts_per_frame: u32,
    vertical: [f32; CHANNELS_PER_BLOCK],
    horizontal: [f32; CHANNELS_PER_BLOCK],
    calibrated: bool,
    placeholder_seen: bool,
    device_info: Option<DeviceInfo>,
}

impl CalibrationState {
    pub fn new() -> Self {
        Self {
            rpm: DEFAULT_RPM,
            echo_mode: EchoMode::default(),
            pkts_per_frame: PKT_RATE * 60 / DEFAULT_RPM as u32,
            vertical: [0.0; CHANNELS_PER_BLOCK],
            horizontal: [0.0; CHANNELS_PER_BLOCK],
            calibrated: false,
            placeholder_seen: false,
            device_info: None,
        }
    }

    /// Rotation speed in revolutions per minute.
    pub fn rpm(&self) -> u16 {
        self.rpm
    }

    pub fn echo_mode(&self) -> EchoMode {
        self.echo_mode
    }

    /// Expected MSOP packets per revolution.
    pub fn pkts_per_frame(&self) -> u32 {
        self.pkts_per_frame
    }

    /// Returns true once the angle tables were loaded from a DIFOP.
    ///
    /// Until then MSOP decoding uses the default (or angle-file) tables and
    /// points carry reduced geometric accuracy.
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Vertical angle per channel, hundredths of a degree.
    pub fn vertical_angles(&self) -> &[f32; CHANNELS_PER_BLOCK] {
        &self.vertical
    }

    /// Horizontal angle offset per channel, hundredths of a degree.
    pub fn horizontal_angles(&self) -> &[f32; CHANNELS_PER_BLOCK] {
        &self.horizontal
    }

    /// Device information from the most recent DIFOP.
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device_info.as_ref()
    }

    /// Vertical angle of `channel` normalized into `0..ANGLE_STEPS`.
    #[inline]
    pub fn vertical_index(&self, channel: usize) -> usize {
        (self.vertical[channel] as i32).rem_euclid(ANGLE_STEPS as i32) as usize
    }

    /// Apply the horizontal offset of `channel` to an interpolated azimuth.
    ///
    /// Returns the corrected azimuth in `0..ANGLE_STEPS`.
    #[inline]
    pub fn azimuth_calibration(&self, azimuth: f32, channel: usize) -> usize {
        ((azimuth + self.horizontal[channel]) as i32).rem_euclid(ANGLE_STEPS as i32) as usize
    }

    /// Replace the default tables without latching.
    ///
    /// A later DIFOP calibration still takes precedence.
    pub fn set_default_angles(
        &mut self,
        vertical: [f32; CHANNELS_PER_BLOCK],
        horizontal: [f32; CHANNELS_PER_BLOCK],
    ) {
        self.vertical = vertical;
        self.horizontal = horizontal;
    }

    /// Load default tables from a CSV of `vertical,horizontal` degree pairs.
    pub fn load_angle_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let file = File::open(path.as_ref())?;
        self.load_angle_csv(BufReader::new(file))?;
        debug!("loaded angle table from {}", path.as_ref().display());
        Ok(())
    }

    /// Parse one line per channel; blank lines are skipped and lines past the
    /// channel count are ignored.
    pub fn load_angle_csv<R: BufRead>(&mut self, reader: R) -> Result<(), Error> {
        let mut vertical = [0.0; CHANNELS_PER_BLOCK];
        let mut horizontal = [0.0; CHANNELS_PER_BLOCK];
        let mut row = 0;

        for (lineno, line) in reader.lines().enumerate() {
            if row == CHANNELS_PER_BLOCK {
                break;
            }
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split(',').map(str::trim);
            let (Some(v), Some(h)) = (fields.next(), fields.next()) else {
                return Err(Error::Config(format!(
                    "angle file line {}: expected two columns",
                    lineno + 1
                )));
            };
            let parse = |s: &str| {
                s.parse::<f32>().map_err(|e| {
                    Error::Config(format!("angle file line {}: {}: '{}'", lineno + 1, e, s))
                })
            };
            vertical[row] = parse(v)? * 100.0;
            horizontal[row] = parse(h)? * 100.0;
            row += 1;
        }

        if row < CHANNELS_PER_BLOCK {
            return Err(Error::Config(format!(
                "angle file has {} rows, expected {}",
                row, CHANNELS_PER_BLOCK
            )));
        }

        self.set_default_angles(vertical, horizontal);
        Ok(())
    }

    /// Update rotation speed and echo mode from a DIFOP.
    ///
    /// Packets-per-frame is derived with integer division. A zero rotation
    /// speed leaves the previous value in place.
    pub(crate) fn update_rotation(&mut self, rpm: u16, echo_mode: EchoMode) {
        self.rpm = rpm;
        self.echo_mode = echo_mode;

        let basis = if echo_mode.is_dual() {
            2 * PKT_RATE * 60
        } else {
            PKT_RATE * 60
        };
        match basis.checked_div(rpm as u32) {
            Some(pkts) => self.pkts_per_frame = pkts,
            None => warn!(
                "DIFOP reports 0 rpm, keeping {} packets per frame",
                self.pkts_per_frame
            ),
        }
    }

    pub(crate) fn set_device_info(&mut self, info: DeviceInfo) {
        self.device_info = Some(info);
    }

    /// Latch the angle tables from the DIFOP calibration arrays.
    ///
    /// Returns true when the tables were loaded by this call. Already latched
    /// state and placeholder arrays leave the tables untouched.
    pub(crate) fn load_calibration(&mut self, vertical: &[u8], horizontal: &[u8]) -> bool {
        if self.calibrated {
            return false;
        }

        if is_placeholder(vertical) {
            if !self.placeholder_seen {
                warn!("DIFOP carries no angle calibration, using default angle table");
                self.placeholder_seen = true;
            }
            return false;
        }

        decode_triplets(
            vertical,
            horizontal,
            &mut self.vertical,
            &mut self.horizontal,
        );
        self.calibrated = true;
        debug!("latched DIFOP angle calibration: {:?}", self.vertical);
        true
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new()
    }
}

/// True when the first triplet consists only of 0x00/0xFF bytes, the pattern
/// of an uncalibrated sensor.
pub fn is_placeholder(calibration: &[u8]) -> bool {
    calibration.iter().take(3).all(|&b| b == 0x00 || b == 0xff)
}

/// Decode the sign-magnitude triplets of both calibration arrays.
///
/// Each triplet is `[sign, high, low]`; sign 0 is positive and 1 negative. Any
/// other sign byte keeps the sign of the previously decoded triplet, vertical
/// and horizontal sharing one running sign. Magnitudes are thousandths of a
/// degree and are stored as hundredths.
fn decode_triplets(
    vertical: &[u8],
    horizontal: &[u8],
    vert_out: &mut [f32; CHANNELS_PER_BLOCK],
    hori_out: &mut [f32; CHANNELS_PER_BLOCK],
) {
    let mut sign = 1.0f32;
    let mut decode = |triplet: &[u8]| {
        match triplet[0] {
            0 => sign = 1.0,
            1 => sign = -1.0,
            _ => {}
        }
        let magnitude = triplet[1] as u32 * 256 + triplet[2] as u32;
        magnitude as f32 * sign * 0.1
    };

    for (i, (v, h)) in vertical
        .chunks_exact(3)
        .zip(horizontal.chunks_exact(3))
        .take(CHANNELS_PER_BLOCK)
        .enumerate()
    {
        vert_out[i] = decode(v);
        hori_out[i] = decode(h);
    }
}
