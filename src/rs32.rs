// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! RoboSense RS-LiDAR-32 decoder.
//!
//! The RS32 is a mechanical spinning LiDAR with:
//! - 32 beams fired in two interleaved groups of 16
//! - 360° horizontal FOV, 5/10/20 Hz
//! - 200m maximum range, 5mm range resolution
//!
//! # Packet Structure
//!
//! See [`crate::packet`] for the byte layouts.  Each MSOP packet carries 12
//! blocks of 32 channel readings, so a packet always yields 384 points in
//! block-major order.  In dual-return mode consecutive blocks share an
//! azimuth and hold the strongest and last return respectively.
//!
//! The decoder itself keeps only configuration, lookup tables and the last
//! temperature reading.  Calibration lives in a caller-owned
//! [`CalibrationState`], updated by [`Rs32Decoder::decode_difop`] and read by
//! [`Rs32Decoder::decode_msop`].

use crate::{
    base::{ANGLE_STEPS, TrigTables, TriggerChecker, compute_temperature},
    calibration::CalibrationState,
    lidar::{EchoMode, Error, host_time},
    packet::{BLOCKS_PER_PACKET, CHANNELS_PER_BLOCK, DeviceInfo, DifopSlice, MsopSlice},
    param::{AngleWindow, DecoderParam},
    point::{LidarPoint, PointSink},
};
use log::debug;
use tracing::instrument;

/// Distance resolution in meters (5mm)
pub const DISTANCE_RESOLUTION: f32 = 0.005;

/// Sensor-frame offset of the optical center (Rx, Ry, Rz) in meters
pub const MOUNTING_OFFSET: [f32; 3] = [0.03997, -0.01087, 0.0];

/// Upper bound for the configured maximum distance
const MAX_DISTANCE_LIMIT: f32 = 200.0;

/// Lower bound for the configured minimum distance
const MIN_DISTANCE_LIMIT: f32 = 0.4;

/// Firing offset between consecutive channels of a group (µs)
const CHANNEL_TOFFSET: f32 = 3.0;

/// Firing duration of one block (µs)
const FIRING_TDURATION: f32 = 50.0;

/// Channels fired per group
const CHANNELS_PER_GROUP: usize = CHANNELS_PER_BLOCK / 2;

/// Summary of one decoded MSOP packet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MsopInfo {
    /// Rows of the point grid (channels per block)
    pub height: usize,
    /// Raw azimuth of the first block, hundredths of a degree
    pub azimuth: u16,
    /// Blocks decoded before the first bad block signature
    pub blocks: usize,
    /// Device temperature in Celsius
    pub temperature: f32,
    /// Lidar model byte from the MSOP header
    pub lidar_type: u8,
}

impl MsopInfo {
    /// Number of points appended to the sink.
    #[inline]
    pub fn points(&self) -> usize {
        self.blocks * self.height
    }

    /// True when a bad block signature cut the packet short.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.blocks < BLOCKS_PER_PACKET
    }
}

/// RoboSense RS-LiDAR-32 packet decoder
pub struct Rs32Decoder {
    param: DecoderParam,
    window: AngleWindow,
    tables: TrigTables,
    trigger: TriggerChecker,
    temperature: f32,
}

impl Rs32Decoder {
    /// Create a new RS32 decoder.
    ///
    /// `max_distance` is capped at 200m; `min_distance` is raised to 0.4m
    /// when below that or above `max_distance`.
    pub fn new(mut param: DecoderParam) -> Self {
        if param.max_distance > MAX_DISTANCE_LIMIT {
            param.max_distance = MAX_DISTANCE_LIMIT;
        }
        if param.min_distance < MIN_DISTANCE_LIMIT || param.min_distance > param.max_distance {
            param.min_distance = MIN_DISTANCE_LIMIT;
        }

        let window = param.angle_window();
        let trigger = TriggerChecker::new(&param.triggers);
        debug!(
            "RS32 decoder: distance {}..{}m, azimuth window {:?}",
            param.min_distance, param.max_distance, window
        );

        Self {
            param,
            window,
            tables: TrigTables::new(),
            trigger,
            temperature: 0.0,
        }
    }

    /// Effective configuration after model-specific clamping.
    pub fn param(&self) -> &DecoderParam {
        &self.param
    }

    /// Device temperature from the last decoded MSOP, in Celsius.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Register the callback fired when the scan crosses a trigger angle.
    pub fn set_trigger_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&str, f64) + Send + 'static,
    {
        self.trigger.set_callback(Box::new(callback));
    }

    /// Fresh session state, pre-loaded from `angle_path` when configured.
    pub fn new_state(&self) -> Result<CalibrationState, Error> {
        let mut state = CalibrationState::new();
        if let Some(path) = &self.param.angle_path {
            state.load_angle_file(path)?;
        }
        Ok(state)
    }

    /// Sensor timestamp of an MSOP packet in fractional seconds.
    pub fn lidar_time(data: &[u8]) -> Result<f64, Error> {
        MsopSlice::from_slice(data)?.timestamp().to_seconds()
    }

    /// Decode an MSOP packet, appending one point per channel firing.
    ///
    /// Gated-out firings are appended as NaN points, so exactly
    /// `info.blocks * 32` points are pushed.  A bad block signature stops
    /// decoding at that block without failing the packet.
    #[instrument(skip_all)]
    pub fn decode_msop<P, S>(
        &mut self,
        data: &[u8],
        state: &CalibrationState,
        out: &mut S,
    ) -> Result<MsopInfo, Error>
    where
        P: LidarPoint,
        S: PointSink<P>,
    {
        let msop = MsopSlice::from_slice(data)?;

        self.temperature = compute_temperature(msop.temperature_raw());

        let first_azimuth = msop.block(0).azimuth();
        if self.trigger.is_enabled() {
            let timestamp = if self.param.use_lidar_clock {
                msop.timestamp()
                    .to_seconds()
                    .inspect_err(|e| debug!("skipping trigger check: {}", e))
                    .ok()
            } else {
                Some(host_time())
            };
            if let Some(timestamp) = timestamp {
                self.trigger.check(first_azimuth, timestamp);
            }
        }

        let echo_mode = state.echo_mode();
        // Blocks between two firings of the same return
        let stride = match echo_mode {
            EchoMode::Dual => 2,
            _ => 1,
        };

        let mut blocks = 0;
        for blk_idx in 0..BLOCKS_PER_PACKET {
            let block = msop.block(blk_idx);
            if !block.is_valid() {
                debug!(
                    "MSOP block {} has a bad signature, dropping {} blocks",
                    blk_idx,
                    BLOCKS_PER_PACKET - blk_idx
                );
                break;
            }

            let cur_azi = block.azimuth();
            let azi_diff = if blk_idx + stride < BLOCKS_PER_PACKET {
                azimuth_delta(cur_azi, msop.block(blk_idx + stride).azimuth())
            } else {
                azimuth_delta(msop.block(blk_idx - stride).azimuth(), cur_azi)
            } as f32;

            let echo = if echo_mode.is_dual() {
                (blk_idx % 2) as u8
            } else {
                0
            };

            for channel in 0..CHANNELS_PER_BLOCK {
                let azimuth_channel = cur_azi as f32
                    + azi_diff * CHANNEL_TOFFSET * (channel % CHANNELS_PER_GROUP) as f32
                        / FIRING_TDURATION;
                let azimuth_final = state.azimuth_calibration(azimuth_channel, channel);
                let distance = block.range(channel) as f32 * DISTANCE_RESOLUTION;

                let mut point = if self.in_range(distance)
                    && self.window.contains(azimuth_final as u32)
                {
                    let azimuth_raw =
                        (azimuth_channel as i32).rem_euclid(ANGLE_STEPS as i32) as usize;
                    let vert = state.vertical_index(channel);
                    let [rx, _, rz] = MOUNTING_OFFSET;

                    let t = &self.tables;
                    let horiz = distance * t.cos(vert);
                    let x = horiz * t.cos(azimuth_final) + rx * t.cos(azimuth_raw);
                    let y = -horiz * t.sin(azimuth_final) - rx * t.sin(azimuth_raw);
                    let z = distance * t.sin(vert) + rz;

                    let intensity = block.intensity(channel) as f32;
                    let intensity = if intensity.is_nan() { 0.0 } else { intensity };
                    P::from_xyzi(x, y, z, intensity)
                } else {
                    P::nan()
                };

                if self.param.extended_attributes {
                    point.set_extended(distance, channel as u16, echo);
                }
                out.push_point(point);
            }
            blocks += 1;
        }

        Ok(MsopInfo {
            height: CHANNELS_PER_BLOCK,
            azimuth: first_azimuth,
            blocks,
            temperature: self.temperature,
            lidar_type: msop.lidar_type(),
        })
    }

    /// Decode a DIFOP packet into the session state.
    ///
    /// Rotation speed, echo mode and device information are refreshed on
    /// every packet. The angle tables are loaded from the first packet with
    /// real calibration data and never re-parsed afterwards.
    #[instrument(skip_all)]
    pub fn decode_difop(&self, data: &[u8], state: &mut CalibrationState) -> Result<(), Error> {
        let difop = DifopSlice::from_slice(data)?;

        let echo_mode = EchoMode::from(difop.return_mode());
        if echo_mode != state.echo_mode() {
            debug!("echo mode {} -> {}", state.echo_mode(), echo_mode);
        }
        state.update_rotation(difop.rpm(), echo_mode);

        let info = DeviceInfo::from_difop(&difop);
        if state.device_info().is_none() {
            debug!(
                "RS32 serial {} firmware {} at {}.{}.{}.{}",
                info.serial_string(),
                info.top_version_string(),
                info.lidar_ip[0],
                info.lidar_ip[1],
                info.lidar_ip[2],
                info.lidar_ip[3]
            );
        }
        state.set_device_info(info);

        if !state.is_calibrated()
            && state.load_calibration(difop.vertical_calibration(), difop.horizontal_calibration())
        {
            debug!("RS32 angle calibration loaded");
        }

        Ok(())
    }

    #[inline]
    fn in_range(&self, distance: f32) -> bool {
        distance >= self.param.min_distance && distance <= self.param.max_distance
    }
}

impl Default for Rs32Decoder {
    fn default() -> Self {
        Self::new(DecoderParam::default())
    }
}

/// Forward azimuth difference from `from` to `to`, in `0..ANGLE_STEPS`.
#[inline]
pub(crate) fn azimuth_delta(from: u16, to: u16) -> u16 {
    (to as i32 - from as i32).rem_euclid(ANGLE_STEPS as i32) as u16
}
