// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Decoder configuration.
//!
//! [`DecoderParam`] can be flattened into a host application's command line
//! (`#[command(flatten)]`) or deserialized from a JSON/serde configuration.

use clap::Args;
use serde::Deserialize;
use std::{path::PathBuf, str::FromStr};

/// Named azimuth at which a trigger event (e.g. camera exposure) fires.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TriggerAngle {
    pub name: String,
    /// Azimuth in degrees
    pub angle: f32,
}

impl FromStr for TriggerAngle {
    type Err = String;

    /// Parses `NAME:DEGREES`, e.g. `front:90`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, angle) = s
            .split_once(':')
            .ok_or_else(|| format!("expected NAME:DEGREES, got '{}'", s))?;
        let angle = angle
            .trim()
            .parse::<f32>()
            .map_err(|e| format!("invalid trigger angle '{}': {}", angle, e))?;
        Ok(TriggerAngle {
            name: name.trim().to_string(),
            angle,
        })
    }
}

#[derive(Args, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecoderParam {
    /// Minimum valid point distance in meters
    #[arg(long, env, default_value = "0.2")]
    pub min_distance: f32,

    /// Maximum valid point distance in meters
    #[arg(long, env, default_value = "200.0")]
    pub max_distance: f32,

    /// Azimuth window start in degrees.  A start greater than the end selects
    /// a window that wraps through 0°.
    #[arg(long, env, default_value = "0")]
    pub start_angle: f32,

    /// Azimuth window end in degrees
    #[arg(long, env, default_value = "360")]
    pub end_angle: f32,

    /// Timestamp trigger events with the sensor clock instead of the host
    /// clock
    #[arg(long, env)]
    pub use_lidar_clock: bool,

    /// Populate distance, ring and echo on each point
    #[arg(long, env)]
    pub extended_attributes: bool,

    /// Trigger azimuths as NAME:DEGREES, comma separated
    #[arg(long = "trigger", env = "TRIGGERS", value_delimiter = ',')]
    pub triggers: Vec<TriggerAngle>,

    /// Optional CSV of per-channel "vertical,horizontal" angles in degrees used
    /// until the sensor reports its own calibration
    #[arg(long, env)]
    pub angle_path: Option<PathBuf>,
}

impl Default for DecoderParam {
    fn default() -> Self {
        Self {
            min_distance: 0.2,
            max_distance: 200.0,
            start_angle: 0.0,
            end_angle: 360.0,
            use_lidar_clock: false,
            extended_attributes: false,
            triggers: Vec::new(),
            angle_path: None,
        }
    }
}

impl DecoderParam {
    /// Azimuth gate derived from `start_angle`/`end_angle`.
    ///
    /// Angles outside `0..=360` reset the window to the full circle.
    pub fn angle_window(&self) -> AngleWindow {
        let in_range = |a: f32| (0.0..=360.0).contains(&a);
        let (start, end) = if in_range(self.start_angle) && in_range(self.end_angle) {
            (self.start_angle, self.end_angle)
        } else {
            (0.0, 360.0)
        };

        let start = (start * 100.0) as u32;
        let end = (end * 100.0) as u32;
        AngleWindow {
            start,
            end,
            wraps: start > end,
        }
    }
}

/// Azimuth gate in hundredths of a degree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AngleWindow {
    pub start: u32,
    pub end: u32,
    /// Window passes through 0°
    pub wraps: bool,
}

impl AngleWindow {
    #[inline]
    pub fn contains(&self, azimuth: u32) -> bool {
        if self.wraps {
            azimuth >= self.start || azimuth <= self.end
        } else {
            azimuth >= self.start && azimuth <= self.end
        }
    }
}
