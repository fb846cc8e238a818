// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Common LiDAR types and error handling shared by the packet decoders.

use std::fmt;

/// Packet kinds emitted by the sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketKind {
    /// Main data stream output protocol (measurements)
    Msop,
    /// Device information output protocol (configuration and calibration)
    Difop,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PacketKind::Msop => write!(f, "MSOP"),
            PacketKind::Difop => write!(f, "DIFOP"),
        }
    }
}

/// Common error type for decoder operations
///
/// None of these are fatal to the process; callers drop the offending packet
/// (or configuration) and continue.
#[derive(Debug)]
pub enum Error {
    /// I/O error (angle file read)
    Io(std::io::Error),
    /// Leading signature does not match the expected packet kind
    BadSignature(PacketKind),
    /// Unexpected end of data, carries the received length in bytes
    UnexpectedEnd(usize),
    /// Embedded calendar fields do not form a valid date and time
    InvalidTimestamp,
    /// Configuration error
    Config(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::BadSignature(kind) => write!(f, "bad {} signature", kind),
            Error::UnexpectedEnd(len) => write!(f, "unexpected end of data at {} bytes", len),
            Error::InvalidTimestamp => write!(f, "invalid packet timestamp"),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Return mode reported by the sensor in DIFOP byte 300.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EchoMode {
    /// Both strongest and last return, blocks alternate between the two
    Dual = 0x00,
    /// Strongest return only
    #[default]
    Strongest = 0x01,
    /// Last return only
    Last = 0x02,
}

impl EchoMode {
    /// Returns true for the dual-return mode.
    #[inline]
    pub fn is_dual(self) -> bool {
        self == EchoMode::Dual
    }
}

impl From<u8> for EchoMode {
    /// Unknown and reserved values fall back to dual return.
    fn from(value: u8) -> Self {
        match value {
            0x01 => EchoMode::Strongest,
            0x02 => EchoMode::Last,
            _ => EchoMode::Dual,
        }
    }
}

impl fmt::Display for EchoMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EchoMode::Dual => write!(f, "dual"),
            EchoMode::Strongest => write!(f, "strongest"),
            EchoMode::Last => write!(f, "last"),
        }
    }
}

/// Host wall-clock time in fractional seconds since the Unix epoch.
///
/// Used to timestamp trigger events when the sensor clock is not selected.
pub fn host_time() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + now.timestamp_subsec_micros() as f64 / 1_000_000.0
}
