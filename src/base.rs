// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Facilities shared by the rotating RoboSense decoders.
//!
//! - [`TrigTables`]: sine/cosine lookup indexed by hundredths of a degree
//! - [`compute_temperature`]: header temperature register to Celsius
//! - [`TriggerChecker`]: fires a callback when the scan crosses configured
//!   azimuths (camera triggering)

use crate::param::TriggerAngle;
use log::trace;

/// Angular steps in one revolution (hundredths of a degree).
pub const ANGLE_STEPS: usize = 36_000;

/// Precomputed sine/cosine tables.
///
/// Both tables hold [`ANGLE_STEPS`] entries. Callers normalize indices into
/// `0..ANGLE_STEPS` before lookup.
#[derive(Debug, Clone)]
pub struct TrigTables {
    sin: Vec<f32>,
    cos: Vec<f32>,
}

impl TrigTables {
    pub fn new() -> Self {
        let (sin, cos): (Vec<f32>, Vec<f32>) = (0..ANGLE_STEPS)
            .map(|i| (i as f64 * 0.01).to_radians().sin_cos())
            .map(|(s, c)| (s as f32, c as f32))
            .unzip();
        Self { sin, cos }
    }

    #[inline]
    pub fn sin(&self, angle: usize) -> f32 {
        self.sin[angle]
    }

    #[inline]
    pub fn cos(&self, angle: usize) -> f32 {
        self.cos[angle]
    }
}

impl Default for TrigTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert the MSOP temperature register to degrees Celsius.
///
/// Bit 15 is the sign; the magnitude is `(bits 8..15) * 32 + (bits 3..8)` in
/// steps of 0.0625 °C.
pub fn compute_temperature(raw: u16) -> f32 {
    let high = (raw >> 8) as u8;
    let low = (raw & 0x00ff) as u8;
    let magnitude = ((high & 0x7f) as f32 * 32.0 + (low >> 3) as f32) * 0.0625;
    if high & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Callback invoked with the trigger name and the packet timestamp.
pub type TriggerCallback = Box<dyn FnMut(&str, f64) + Send>;

/// Detects when the scan passes configured trigger azimuths.
///
/// A trigger fires when its angle lies in `(previous, current]` of two
/// consecutive packet azimuths, handling the wrap at 360°.
pub struct TriggerChecker {
    /// (angle in hundredths of a degree, name)
    triggers: Vec<(u16, String)>,
    last_azimuth: Option<u16>,
    callback: Option<TriggerCallback>,
}

impl TriggerChecker {
    pub fn new(triggers: &[TriggerAngle]) -> Self {
        let triggers = triggers
            .iter()
            .map(|t| {
                let angle = (t.angle.rem_euclid(360.0) * 100.0) as u16;
                (angle, t.name.clone())
            })
            .collect();

        Self {
            triggers,
            last_azimuth: None,
            callback: None,
        }
    }

    /// Returns true when trigger angles are configured.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.triggers.is_empty()
    }

    pub fn set_callback(&mut self, callback: TriggerCallback) {
        self.callback = Some(callback);
    }

    /// Feed the nominal azimuth of a packet.
    pub fn check(&mut self, azimuth: u16, timestamp: f64) {
        if let Some(prev) = self.last_azimuth {
            for (angle, name) in &self.triggers {
                if crossed(prev, azimuth, *angle) {
                    trace!("trigger {} at azimuth {} ({:.6})", name, azimuth, timestamp);
                    if let Some(cb) = self.callback.as_mut() {
                        cb(name, timestamp);
                    }
                }
            }
        }
        self.last_azimuth = Some(azimuth);
    }
}

impl std::fmt::Debug for TriggerChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerChecker")
            .field("triggers", &self.triggers)
            .field("last_azimuth", &self.last_azimuth)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

fn crossed(prev: u16, cur: u16, angle: u16) -> bool {
    if prev <= cur {
        prev < angle && angle <= cur
    } else {
        angle > prev || angle <= cur
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_trig_tables() {
        let t = TrigTables::new();
        assert_eq!(t.sin(0), 0.0);
        assert_eq!(t.cos(0), 1.0);
        assert!((t.sin(9000) - 1.0).abs() < 1e-6);
        assert!(t.cos(9000).abs() < 1e-6);
        assert!((t.cos(18000) + 1.0).abs() < 1e-6);
        assert!((t.sin(3000) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_compute_temperature() {
        assert_eq!(compute_temperature(0x0c80), 25.0);
        assert_eq!(compute_temperature(0x8c80), -25.0);
        assert_eq!(compute_temperature(0x0000), 0.0);
        // Low three bits are below resolution
        assert_eq!(compute_temperature(0x0c87), 25.0);
    }

    #[test]
    fn test_crossed() {
        assert!(crossed(0, 1200, 1000));
        assert!(crossed(900, 1000, 1000));
        assert!(!crossed(1000, 1200, 1000));
        assert!(!crossed(1000, 1000, 1000));
        // Wrap through zero
        assert!(crossed(35000, 500, 100));
        assert!(crossed(35000, 500, 35500));
        assert!(!crossed(35000, 500, 20000));
    }

    #[test]
    fn test_trigger_checker_fires_once() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();

        let mut checker = TriggerChecker::new(&[TriggerAngle {
            name: "front".to_string(),
            angle: 10.0,
        }]);
        assert!(checker.is_enabled());
        checker.set_callback(Box::new(move |name: &str, ts: f64| {
            sink.lock().unwrap().push((name.to_string(), ts));
        }));

        // First packet only primes the checker
        checker.check(1500, 1.0);
        checker.check(3000, 2.0);
        checker.check(500, 3.0);
        checker.check(1200, 4.0);
        checker.check(1300, 5.0);

        let fired = fired.lock().unwrap();
        assert_eq!(fired.as_slice(), &[("front".to_string(), 4.0)]);
    }

    #[test]
    fn test_trigger_checker_disabled() {
        let checker = TriggerChecker::new(&[]);
        assert!(!checker.is_enabled());
    }
}
