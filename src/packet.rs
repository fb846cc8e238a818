// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! RS-LiDAR-32 wire layouts.
//!
//! Packets are never reinterpreted as packed structs. Each view borrows the
//! UDP payload, validates length and signature once in `from_slice`, and reads
//! fields through explicit offset accessors. Multi-byte fields are big-endian
//! unless noted.
//!
//! ## MSOP - 1248 bytes, port 6699
//! - Header: 42 bytes (signature, timestamp, temperature)
//! - Data: 12 blocks × 100 bytes = 1200 bytes
//! - Tail: 6 bytes (frame index, tail marker), not required for decoding
//!
//! ## DIFOP - 1248 bytes, port 7788
//! - Device configuration, firmware versions, serial number, return mode
//! - Vertical and horizontal angle calibration, 32 × 3-byte triplets each

use crate::lidar::{Error, PacketKind};
use chrono::{NaiveDate, NaiveTime};

/// MSOP signature, wire order
pub const MSOP_SIGNATURE: [u8; 8] = [0x55, 0xaa, 0x05, 0x0a, 0x5a, 0xa5, 0x50, 0xa0];

/// Block signature, wire order
pub const BLOCK_SIGNATURE: [u8; 2] = [0xff, 0xee];

/// DIFOP signature, wire order
pub const DIFOP_SIGNATURE: [u8; 8] = [0xa5, 0xff, 0x00, 0x5a, 0x11, 0x11, 0x55, 0x55];

/// MSOP packet total size in bytes
pub const MSOP_PACKET_SIZE: usize = 1248;

/// MSOP header size in bytes
pub const MSOP_HEADER_SIZE: usize = 42;

/// Number of data blocks per MSOP packet
pub const BLOCKS_PER_PACKET: usize = 12;

/// Number of channels (beams) per block
pub const CHANNELS_PER_BLOCK: usize = 32;

/// Size of one channel reading in bytes
pub const CHANNEL_SIZE: usize = 3;

/// Size of each data block in bytes
pub const BLOCK_SIZE: usize = 4 + CHANNELS_PER_BLOCK * CHANNEL_SIZE;

/// Bytes needed to decode an MSOP packet (header and blocks, no trailer)
pub const MSOP_MIN_SIZE: usize = MSOP_HEADER_SIZE + BLOCKS_PER_PACKET * BLOCK_SIZE;

/// DIFOP packet size
pub const DIFOP_PACKET_SIZE: usize = 1248;

/// Length of each calibration array (32 triplets)
pub const CALIBRATION_SIZE: usize = CHANNELS_PER_BLOCK * 3;

const MSOP_TIMESTAMP: usize = 20;
const MSOP_LIDAR_TYPE: usize = 30;
const MSOP_TEMPERATURE: usize = 38;
const MSOP_INDEX: usize = 1242;

const DIFOP_RPM: usize = 8;
const DIFOP_LIDAR_IP: usize = 10;
const DIFOP_HOST_IP: usize = 14;
const DIFOP_MAC: usize = 18;
const DIFOP_MSOP_PORT: usize = 24;
const DIFOP_DIFOP_PORT: usize = 26;
const DIFOP_FOV: usize = 32;
const DIFOP_PHASE_LOCK: usize = 38;
const DIFOP_TOP_VERSION: usize = 40;
const DIFOP_BOTTOM_VERSION: usize = 45;
const DIFOP_SERIAL: usize = 292;
const DIFOP_RETURN_MODE: usize = 300;
const DIFOP_SW_VERSION: usize = 301;
const DIFOP_TIMESTAMP: usize = 303;
const DIFOP_VERTICAL_CALI: usize = 468;
const DIFOP_HORIZONTAL_CALI: usize = 564;

/// Sensor calendar timestamp, shared by MSOP and DIFOP (10 bytes).
///
/// The year is stored as an offset from 2000.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timestamp {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
    pub microsecond: u16,
}

impl Timestamp {
    /// Length of the timestamp in bytes/octets.
    pub const LEN: usize = 10;

    /// Year base of the one-byte year field.
    pub const YEAR_BASE: i32 = 2000;

    fn from_bytes(b: &[u8]) -> Self {
        Timestamp {
            year: b[0],
            month: b[1],
            day: b[2],
            hour: b[3],
            minute: b[4],
            second: b[5],
            millisecond: u16::from_be_bytes([b[6], b[7]]),
            microsecond: u16::from_be_bytes([b[8], b[9]]),
        }
    }

    /// Fractional seconds since the Unix epoch.
    ///
    /// Calendar fields are taken as UTC. Day and time-of-day fields carry
    /// over like `mktime`: a leap second (second 60) lands on the next
    /// minute and day 0 on the last day of the previous month. Only the year
    /// and month must form a valid calendar month.
    pub fn to_seconds(&self) -> Result<f64, Error> {
        let year = Self::YEAR_BASE + self.year as i32;
        let month_start = NaiveDate::from_ymd_opt(year, self.month as u32, 1)
            .ok_or(Error::InvalidTimestamp)?
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        let offset = (self.day as i64 - 1) * 86_400
            + self.hour as i64 * 3_600
            + self.minute as i64 * 60
            + self.second as i64;
        let fraction = self.millisecond as f64 / 1_000.0 + self.microsecond as f64 / 1_000_000.0;

        Ok((month_start + offset) as f64 + fraction)
    }
}

/// Borrowed view over an MSOP packet.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MsopSlice<'a> {
    slice: &'a [u8],
}

impl<'a> MsopSlice<'a> {
    /// Validate length and signature.
    ///
    /// The 6-byte trailer is optional, so payloads of at least
    /// [`MSOP_MIN_SIZE`] bytes are accepted.
    pub fn from_slice(slice: &'a [u8]) -> Result<MsopSlice<'a>, Error> {
        if slice.len() < MSOP_SIGNATURE.len() {
            return Err(Error::UnexpectedEnd(slice.len()));
        }
        if slice[0..8] != MSOP_SIGNATURE {
            return Err(Error::BadSignature(PacketKind::Msop));
        }
        if slice.len() < MSOP_MIN_SIZE {
            return Err(Error::UnexpectedEnd(slice.len()));
        }

        Ok(MsopSlice { slice })
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp::from_bytes(&self.slice[MSOP_TIMESTAMP..MSOP_TIMESTAMP + Timestamp::LEN])
    }

    pub fn lidar_type(&self) -> u8 {
        self.slice[MSOP_LIDAR_TYPE]
    }

    /// Raw temperature register, low byte first on the wire.
    pub fn temperature_raw(&self) -> u16 {
        u16::from_le_bytes([
            self.slice[MSOP_TEMPERATURE],
            self.slice[MSOP_TEMPERATURE + 1],
        ])
    }

    /// Frame index from the trailer, if the payload carries one.
    pub fn index(&self) -> Option<u32> {
        self.slice
            .get(MSOP_INDEX..MSOP_INDEX + 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Block at `idx`, which must be below [`BLOCKS_PER_PACKET`].
    #[inline]
    pub fn block(&self, idx: usize) -> BlockSlice<'a> {
        let start = MSOP_HEADER_SIZE + idx * BLOCK_SIZE;
        BlockSlice {
            slice: &self.slice[start..start + BLOCK_SIZE],
        }
    }
}

/// Borrowed view over one 100-byte MSOP block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlockSlice<'a> {
    slice: &'a [u8],
}

impl BlockSlice<'_> {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.slice[0..2] == BLOCK_SIGNATURE
    }

    /// Azimuth in hundredths of a degree.
    #[inline]
    pub fn azimuth(&self) -> u16 {
        u16::from_be_bytes([self.slice[2], self.slice[3]])
    }

    /// Raw range of `channel` in device units.
    #[inline]
    pub fn range(&self, channel: usize) -> u16 {
        let off = 4 + channel * CHANNEL_SIZE;
        u16::from_be_bytes([self.slice[off], self.slice[off + 1]])
    }

    #[inline]
    pub fn intensity(&self, channel: usize) -> u8 {
        self.slice[4 + channel * CHANNEL_SIZE + 2]
    }
}

/// Borrowed view over a DIFOP packet.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DifopSlice<'a> {
    slice: &'a [u8],
}

impl<'a> DifopSlice<'a> {
    pub fn from_slice(slice: &'a [u8]) -> Result<DifopSlice<'a>, Error> {
        if slice.len() < DIFOP_SIGNATURE.len() {
            return Err(Error::UnexpectedEnd(slice.len()));
        }
        if slice[0..8] != DIFOP_SIGNATURE {
            return Err(Error::BadSignature(PacketKind::Difop));
        }
        if slice.len() < DIFOP_PACKET_SIZE {
            return Err(Error::UnexpectedEnd(slice.len()));
        }

        Ok(DifopSlice { slice })
    }

    /// Motor rotation speed in revolutions per minute.
    pub fn rpm(&self) -> u16 {
        self.u16_at(DIFOP_RPM)
    }

    pub fn return_mode(&self) -> u8 {
        self.slice[DIFOP_RETURN_MODE]
    }

    pub fn lidar_ip(&self) -> [u8; 4] {
        self.array(DIFOP_LIDAR_IP)
    }

    pub fn host_ip(&self) -> [u8; 4] {
        self.array(DIFOP_HOST_IP)
    }

    pub fn mac_addr(&self) -> [u8; 6] {
        self.array(DIFOP_MAC)
    }

    pub fn msop_port(&self) -> u16 {
        self.u16_at(DIFOP_MSOP_PORT)
    }

    pub fn difop_port(&self) -> u16 {
        self.u16_at(DIFOP_DIFOP_PORT)
    }

    /// Field-of-view start and end, hundredths of a degree.
    pub fn fov(&self) -> (u16, u16) {
        (self.u16_at(DIFOP_FOV), self.u16_at(DIFOP_FOV + 2))
    }

    pub fn phase_lock_angle(&self) -> u16 {
        self.u16_at(DIFOP_PHASE_LOCK)
    }

    pub fn top_version(&self) -> [u8; 5] {
        self.array(DIFOP_TOP_VERSION)
    }

    pub fn bottom_version(&self) -> [u8; 5] {
        self.array(DIFOP_BOTTOM_VERSION)
    }

    pub fn serial_number(&self) -> [u8; 6] {
        self.array(DIFOP_SERIAL)
    }

    pub fn sw_version(&self) -> u16 {
        self.u16_at(DIFOP_SW_VERSION)
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp::from_bytes(&self.slice[DIFOP_TIMESTAMP..DIFOP_TIMESTAMP + Timestamp::LEN])
    }

    /// Vertical angle calibration, 32 sign-magnitude triplets.
    pub fn vertical_calibration(&self) -> &'a [u8] {
        &self.slice[DIFOP_VERTICAL_CALI..DIFOP_VERTICAL_CALI + CALIBRATION_SIZE]
    }

    /// Horizontal angle calibration, 32 sign-magnitude triplets.
    pub fn horizontal_calibration(&self) -> &'a [u8] {
        &self.slice[DIFOP_HORIZONTAL_CALI..DIFOP_HORIZONTAL_CALI + CALIBRATION_SIZE]
    }

    fn u16_at(&self, off: usize) -> u16 {
        u16::from_be_bytes([self.slice[off], self.slice[off + 1]])
    }

    fn array<const N: usize>(&self, off: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.slice[off..off + N]);
        out
    }
}

/// Device information from DIFOP packets
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device serial number
    pub serial_number: [u8; 6],
    /// Top board firmware version
    pub top_version: [u8; 5],
    /// Bottom board firmware version
    pub bottom_version: [u8; 5],
    /// Software version
    pub sw_version: u16,
    /// LiDAR IP address
    pub lidar_ip: [u8; 4],
    /// Destination host IP address
    pub host_ip: [u8; 4],
    /// LiDAR MAC address
    pub mac_addr: [u8; 6],
    /// MSOP destination port
    pub msop_port: u16,
    /// DIFOP destination port
    pub difop_port: u16,
    /// Field of view start and end, hundredths of a degree
    pub fov: (u16, u16),
    /// Phase lock angle
    pub phase_lock_angle: u16,
    /// Device clock at DIFOP emission
    pub timestamp: Timestamp,
}

impl DeviceInfo {
    pub fn from_difop(difop: &DifopSlice<'_>) -> Self {
        DeviceInfo {
            serial_number: difop.serial_number(),
            top_version: difop.top_version(),
            bottom_version: difop.bottom_version(),
            sw_version: difop.sw_version(),
            lidar_ip: difop.lidar_ip(),
            host_ip: difop.host_ip(),
            mac_addr: difop.mac_addr(),
            msop_port: difop.msop_port(),
            difop_port: difop.difop_port(),
            fov: difop.fov(),
            phase_lock_angle: difop.phase_lock_angle(),
            timestamp: difop.timestamp(),
        }
    }

    /// Get serial number as a hex string
    pub fn serial_string(&self) -> String {
        self.serial_number
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect()
    }

    /// Get top board firmware as a hex string
    pub fn top_version_string(&self) -> String {
        self.top_version
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect()
    }

    /// Get MAC address in colon notation
    pub fn mac_string(&self) -> String {
        self.mac_addr
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(BLOCK_SIZE, 100);
        assert_eq!(MSOP_MIN_SIZE, 1242);
        assert_eq!(MSOP_MIN_SIZE + 6, MSOP_PACKET_SIZE);
        assert_eq!(
            DIFOP_HORIZONTAL_CALI + CALIBRATION_SIZE + 586 + 2,
            DIFOP_PACKET_SIZE
        );
    }

    #[test]
    fn test_msop_too_short() {
        let mut packet = vec![0u8; 100];
        packet[0..8].copy_from_slice(&MSOP_SIGNATURE);
        assert!(matches!(
            MsopSlice::from_slice(&packet),
            Err(Error::UnexpectedEnd(100))
        ));
        assert!(matches!(
            MsopSlice::from_slice(&packet[..4]),
            Err(Error::UnexpectedEnd(4))
        ));
    }

    #[test]
    fn test_msop_bad_signature() {
        let packet = vec![0u8; MSOP_PACKET_SIZE];
        assert!(matches!(
            MsopSlice::from_slice(&packet),
            Err(Error::BadSignature(PacketKind::Msop))
        ));
    }

    #[test]
    fn test_msop_fields() {
        let mut packet = vec![0u8; MSOP_PACKET_SIZE];
        packet[0..8].copy_from_slice(&MSOP_SIGNATURE);
        packet[30] = 0x04;
        packet[38] = 0x10;
        packet[39] = 0x02;
        packet[1242..1246].copy_from_slice(&[0, 0, 1, 2]);
        let block = MSOP_HEADER_SIZE + BLOCK_SIZE;
        packet[block..block + 4].copy_from_slice(&[0xff, 0xee, 0x8c, 0x9f]);
        packet[block + 4 + 3 * 5..block + 4 + 3 * 5 + 3].copy_from_slice(&[0x03, 0xe8, 77]);

        let msop = MsopSlice::from_slice(&packet).unwrap();
        assert_eq!(msop.lidar_type(), 0x04);
        assert_eq!(msop.temperature_raw(), 0x0210);
        assert_eq!(msop.index(), Some(258));
        assert!(!msop.block(0).is_valid());
        let blk = msop.block(1);
        assert!(blk.is_valid());
        assert_eq!(blk.azimuth(), 35999);
        assert_eq!(blk.range(5), 1000);
        assert_eq!(blk.intensity(5), 77);

        // Trailer is optional
        let msop = MsopSlice::from_slice(&packet[..MSOP_MIN_SIZE]).unwrap();
        assert_eq!(msop.index(), None);
    }

    #[test]
    fn test_timestamp_to_seconds() {
        let ts = Timestamp {
            year: 24,
            month: 3,
            day: 15,
            hour: 12,
            minute: 30,
            second: 45,
            millisecond: 500,
            microsecond: 250,
        };
        // 2024-03-15T12:30:45Z
        let expected = 1_710_505_845.0 + 0.500_250;
        assert!((ts.to_seconds().unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_timestamp_invalid_calendar() {
        let ts = Timestamp {
            month: 13,
            day: 1,
            ..Default::default()
        };
        assert!(matches!(ts.to_seconds(), Err(Error::InvalidTimestamp)));

        // Zeroed timestamp (month 0) from an unsynchronized sensor
        assert!(Timestamp::default().to_seconds().is_err());
    }

    #[test]
    fn test_timestamp_carries_over() {
        // GPS leap second 2016-12-31T23:59:60 lands on 2017-01-01T00:00:00
        let leap = Timestamp {
            year: 16,
            month: 12,
            day: 31,
            hour: 23,
            minute: 59,
            second: 60,
            ..Default::default()
        };
        assert_eq!(leap.to_seconds().unwrap(), 1_483_228_800.0);

        // Day 0 of March 2024 is 2024-02-29
        let day_zero = Timestamp {
            year: 24,
            month: 3,
            day: 0,
            ..Default::default()
        };
        assert_eq!(day_zero.to_seconds().unwrap(), 1_709_164_800.0);

        let hour_overflow = Timestamp {
            year: 24,
            month: 3,
            day: 1,
            hour: 24,
            ..Default::default()
        };
        assert_eq!(hour_overflow.to_seconds().unwrap(), 1_709_337_600.0);
    }

    #[test]
    fn test_difop_fields() {
        let mut packet = vec![0u8; DIFOP_PACKET_SIZE];
        packet[0..8].copy_from_slice(&DIFOP_SIGNATURE);
        packet[8..10].copy_from_slice(&600u16.to_be_bytes());
        packet[10..14].copy_from_slice(&[192, 168, 1, 200]);
        packet[18..24].copy_from_slice(&[0x40, 0x2c, 0x76, 0x08, 0x4a, 0xcc]);
        packet[24..26].copy_from_slice(&6699u16.to_be_bytes());
        packet[26..28].copy_from_slice(&7788u16.to_be_bytes());
        packet[32..36].copy_from_slice(&[0x00, 0x00, 0x8c, 0xa0]);
        packet[292..298].copy_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        packet[300] = 0x02;

        let difop = DifopSlice::from_slice(&packet).unwrap();
        assert_eq!(difop.rpm(), 600);
        assert_eq!(difop.return_mode(), 0x02);

        let info = DeviceInfo::from_difop(&difop);
        assert_eq!(info.lidar_ip, [192, 168, 1, 200]);
        assert_eq!(info.msop_port, 6699);
        assert_eq!(info.difop_port, 7788);
        assert_eq!(info.fov, (0, 36000));
        assert_eq!(info.serial_string(), "010203040506");
        assert_eq!(info.mac_string(), "40:2c:76:08:4a:cc");
    }

    #[test]
    fn test_difop_bad_signature() {
        let mut packet = vec![0u8; DIFOP_PACKET_SIZE];
        packet[0..8].copy_from_slice(&MSOP_SIGNATURE);
        assert!(matches!(
            DifopSlice::from_slice(&packet),
            Err(Error::BadSignature(PacketKind::Difop))
        ));
    }
}
