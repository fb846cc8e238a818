// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Synthetic RS32 packet builders shared by the integration tests.

#![allow(dead_code)]

use edgefirst_rs32::packet::{
    BLOCK_SIZE, BLOCKS_PER_PACKET, CALIBRATION_SIZE, CHANNELS_PER_BLOCK, DIFOP_PACKET_SIZE,
    DIFOP_SIGNATURE, MSOP_HEADER_SIZE, MSOP_PACKET_SIZE, MSOP_SIGNATURE,
};

/// Route test logging through env_logger (`RUST_LOG=debug cargo test`).
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// MSOP packet builder.
pub struct MsopBuilder {
    packet: Vec<u8>,
}

impl MsopBuilder {
    /// Full-size packet with valid blocks at `azimuths`, every channel at
    /// `range` with intensity 100.
    pub fn new(azimuths: &[u16], range: u16) -> Self {
        let mut packet = vec![0u8; MSOP_PACKET_SIZE];
        packet[0..8].copy_from_slice(&MSOP_SIGNATURE);
        packet[1246..1248].copy_from_slice(&[0x00, 0xff]);
        let mut builder = MsopBuilder { packet };
        for (blk, &azimuth) in azimuths.iter().enumerate().take(BLOCKS_PER_PACKET) {
            builder = builder.block(blk, azimuth, range);
        }
        builder
    }

    /// 12 blocks at azimuths 0, 300, ..., 3300.
    pub fn sweep(range: u16) -> Self {
        let azimuths: Vec<u16> = (0..BLOCKS_PER_PACKET as u16).map(|i| i * 300).collect();
        Self::new(&azimuths, range)
    }

    pub fn block(mut self, blk: usize, azimuth: u16, range: u16) -> Self {
        let start = block_start(blk);
        self.packet[start..start + 2].copy_from_slice(&[0xff, 0xee]);
        self.packet[start + 2..start + 4].copy_from_slice(&azimuth.to_be_bytes());
        for ch in 0..CHANNELS_PER_BLOCK {
            self = self.channel(blk, ch, range, 100);
        }
        self
    }

    pub fn channel(mut self, blk: usize, ch: usize, range: u16, intensity: u8) -> Self {
        let off = block_start(blk) + 4 + ch * 3;
        self.packet[off..off + 2].copy_from_slice(&range.to_be_bytes());
        self.packet[off + 2] = intensity;
        self
    }

    /// Overwrite the signature of block `blk`.
    pub fn corrupt_block(mut self, blk: usize) -> Self {
        let start = block_start(blk);
        self.packet[start..start + 2].copy_from_slice(&[0x00, 0x00]);
        self
    }

    /// Header timestamp, year relative to 2000.
    pub fn timestamp(mut self, ymdhms: [u8; 6], ms: u16, us: u16) -> Self {
        self.packet[20..26].copy_from_slice(&ymdhms);
        self.packet[26..28].copy_from_slice(&ms.to_be_bytes());
        self.packet[28..30].copy_from_slice(&us.to_be_bytes());
        self
    }

    pub fn lidar_type(mut self, model: u8) -> Self {
        self.packet[30] = model;
        self
    }

    pub fn temperature(mut self, raw: u16) -> Self {
        self.packet[38..40].copy_from_slice(&raw.to_le_bytes());
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.packet
    }
}

fn block_start(blk: usize) -> usize {
    MSOP_HEADER_SIZE + blk * BLOCK_SIZE
}

/// DIFOP packet builder.
pub struct DifopBuilder {
    packet: Vec<u8>,
}

impl DifopBuilder {
    /// 600 rpm, strongest return, placeholder calibration.
    pub fn new() -> Self {
        let mut packet = vec![0u8; DIFOP_PACKET_SIZE];
        packet[0..8].copy_from_slice(&DIFOP_SIGNATURE);
        packet[1246..1248].copy_from_slice(&[0x0f, 0xf0]);
        DifopBuilder { packet }.rpm(600).return_mode(0x01)
    }

    pub fn rpm(mut self, rpm: u16) -> Self {
        self.packet[8..10].copy_from_slice(&rpm.to_be_bytes());
        self
    }

    pub fn return_mode(mut self, mode: u8) -> Self {
        self.packet[300] = mode;
        self
    }

    pub fn lidar_ip(mut self, ip: [u8; 4]) -> Self {
        self.packet[10..14].copy_from_slice(&ip);
        self
    }

    pub fn serial(mut self, serial: [u8; 6]) -> Self {
        self.packet[292..298].copy_from_slice(&serial);
        self
    }

    /// Calibration triplets as `(sign, magnitude)`, thousandths of a degree.
    pub fn vertical(mut self, triplets: &[(u8, u16)]) -> Self {
        write_triplets(&mut self.packet[468..468 + CALIBRATION_SIZE], triplets);
        self
    }

    pub fn horizontal(mut self, triplets: &[(u8, u16)]) -> Self {
        write_triplets(&mut self.packet[564..564 + CALIBRATION_SIZE], triplets);
        self
    }

    /// Fill both arrays with a raw byte pattern.
    pub fn calibration_pattern(mut self, pattern: [u8; 3]) -> Self {
        for chunk in self.packet[468..468 + 2 * CALIBRATION_SIZE].chunks_exact_mut(3) {
            chunk.copy_from_slice(&pattern);
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.packet
    }
}

impl Default for DifopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn write_triplets(out: &mut [u8], triplets: &[(u8, u16)]) {
    for (chunk, (sign, magnitude)) in out.chunks_exact_mut(3).zip(triplets) {
        chunk[0] = *sign;
        chunk[1..3].copy_from_slice(&magnitude.to_be_bytes());
    }
}
