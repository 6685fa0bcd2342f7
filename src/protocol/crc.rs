//! # CRC-16/ARC Implementation
//!
//! 16-bit checksum used by both the driver station frames and the actuator
//! co-processor records.
//!
//! **Polynomial**: 0x8005, processed reflected (0xA001)
//! **Initial Value**: 0x0000
//! **Output**: no final XOR

/// Reflected CRC-16 polynomial
const CRC16_POLY_REFLECTED: u16 = 0xA001;

/// Precomputed CRC16 lookup table for fast calculation
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u16;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ CRC16_POLY_REFLECTED;
            } else {
                crc >>= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate the CRC16 checksum of a byte range using the lookup table
///
/// Pure and total: every input, including an empty slice, has a checksum.
///
/// # Examples
///
/// ```
/// use robot_link::protocol::crc::crc16;
///
/// assert_eq!(crc16(b"123456789"), 0xBB3D);
/// ```
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc = (crc >> 8) ^ CRC16_TABLE[((crc ^ byte as u16) & 0x00FF) as usize];
    }

    crc
}

/// Bitwise CRC16, used to cross-check the table in tests
#[cfg(test)]
fn crc16_slow(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc ^= byte as u16;

        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ CRC16_POLY_REFLECTED;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
