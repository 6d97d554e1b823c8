//! CRC-16/XMODEM checksum.
//!
//! Every YMODEM frame carries a 16-bit CRC over its payload region.
//! Both sides of the link use the same algorithm: polynomial 0x1021,
//! initial value 0, no reflection, no final XOR.

/// Compute the CRC-16/XMODEM checksum of a byte slice.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_known_vector() {
        // Standard check value for CRC-16/XMODEM
        assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_crc16_empty() {
        assert_eq!(crc16_xmodem(&[]), 0);
    }

    #[test]
    fn test_crc16_all_zero_block() {
        // A zero-filled 128-byte payload checks to zero with init 0
        assert_eq!(crc16_xmodem(&[0u8; 128]), 0);
    }

    #[test]
    fn test_crc16_single_byte() {
        assert_eq!(crc16_xmodem(&[0x01]), 0x1021);
    }
}
