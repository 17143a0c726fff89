//! Potentiometer readings.

use std::fmt;

use crate::error::PayloadError;

/// One sample of both potentiometers, always updated as a pair
///
/// Aligned to 8 bytes so the pair fits a single lock-free 64-bit atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C, align(8))]
pub struct SensorReading {
    pub ch1: u32,
    pub ch2: u32,
}

impl SensorReading {
    pub const fn new(ch1: u32, ch2: u32) -> Self {
        Self { ch1, ch2 }
    }

    /// Parse a `"ch1,ch2"` payload, rejecting values above `full_scale`
    pub fn parse(payload: &str, full_scale: u32) -> Result<Self, PayloadError> {
        let mut parts = payload.trim().split(',');
        let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(PayloadError::Reading(payload.to_string()));
        };

        let parse_channel = |field: &str| -> Result<u32, PayloadError> {
            let value = field
                .trim()
                .parse::<u32>()
                .map_err(|_| PayloadError::Reading(payload.to_string()))?;
            if value > full_scale {
                return Err(PayloadError::OutOfRange { value, full_scale });
            }
            Ok(value)
        };

        Ok(Self::new(parse_channel(first)?, parse_channel(second)?))
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.ch1, self.ch2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(
            SensorReading::parse("512,498", 4095).unwrap(),
            SensorReading::new(512, 498)
        );
        assert_eq!(
            SensorReading::parse(" 7 , 9 \n", 4095).unwrap(),
            SensorReading::new(7, 9)
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for payload in ["", "512", "512,", "a,b", "1,2,3", "-1,5", "1.5,2"] {
            assert!(
                SensorReading::parse(payload, 4095).is_err(),
                "accepted {payload:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(matches!(
            SensorReading::parse("1024,0", 1023),
            Err(PayloadError::OutOfRange {
                value: 1024,
                full_scale: 1023
            })
        ));
        assert!(SensorReading::parse("1023,1023", 1023).is_ok());
    }
}
