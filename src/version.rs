//! Semantic versions packed into a single integer
//!
//! Versions are stored and compared as integers so that `1.10.0` sorts after `1.9.0`. Each
//! component gets a fixed number of bits, major first.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Bit widths of (major, minor, patch)
pub const VERSION_NUMBER_BITS: [u32; 3] = [8, 10, 14];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("version '{0}' has more than {} components", VERSION_NUMBER_BITS.len())]
    TooManyComponents(String),
    #[error("version '{version}' has a non-numeric component '{component}'")]
    NotANumber { version: String, component: String },
    #[error("version '{version}' component {value} doesn't fit in {bits} bits")]
    Overflow { version: String, value: u64, bits: u32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Version {
        Version { major, minor, patch }
    }

    /// Pack into `major << 24 | minor << 14 | patch`
    pub fn packed(&self) -> i64 {
        let mut number: i64 = 0;
        for (value, bits) in [self.major, self.minor, self.patch].iter().zip(VERSION_NUMBER_BITS) {
            number = (number << bits) | i64::from(*value);
        }
        number
    }

    /// Inverse of [`Version::packed`], used when reading rows back out of the store
    pub fn from_packed(packed: i64) -> Version {
        let mut parts = [0u32; 3];
        let mut rest = packed;
        for (i, bits) in VERSION_NUMBER_BITS.iter().enumerate().rev() {
            let mask = (1i64 << bits) - 1;
            parts[i] = (rest & mask) as u32;
            rest >>= bits;
        }
        Version::new(parts[0], parts[1], parts[2])
    }
}

impl FromStr for Version {
    type Err = VersionError;

    /// Missing trailing components are zero, so `"1.2"` parses as `1.2.0`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components: Vec<&str> = s.trim().split('.').collect();
        if components.len() > VERSION_NUMBER_BITS.len() {
            return Err(VersionError::TooManyComponents(s.to_string()));
        }

        let mut parts = [0u32; 3];
        for (i, component) in components.iter().enumerate() {
            let value: u64 = component.parse().map_err(|_| VersionError::NotANumber {
                version: s.to_string(),
                component: component.to_string(),
            })?;
            let bits = VERSION_NUMBER_BITS[i];
            if value > (1u64 << bits) - 1 {
                return Err(VersionError::Overflow { version: s.to_string(), value, bits });
            }
            parts[i] = value as u32;
        }

        Ok(Version::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.packed().cmp(&other.packed())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn packs_components_into_bit_fields() {
        let version: Version = "1.2.3".parse().unwrap();
        assert_eq!(version.packed(), (1 << 24) | (2 << 14) | 3);
        assert_eq!(Version::from_packed(version.packed()), version);
    }

    #[test]
    fn missing_components_are_zero() {
        assert_eq!("2".parse::<Version>().unwrap(), Version::new(2, 0, 0));
        assert_eq!("2.1".parse::<Version>().unwrap(), Version::new(2, 1, 0));
    }

    #[test]
    fn compares_numerically_not_lexically() {
        let older: Version = "1.9.0".parse().unwrap();
        let newer: Version = "1.10.0".parse().unwrap();
        assert!(newer > older);
        assert!(newer.packed() > older.packed());
        assert!("1.0.0".parse::<Version>().unwrap() > "0.1023.16383".parse().unwrap());
    }

    #[test]
    fn rejects_overflow_and_garbage() {
        assert!(matches!("256.0.0".parse::<Version>(), Err(VersionError::Overflow { bits: 8, .. })));
        assert!(matches!("0.1024.0".parse::<Version>(), Err(VersionError::Overflow { bits: 10, .. })));
        assert!(matches!("1.0.x".parse::<Version>(), Err(VersionError::NotANumber { .. })));
        assert!(matches!("1.0.0.0".parse::<Version>(), Err(VersionError::TooManyComponents(_))));
    }

    #[test]
    fn largest_version_round_trips() {
        let max = Version::new(255, 1023, 16383);
        assert_eq!(max.packed(), u32::MAX as i64);
        assert_eq!(Version::from_packed(max.packed()), max);
    }
}
