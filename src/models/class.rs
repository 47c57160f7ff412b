//! Legacy classful addressing (A/B/C/D/E).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Address class by first-octet range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpClass {
    A,
    B,
    C,
    D,
    E,
}

impl IpClass {
    /// Classify an address. `0.x.x.x` and `127.x.x.x` count as class A.
    pub fn of(addr: Ipv4Addr) -> IpClass {
        match addr.octets()[0] {
            0..=127 => IpClass::A,
            128..=191 => IpClass::B,
            192..=223 => IpClass::C,
            224..=239 => IpClass::D,
            _ => IpClass::E,
        }
    }

    /// Default prefix length, `None` for D and E.
    pub fn default_prefix(self) -> Option<u8> {
        match self {
            IpClass::A => Some(8),
            IpClass::B => Some(16),
            IpClass::C => Some(24),
            IpClass::D | IpClass::E => None,
        }
    }

    /// Default subnet mask, `None` for D and E.
    pub fn default_mask(self) -> Option<u32> {
        self.default_prefix()
            .map(|len| u32::MAX.checked_shl(32 - len as u32).unwrap_or(0))
    }

    /// First-octet range as `(low, high)`.
    pub fn first_octet_range(self) -> (u8, u8) {
        match self {
            IpClass::A => (0, 127),
            IpClass::B => (128, 191),
            IpClass::C => (192, 223),
            IpClass::D => (224, 239),
            IpClass::E => (240, 255),
        }
    }
}

impl fmt::Display for IpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            IpClass::A => "A",
            IpClass::B => "B",
            IpClass::C => "C",
            IpClass::D => "D",
            IpClass::E => "E",
        };
        write!(f, "{letter}")
    }
}

/// Free-function form of [`IpClass::of`].
pub fn class_of(addr: Ipv4Addr) -> IpClass {
    IpClass::of(addr)
}

/// Free-function form of [`IpClass::default_mask`].
pub fn default_mask(class: IpClass) -> Option<u32> {
    class.default_mask()
}
