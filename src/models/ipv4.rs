//! IPv4 address and mask arithmetic.
//!
//! All values are plain `u32` bit patterns or [`Ipv4Addr`]. Shifts are done in
//! `u64` and truncated back so a `/0` or `/32` never hits a shift overflow.

use crate::error::SubnetError;
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Dotted quad with 1-3 digits per octet; range and leading zeros are checked after matching.
static ADDRESS_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_address_regex() -> &'static Regex {
    ADDRESS_REGEX.get_or_init(|| {
        Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("Invalid Regex")
    })
}

/// Parse a dotted-quad IPv4 address.
///
/// Leading zeros are rejected (`"010"`), the literal `"0"` is accepted.
///
/// # Examples
/// ```
/// use subnet_trainer::models::parse_address;
/// assert_eq!(parse_address("192.168.1.1").unwrap().octets(), [192, 168, 1, 1]);
/// assert!(parse_address("192.168.01.1").is_err());
/// ```
pub fn parse_address(input: &str) -> Result<Ipv4Addr, SubnetError> {
    let trimmed = input.trim();
    let caps = get_address_regex()
        .captures(trimmed)
        .ok_or_else(|| SubnetError::invalid_format(input, "IPv4 address"))?;

    let mut octets = [0u8; 4];
    for (i, octet) in octets.iter_mut().enumerate() {
        let text = &caps[i + 1];
        if text.len() > 1 && text.starts_with('0') {
            return Err(SubnetError::invalid_format(input, "IPv4 address"));
        }
        let value: u16 = text
            .parse()
            .map_err(|_| SubnetError::invalid_format(input, "IPv4 address"))?;
        *octet = u8::try_from(value).map_err(|_| SubnetError::invalid_format(input, "IPv4 address"))?;
    }
    Ok(Ipv4Addr::from(octets))
}

/// Canonical dotted-quad form.
pub fn format_address(addr: Ipv4Addr) -> String {
    addr.to_string()
}

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use subnet_trainer::models::prefix_to_mask;
/// assert_eq!(prefix_to_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn prefix_to_mask(len: u8) -> Result<u32, SubnetError> {
    if len > MAX_LENGTH {
        Err(SubnetError::invalid_format(
            &len.to_string(),
            "prefix length (0-32)",
        ))
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u32::MAX as u64;

        let mask = (all_bits >> right_len) << right_len;

        Ok((mask & all_bits) as u32)
    }
}

/// Convert a subnet mask to its prefix length.
///
/// A mask is contiguous when `!mask + 1` is zero or a power of two.
pub fn mask_to_prefix(mask: u32) -> Result<u8, SubnetError> {
    let inverted_plus_one = (!mask).wrapping_add(1);
    if inverted_plus_one != 0 && !inverted_plus_one.is_power_of_two() {
        return Err(SubnetError::NotContiguousMask {
            mask: Ipv4Addr::from(mask),
        });
    }
    Ok(mask.leading_ones() as u8)
}

/// Parse `a.b.c.d/len` or `a.b.c.d/m.m.m.m` into an address and prefix.
///
/// The address is returned as written; host bits are not cleared.
pub fn parse_cidr(input: &str) -> Result<(Ipv4Addr, u8), SubnetError> {
    let trimmed = input.trim();
    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() != 2 {
        return Err(SubnetError::invalid_format(input, "CIDR block"));
    }
    let addr = parse_address(parts[0])
        .map_err(|_| SubnetError::invalid_format(input, "CIDR block"))?;

    let prefix = if parts[1].contains('.') {
        let mask = parse_address(parts[1])
            .map_err(|_| SubnetError::invalid_format(input, "CIDR block"))?;
        mask_to_prefix(u32::from(mask))?
    } else {
        let digits = parts[1];
        if digits.is_empty()
            || digits.len() > 2
            || !digits.bytes().all(|b| b.is_ascii_digit())
            || (digits.len() > 1 && digits.starts_with('0'))
        {
            return Err(SubnetError::invalid_format(input, "CIDR block"));
        }
        let len: u8 = digits
            .parse()
            .map_err(|_| SubnetError::invalid_format(input, "CIDR block"))?;
        if len > MAX_LENGTH {
            return Err(SubnetError::invalid_format(input, "CIDR block"));
        }
        len
    };
    Ok((addr, prefix))
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, SubnetError> {
    let mask = prefix_to_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Calculate the broadcast address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, SubnetError> {
    let mask = prefix_to_mask(len)?;
    let addr_bits = u32::from(addr);
    let network_bits = addr_bits & mask;
    let broadcast_bits = network_bits | (!mask);
    Ok(Ipv4Addr::from(broadcast_bits))
}

/// Returns the IP address following the given subnet.
///
/// Running past `255.255.255.255` is an error, the address space does not wrap.
pub fn ip_after_subnet(addr: Ipv4Addr, cidr: u8) -> Result<Ipv4Addr, SubnetError> {
    let network_bits = u32::from(cut_addr(addr, cidr)?) as u64;
    let next_subnet_bits = network_bits + block_size(cidr)?;
    if next_subnet_bits > u32::MAX as u64 {
        return Err(SubnetError::InsufficientSpace {
            requested: format!("the network after {}/{}", cut_addr(addr, cidr)?, cidr),
            reason: "the IPv4 address space ends at 255.255.255.255".to_string(),
            suggestion: "choose a network that is not the last block of its size".to_string(),
        });
    }
    Ok(Ipv4Addr::from(next_subnet_bits as u32))
}

/// Number of addresses in a block of the given prefix length.
pub fn block_size(len: u8) -> Result<u64, SubnetError> {
    if len > MAX_LENGTH {
        return Err(SubnetError::invalid_format(
            &len.to_string(),
            "prefix length (0-32)",
        ));
    }
    Ok(1u64 << (MAX_LENGTH - len))
}

/// Calculate the minimum mask for an IP address based on trailing zeros.
///
/// This is the largest block (smallest prefix) `ip` can be the network address of.
pub fn lo_mask(ip: Ipv4Addr) -> u8 {
    let ip_u32 = u32::from(ip);
    let trailing_zeros = ip_u32.trailing_zeros() as u8;
    assert!(trailing_zeros <= 32, "Trailing zeros exceed 32 bits");
    MAX_LENGTH - trailing_zeros
}

/// Smallest `b` with `2^b >= n`.
pub fn ceil_log2(n: u64) -> u8 {
    if n <= 1 {
        0
    } else {
        (64 - (n - 1).leading_zeros()) as u8
    }
}

/// Position of the highest set bit plus one; zero for zero.
pub fn bit_length(value: u32) -> u8 {
    (32 - value.leading_zeros()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("192.168.1.42").unwrap(),
            Ipv4Addr::new(192, 168, 1, 42)
        );
        assert_eq!(parse_address("0.0.0.0").unwrap(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(parse_address(" 10.0.0.1 ").unwrap(), Ipv4Addr::new(10, 0, 0, 1));
        assert!(parse_address("256.1.1.1").is_err());
        assert!(parse_address("1.2.3").is_err());
        assert!(parse_address("1.2.3.4.5").is_err());
        assert!(parse_address("01.2.3.4").is_err());
        assert!(parse_address("1.2.3.00").is_err());
        assert!(parse_address("1.2.3.-4").is_err());
        assert!(parse_address("a.b.c.d").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_parse_format_round_trip() {
        for addr in [0u32, 1, 0x7F000001, 0xC0A80101, 0xFFFFFFFF] {
            let ip = Ipv4Addr::from(addr);
            assert_eq!(parse_address(&format_address(ip)).unwrap(), ip);
        }
    }

    #[test]
    fn test_prefix_to_mask() {
        assert_eq!(prefix_to_mask(0).unwrap(), 0x00000000);
        assert_eq!(prefix_to_mask(8).unwrap(), 0xFF000000);
        assert_eq!(prefix_to_mask(16).unwrap(), 0xFFFF0000);
        assert_eq!(prefix_to_mask(24).unwrap(), 0xFFFFFF00);
        assert_eq!(prefix_to_mask(27).unwrap(), 0xFFFFFFE0);
        assert_eq!(prefix_to_mask(32).unwrap(), 0xFFFFFFFF);
        assert!(prefix_to_mask(33).is_err());
    }

    #[test]
    fn test_mask_to_prefix() {
        for len in 0..=MAX_LENGTH {
            let mask = prefix_to_mask(len).unwrap();
            assert_eq!(mask_to_prefix(mask).unwrap(), len);
            assert_eq!(prefix_to_mask(mask_to_prefix(mask).unwrap()).unwrap(), mask);
        }
        assert_eq!(
            mask_to_prefix(0xFF00FF00),
            Err(SubnetError::NotContiguousMask {
                mask: Ipv4Addr::new(255, 0, 255, 0)
            })
        );
        assert!(mask_to_prefix(0x00000001).is_err());
        assert!(mask_to_prefix(0x7FFFFFFF).is_err());
    }

    #[test]
    fn test_parse_cidr() {
        assert_eq!(
            parse_cidr("10.1.2.0/24").unwrap(),
            (Ipv4Addr::new(10, 1, 2, 0), 24)
        );
        assert_eq!(
            parse_cidr("10.1.2.3/255.255.0.0").unwrap(),
            (Ipv4Addr::new(10, 1, 2, 3), 16)
        );
        assert_eq!(parse_cidr("0.0.0.0/0").unwrap(), (Ipv4Addr::UNSPECIFIED, 0));
        assert!(parse_cidr("10.1.2.0").is_err());
        assert!(parse_cidr("10.1.2.0/33").is_err());
        assert!(parse_cidr("10.1.2.0/024").is_err());
        assert!(parse_cidr("10.1.2.0/").is_err());
        assert!(parse_cidr("10.1.2.0/24/1").is_err());
        assert!(matches!(
            parse_cidr("10.1.2.0/255.0.255.0"),
            Err(SubnetError::NotContiguousMask { .. })
        ));
    }

    #[test]
    fn test_cut_addr() {
        let ip = Ipv4Addr::new(192, 168, 1, 42);
        assert_eq!(cut_addr(ip, 24).unwrap(), Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(cut_addr(ip, 16).unwrap(), Ipv4Addr::new(192, 168, 0, 0));
        assert_eq!(cut_addr(ip, 8).unwrap(), Ipv4Addr::new(192, 0, 0, 0));
        assert_eq!(cut_addr(ip, 32).unwrap(), Ipv4Addr::new(192, 168, 1, 42));
        assert_eq!(cut_addr(ip, 0).unwrap(), Ipv4Addr::UNSPECIFIED);
        assert!(cut_addr(ip, 33).is_err());
    }

    #[test]
    fn test_ip_after_subnet() {
        let ip = Ipv4Addr::new(192, 168, 1, 0);
        assert_eq!(
            ip_after_subnet(ip, 24).unwrap(),
            Ipv4Addr::new(192, 168, 2, 0)
        );
        assert_eq!(
            ip_after_subnet(ip, 16).unwrap(),
            Ipv4Addr::new(192, 169, 0, 0)
        );
        assert_eq!(ip_after_subnet(ip, 8).unwrap(), Ipv4Addr::new(193, 0, 0, 0));
        assert_eq!(
            ip_after_subnet(ip, 32).unwrap(),
            Ipv4Addr::new(192, 168, 1, 1)
        );
        assert!(ip_after_subnet(Ipv4Addr::new(255, 255, 255, 255), 24).is_err());
        assert!(ip_after_subnet(Ipv4Addr::UNSPECIFIED, 0).is_err());
    }

    #[test]
    fn test_broadcast_addr() {
        let ip = Ipv4Addr::new(192, 168, 1, 0);
        assert_eq!(
            broadcast_addr(ip, 24).unwrap(),
            Ipv4Addr::new(192, 168, 1, 255)
        );
        assert_eq!(
            broadcast_addr(ip, 16).unwrap(),
            Ipv4Addr::new(192, 168, 255, 255)
        );
        assert_eq!(
            broadcast_addr(ip, 32).unwrap(),
            Ipv4Addr::new(192, 168, 1, 0)
        );
        assert_eq!(
            broadcast_addr(ip, 0).unwrap(),
            Ipv4Addr::new(255, 255, 255, 255)
        );
    }

    #[test]
    fn test_network_broadcast_properties() {
        let addr = Ipv4Addr::new(172, 20, 77, 201);
        for len in 0..=MAX_LENGTH {
            let mask = prefix_to_mask(len).unwrap();
            let network = u32::from(cut_addr(addr, len).unwrap());
            let broadcast = u32::from(broadcast_addr(addr, len).unwrap());
            assert_eq!(network & mask, network);
            assert_eq!(broadcast | !mask, broadcast);
            assert_eq!(
                (broadcast - network) as u64 + 1,
                block_size(len).unwrap()
            );
        }
    }

    #[test]
    fn test_lo_mask() {
        assert_eq!(lo_mask(Ipv4Addr::new(192, 168, 1, 1)), 32);
        assert_eq!(lo_mask(Ipv4Addr::new(10, 6, 2, 80)), 28);
        assert_eq!(lo_mask(Ipv4Addr::new(10, 0, 0, 0)), 7);
        assert_eq!(lo_mask(Ipv4Addr::UNSPECIFIED), 0);
    }

    #[test]
    fn test_ceil_log2_and_bit_length() {
        assert_eq!(ceil_log2(0), 0);
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(102), 7);
        assert_eq!(bit_length(0), 0);
        assert_eq!(bit_length(1), 1);
        assert_eq!(bit_length(0x300), 10);
        assert_eq!(bit_length(u32::MAX), 32);
    }
}
