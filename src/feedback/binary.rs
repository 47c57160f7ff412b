//! Binary renderings for teaching output.

use crate::models::MAX_LENGTH;

/// Dotted binary with each octet split into nibbles.
///
/// # Examples
/// ```
/// use subnet_trainer::feedback::nibble_binary;
/// assert_eq!(nibble_binary(0xC0A80100), "1100 0000.1010 1000.0000 0001.0000 0000");
/// ```
pub fn nibble_binary(value: u32) -> String {
    render(value, None)
}

/// Like [`nibble_binary`], with a `|` between network and host bits.
pub fn split_binary(value: u32, prefix: u8) -> String {
    render(value, Some(prefix))
}

fn render(value: u32, split_at: Option<u8>) -> String {
    let mut out = String::with_capacity(48);
    for bit in 0..MAX_LENGTH {
        if bit > 0 {
            if bit % 8 == 0 {
                out.push('.');
            } else if bit % 4 == 0 {
                out.push(' ');
            }
            if split_at == Some(bit) {
                out.push('|');
            }
        }
        let set = value & (1u32 << (MAX_LENGTH - 1 - bit)) != 0;
        out.push(if set { '1' } else { '0' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nibble_binary() {
        assert_eq!(
            nibble_binary(0xFFFFFFC0),
            "1111 1111.1111 1111.1111 1111.1100 0000"
        );
        assert_eq!(nibble_binary(0), "0000 0000.0000 0000.0000 0000.0000 0000");
    }

    #[test]
    fn test_split_binary() {
        assert_eq!(
            split_binary(0xFFFFFFC0, 26),
            "1111 1111.1111 1111.1111 1111.11|00 0000"
        );
        assert_eq!(
            split_binary(0xFFFF0000, 16),
            "1111 1111.1111 1111.|0000 0000.0000 0000"
        );
        // No marker at either end.
        assert_eq!(split_binary(0, 0), nibble_binary(0));
        assert_eq!(split_binary(u32::MAX, 32), nibble_binary(u32::MAX));
    }
}
