// SPDX-License-Identifier: Apache-2.0

//! Helpers for concrete bit-vector values read back from a solver model.
//!
//! Values are `bitvec` vectors where index 0 is the least significant bit.

use bitvec::vec::BitVec;

/// Concrete bit-vector value, LSB at index 0.
pub type Bits = BitVec;

/// Converts a `&[bool]` slice into [`Bits`].
///
/// ```
/// use netlist_smt::value_utils::{bits_from_lsb_is_0, bits_to_u128};
///
/// let bools = vec![true, false, true, false]; // LSB is bools[0]
/// let bits = bits_from_lsb_is_0(&bools);
/// assert_eq!(bits.len(), 4);
/// assert_eq!(bits_to_u128(&bits), Some(0b0101));
/// ```
pub fn bits_from_lsb_is_0(bits: &[bool]) -> Bits {
    bits.iter().copied().collect()
}

/// Builds a `width`-bit value from the low bits of `value`.
pub fn bits_from_u128(width: usize, value: u128) -> Bits {
    (0..width)
        .map(|i| i < 128 && (value >> i) & 1 == 1)
        .collect()
}

/// Returns the unsigned value of `bits`, or `None` if a set bit lies beyond
/// bit 127.
pub fn bits_to_u128(bits: &Bits) -> Option<u128> {
    let mut value: u128 = 0;
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            if i >= 128 {
                return None;
            }
            value |= 1u128 << i;
        }
    }
    Some(value)
}

/// Number of bits needed to represent `bits` as an unsigned value (zero needs
/// zero bits).
pub fn significant_bits(bits: &Bits) -> usize {
    bits.last_one().map_or(0, |i| i + 1)
}

/// Drops high zero bits so equal values compare equal.
pub fn trim_high_zeros(mut bits: Bits) -> Bits {
    let len = significant_bits(&bits);
    bits.truncate(len);
    bits
}

/// Shortest unsigned representation of `value`.
pub fn bits_from_u128_trimmed(value: u128) -> Bits {
    trim_high_zeros(bits_from_u128(128, value))
}

fn parse_decimal(digits: &str) -> Result<Bits, String> {
    // Little-endian base 2^32 limbs.
    let mut limbs: Vec<u32> = Vec::new();
    for c in digits.chars() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| format!("invalid decimal digit {:?} in {:?}", c, digits))?;
        let mut carry = u64::from(digit);
        for limb in limbs.iter_mut() {
            let v = u64::from(*limb) * 10 + carry;
            *limb = v as u32;
            carry = v >> 32;
        }
        if carry != 0 {
            limbs.push(carry as u32);
        }
    }
    Ok(limbs
        .iter()
        .flat_map(|&limb| (0..32).map(move |i| (limb >> i) & 1 == 1))
        .collect())
}

fn parse_hex(digits: &str) -> Result<Bits, String> {
    let mut bits = Bits::with_capacity(digits.len() * 4);
    for c in digits.chars().rev() {
        let digit = c
            .to_digit(16)
            .ok_or_else(|| format!("invalid hex digit {:?} in {:?}", c, digits))?;
        for shift in 0..4 {
            bits.push((digit >> shift) & 1 == 1);
        }
    }
    Ok(bits)
}

/// Parses an unsigned integer of any size, decimal or `0x` hex, with optional
/// `_` separators. The result carries no high zero bits.
///
/// ```
/// use netlist_smt::value_utils::{parse_unsigned_literal, bits_to_u128};
///
/// assert_eq!(bits_to_u128(&parse_unsigned_literal("0xA5").unwrap()), Some(0xa5));
/// let wide = parse_unsigned_literal("0x1_0000_0000_0000_0000_0000_0000_0000_0000").unwrap();
/// assert_eq!(wide.len(), 129);
/// ```
pub fn parse_unsigned_literal(text: &str) -> Result<Bits, String> {
    let text = text.trim();
    let cleaned = text.replace('_', "");
    let bits = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() => parse_hex(hex),
        None if !cleaned.is_empty() => parse_decimal(&cleaned),
        _ => Err(format!("empty integer literal {:?}", text)),
    }?;
    Ok(trim_high_zeros(bits))
}

/// Formats `bits` as an SMT-LIB binary literal, e.g. `#b0101`.
pub fn bits_to_smt_literal(bits: &Bits) -> String {
    let mut s = String::with_capacity(2 + bits.len());
    s.push_str("#b");
    for bit in bits.iter().rev() {
        s.push(if *bit { '1' } else { '0' });
    }
    s
}

/// Formats `bits` as a `0x` hex number; an empty value is `0x0`.
pub fn bits_to_hex(bits: &Bits) -> String {
    let width = bits.len();
    let mut hex = String::new();
    let nibbles = (width + 3) / 4;
    for nibble in (0..nibbles).rev() {
        let mut digit = 0u32;
        for j in 0..4 {
            let idx = nibble * 4 + j;
            if idx < width && bits[idx] {
                digit |= 1 << j;
            }
        }
        hex.push(std::char::from_digit(digit, 16).unwrap_or('?'));
    }
    if hex.is_empty() {
        hex.push('0');
    }
    format!("0x{}", hex)
}

/// Formats `bits` in the driver's human-readable form, `bits[N]:0x..`.
pub fn bits_to_string(bits: &Bits) -> String {
    format!("bits[{}]:{}", bits.len(), bits_to_hex(bits))
}

/// Parses an SMT-LIB bit-vector literal (`#b...` or `#x...`) as produced by a
/// solver's `get-value` response.
pub fn parse_smt_literal(atom: &str) -> Result<Bits, String> {
    let msb_first: Vec<bool> = if let Some(rest) = atom.strip_prefix("#b") {
        rest.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(format!("invalid binary digit {:?} in {:?}", c, atom)),
            })
            .collect::<Result<_, _>>()?
    } else if let Some(rest) = atom.strip_prefix("#x") {
        let mut out = Vec::with_capacity(rest.len() * 4);
        for c in rest.chars() {
            let digit = c
                .to_digit(16)
                .ok_or_else(|| format!("invalid hex digit {:?} in {:?}", c, atom))?;
            for shift in (0..4).rev() {
                out.push((digit >> shift) & 1 == 1);
            }
        }
        out
    } else {
        return Err(format!("not a bit-vector literal: {:?}", atom));
    };
    Ok(msb_first.into_iter().rev().collect())
}

const SMT_RESERVED_WORDS: &[&str] = &[
    "_", "!", "as", "let", "exists", "forall", "match", "par", "BINARY", "DECIMAL",
    "HEXADECIMAL", "NUMERAL", "STRING",
];

/// Renders `name` as an SMT-LIB symbol, quoting it as `|name|` unless it is a
/// simple, non-reserved symbol.
///
/// Returns `None` for names that contain `|` or `\`, which no SMT-LIB symbol
/// can carry. Distinct accepted names always render to distinct symbols.
pub fn smt_symbol(name: &str) -> Option<String> {
    if name.contains(|c| c == '|' || c == '\\') {
        return None;
    }
    let simple = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !SMT_RESERVED_WORDS.contains(&name)
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric() || "~!@$%^&*_-+=<>.?/".contains(c)
        });
    Some(if simple {
        name.to_string()
    } else {
        format!("|{}|", name)
    })
}
