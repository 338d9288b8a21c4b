/*!
# Discprint: Media Catalog Numbers
*/

use crate::DiscprintError;
use std::fmt;
use trimothy::TrimSliceMatches;



#[derive(Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
/// # Media Catalog Number.
///
/// A simple wrapper for the 13-digit UPC/EAN-style catalog number a disc
/// may carry, enforcing validity and consistent formatting.
///
/// Pressing plants are sloppy about check digits, so unlike a retail
/// barcode, anything numeric and non-zero is accepted.
pub struct Mcn([u8; 13]);

impl fmt::Display for Mcn {
	#[expect(unsafe_code, reason = "Content is ASCII.")]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// Safety: all values are ASCII digits.
		let s = unsafe { std::str::from_utf8_unchecked(self.0.as_slice()) };
		f.write_str(s)
	}
}

impl TryFrom<&[u8]> for Mcn {
	type Error = DiscprintError;

	fn try_from(mut src: &[u8]) -> Result<Self, Self::Error> {
		// Remove whitespace and trailing nulls.
		src = src.trim_start_matches(|b: u8| b.is_ascii_whitespace());
		src = src.trim_end_matches(|b: u8| b.is_ascii_whitespace() || b == 0);

		// Make sure we've got 12-13 ASCII digits and nothing else.
		if ! (12..=13).contains(&src.len()) || ! src.iter().all(u8::is_ascii_digit) {
			return Err(DiscprintError::Mcn);
		}

		// All zeroes means "no catalog number", not a catalog number.
		if src.iter().all(|&b| b == b'0') { return Err(DiscprintError::Mcn); }

		// Copy the data to the end of an ASCII-zero-padded slice.
		let mut out = [b'0'; 13];
		out[13 - src.len()..].copy_from_slice(src);

		Ok(Self(out))
	}
}

impl TryFrom<&str> for Mcn {
	type Error = DiscprintError;

	#[inline]
	fn try_from(src: &str) -> Result<Self, Self::Error> {
		Self::try_from(src.as_bytes())
	}
}

impl Mcn {
	#[expect(unsafe_code, reason = "Content is ASCII.")]
	#[must_use]
	/// # As Str.
	pub const fn as_str(&self) -> &str {
		// Safety: all values are ASCII digits.
		unsafe { std::str::from_utf8_unchecked(self.0.as_slice()) }
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_mcn() {
		// Thirteen digits pass straight through.
		let mcn = Mcn::try_from("0075992742320").expect("Mcn failed.");
		assert_eq!(mcn.to_string(), "0075992742320");

		// Twelve get zero-padded.
		let mcn = Mcn::try_from("75992742320 ").expect("Mcn failed.");
		assert_eq!(mcn.to_string(), "0075992742320");

		// Trailing nulls, as drives deliver them, are fine.
		let mcn = Mcn::try_from(&b"0731455829921\0\0"[..]).expect("Mcn failed.");
		assert_eq!(mcn.as_str(), "0731455829921");

		// Garbage is not.
		assert!(Mcn::try_from("0000000000000").is_err());
		assert!(Mcn::try_from("00759927423").is_err());
		assert!(Mcn::try_from("0075992X42320").is_err());
		assert!(Mcn::try_from("").is_err());
	}
}
