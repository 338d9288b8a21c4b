/*!
# Discprint: Sha1/Base64
*/

use std::fmt;



/// # The MusicBrainz Alphabet.
///
/// Standard base64 with `.` and `_` standing in for `+` and `/` (and `-`
/// for the `=` padding) so the result survives life inside a URL.
const ALPHABET: &[u8; 64] =
	b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789._";



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Sha1/Base64.
///
/// A binary sha1 digest rendered with MusicBrainz's almost-but-not-quite
/// standard base64 alphabet. String formatting is deferred until
/// `ShaB64::to_string` or [`ShaB64::pretty_print`] are called, keeping the
/// footprint small and `Copy`-friendly.
pub struct ShaB64([u8; 20]);

impl fmt::Display for ShaB64 {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.pretty_print())
	}
}

impl From<sha1::Sha1> for ShaB64 {
	#[inline]
	fn from(src: sha1::Sha1) -> Self {
		use sha1::Digest;
		Self(<[u8; 20]>::from(src.finalize()))
	}
}

impl ShaB64 {
	#[must_use]
	/// # Pretty Print.
	///
	/// Encode the digest as its 28-character string form. Twenty bytes is
	/// six whole three-byte groups plus a two-byte straggler, so the final
	/// character is always the `-` pad.
	pub fn pretty_print(&self) -> String {
		let mut out = String::with_capacity(28);
		for chunk in self.0.chunks(3) {
			let b0 = chunk[0];
			let b1 = chunk.get(1).copied().unwrap_or(0);
			let b2 = chunk.get(2).copied().unwrap_or(0);

			out.push(char::from(ALPHABET[usize::from(b0 >> 2)]));
			out.push(char::from(ALPHABET[usize::from(((b0 & 0b0011) << 4) | (b1 >> 4))]));
			if 1 < chunk.len() {
				out.push(char::from(ALPHABET[usize::from(((b1 & 0b1111) << 2) | (b2 >> 6))]));
			}
			else { out.push('-'); }
			if 2 < chunk.len() {
				out.push(char::from(ALPHABET[usize::from(b2 & 0b0011_1111)]));
			}
			else { out.push('-'); }
		}
		out
	}
}



#[cfg(test)]
mod tests {
	use super::*;
	use sha1::Digest;

	#[test]
	fn t_shab64() {
		// sha1("") = da39a3ee5e6b4b0d3255bfef95601890afd80709; standard
		// base64 of that is "2jmj7l5rSw0yVb/vlWAYkK/YBwk=", which our
		// alphabet respells.
		let id = ShaB64::from(sha1::Sha1::new());
		let s = id.pretty_print();
		assert_eq!(s.len(), 28);
		assert_eq!(s, "2jmj7l5rSw0yVb_vlWAYkK_YBwk-");
		assert_eq!(id.to_string(), s);
	}
}
