/*!
# Discprint: MusicBrainz
*/

use crate::{
	CD_LEADIN,
	DiscType,
	ShaB64,
	Toc,
};
use sha1::Digest;



impl Toc {
	#[must_use]
	/// # MusicBrainz ID.
	///
	/// This returns the [MusicBrainz](https://musicbrainz.org/) ID
	/// corresponding to the table of contents: a sha1 over a fixed-width
	/// uppercase-hex record of the audio layout.
	///
	/// Data sessions complicate the "audio layout" part:
	/// * CD-Extra discs drop their trailing data track(s) and hash the
	///   audio-session leadout;
	/// * mixed-mode discs keep everything, data track included, with the
	///   disc leadout.
	///
	/// ## Examples
	///
	/// ```
	/// use discprint_core::TocDialect;
	///
	/// let toc = TocDialect::AccurateRip.parse("4 4 1 0 11413 25024 45713 55220").unwrap();
	/// assert_eq!(
	///     toc.musicbrainz_id().to_string(),
	///     "nljDXdC8B_pDwbdY1vZJvdrAZI4-",
	/// );
	/// ```
	pub fn musicbrainz_id(&self) -> ShaB64 {
		let (last, leadout) =
			if matches!(self.disc_type(), DiscType::Enhanced) {
				(
					self.last_audio_track().unwrap_or_else(|| self.last_track()),
					self.audio_leadout(),
				)
			}
			else { (self.last_track(), self.leadout()) };
		let first = self.first_track();

		let mut sha = sha1::Sha1::new();
		let mut buf = [b'0'; 8];

		// First and last track numbers, two hex digits apiece.
		hex_u8(first, &mut buf);
		sha.update(&buf[..2]);
		hex_u8(last, &mut buf);
		sha.update(&buf[..2]);

		// The leadout, with its pregap back on.
		hex_u32(leadout + CD_LEADIN, &mut buf);
		sha.update(buf);

		// Ninety-nine fixed-width offset slots, keyed by track number;
		// anything outside the hashed range stays zero.
		for k in 1..=99_u8 {
			let slot =
				if first <= k && k <= last {
					self.track(k).map(|t| t.lba() + CD_LEADIN)
				}
				else { None };

			if let Some(v) = slot {
				hex_u32(v, &mut buf);
				sha.update(buf);
			}
			else { sha.update(b"00000000"); }
		}

		ShaB64::from(sha)
	}

	#[must_use]
	/// # MusicBrainz Submission URL.
	///
	/// Where to look the disc up (or submit it, if nobody has).
	pub fn musicbrainz_url(&self) -> String {
		let mut out = String::with_capacity(62);
		out.push_str("https://musicbrainz.org/cdtoc/");
		out.push_str(&self.musicbrainz_id().pretty_print());
		out
	}
}



/// # Uppercase Hex, Two Digits.
fn hex_u8(v: u8, buf: &mut [u8; 8]) {
	faster_hex::hex_encode_fallback(&[v], &mut buf[..2]);
	buf[..2].make_ascii_uppercase();
}

/// # Uppercase Hex, Eight Digits.
fn hex_u32(v: i32, buf: &mut [u8; 8]) {
	faster_hex::hex_encode_fallback(v.max(0).to_be_bytes().as_slice(), buf);
	buf.make_ascii_uppercase();
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::TocDialect;

	#[test]
	fn t_musicbrainz() {
		for (dialect, text, id) in [
			(
				TocDialect::AccurateRip,
				"4 4 1 0 11413 25024 45713 55220",
				"nljDXdC8B_pDwbdY1vZJvdrAZI4-",
			),
			// Twenty-one tracks behind a hidden-track pregap.
			(
				TocDialect::MusicBrainz,
				"1 21 207686 9342 11244 19188 29544 38660 46996 57969 69840 76666 83393 93359 103887 111631 127050 136064 144941 153757 162109 173920 186930 196833",
				"JTsyXbyn9DUbppDWELj5o5CiFaI-",
			),
		] {
			let toc = dialect.parse(text).expect("Invalid TOC");
			assert_eq!(toc.musicbrainz_id().to_string(), id);
		}
	}

	#[test]
	fn t_musicbrainz_enhanced() {
		// A CD-Extra hashes only its audio half, so the same audio layout
		// with and without the data session produces the same ID.
		let audio = TocDialect::AccurateRip
			.parse("2 2 1 0 20000 50000")
			.expect("Invalid TOC");
		let extra = TocDialect::AccurateRip
			.parse("3 2 1 0 20000 50000 80000")
			.expect("Invalid TOC");

		assert_eq!(audio.musicbrainz_id(), extra.musicbrainz_id());

		// Mixed mode keeps its data track, so it hashes differently from
		// the audio tracks alone.
		let mixed = TocDialect::AccurateRip
			.parse("3 2 2 0 20000 50000 80000")
			.expect("Invalid TOC");
		assert_ne!(mixed.musicbrainz_id(), extra.musicbrainz_id());
	}

	#[test]
	fn t_musicbrainz_url() {
		let toc = TocDialect::AccurateRip
			.parse("4 4 1 0 11413 25024 45713 55220")
			.expect("Invalid TOC");
		assert_eq!(
			toc.musicbrainz_url(),
			"https://musicbrainz.org/cdtoc/nljDXdC8B_pDwbdY1vZJvdrAZI4-",
		);
	}
}
