/*!
# Discprint: CDDB/FreeDB
*/

use crate::{
	CD_LEADIN,
	FRAMES_PER_SECOND,
	Toc,
};
use std::fmt;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # CDDB ID.
///
/// The classic FreeDB/CDDB disc ID: a digit-sum checksum, the playing time
/// in seconds, and the track count, squeezed into one `u32`.
///
/// Values of this type are returned by [`Toc::cddb_id`].
pub struct Cddb(u32);

impl fmt::Display for Cddb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut buf = [b'0'; 8];
		faster_hex::hex_encode_fallback(self.0.to_be_bytes().as_slice(), &mut buf);
		std::str::from_utf8(buf.as_slice())
			.map_err(|_| fmt::Error)
			.and_then(|s| f.write_str(s))
	}
}

impl From<Cddb> for u32 {
	#[inline]
	fn from(src: Cddb) -> Self { src.0 }
}

impl From<&Toc> for Cddb {
	fn from(src: &Toc) -> Self {
		// The checksum is the digit sum of each track's start time in
		// (pregap-inclusive) seconds, data tracks included.
		let mut n: u32 = 0;
		let mut buf = itoa::Buffer::new();
		for t in src.tracks() {
			let secs = (t.lba() + CD_LEADIN).wrapping_div(FRAMES_PER_SECOND);
			for b in buf.format(secs).bytes() {
				n += u32::from(b ^ b'0');
			}
		}

		// Playing time is the difference of *independently floored*
		// second values. The two flooring orders disagree by up to a
		// second near boundaries, and CDDB wants this one.
		let secs = (src.leadout() + CD_LEADIN).wrapping_div(FRAMES_PER_SECOND) -
			(src.tracks()[0].lba() + CD_LEADIN).wrapping_div(FRAMES_PER_SECOND);

		#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "Seconds and counts are small and non-negative.")]
		Self(((n % 255) << 24) | ((secs as u32) << 8) | src.track_count() as u32)
	}
}



impl Toc {
	#[must_use]
	/// # CDDB ID.
	///
	/// This returns the [CDDB](https://en.wikipedia.org/wiki/CDDB) ID
	/// corresponding to the table of contents.
	///
	/// ## Examples
	///
	/// ```
	/// use discprint_core::TocDialect;
	///
	/// let toc = TocDialect::FreeDb.parse("4 150 11563 25174 45863 738").unwrap();
	/// assert_eq!(toc.cddb_id().to_string(), "1f02e004");
	/// ```
	pub fn cddb_id(&self) -> Cddb { Cddb::from(self) }
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::TocDialect;

	#[test]
	fn t_cddb() {
		for (dialect, text, id) in [
			// A little audio-only disc.
			(TocDialect::FreeDb, "4 150 11563 25174 45863 738", "1f02e004"),
			// The twelve-track MusicBrainz documentation album.
			(
				TocDialect::MusicBrainz,
				"1 12 198592 150 17477 32100 47997 67160 84650 93732 110667 127377 147860 160437 183097",
				"b10a550c",
			),
			// A CD-Extra: the data track counts toward both the checksum
			// and the track total.
			(
				TocDialect::AccurateRip,
				"14 13 1 0 15047 30797 45995 60397 78942 94607 108395 125382 146117 162905 177397 194782 220352 332850",
				"b611560e",
			),
		] {
			let toc = dialect.parse(text).expect("Invalid TOC");
			assert_eq!(toc.cddb_id().to_string(), id);
		}
	}

	#[test]
	fn t_cddb_deterministic() {
		let toc = TocDialect::FreeDb.parse("4 150 11563 25174 45863 738")
			.expect("Invalid TOC");
		assert_eq!(toc.cddb_id(), toc.cddb_id());
		assert_eq!(u32::from(toc.cddb_id()), 0x1F02_E004);
	}
}
