/*!
# Discprint: AccurateRip
*/

use crate::{
	Cddb,
	Toc,
};
use std::fmt;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # AccurateRip ID.
///
/// The `NNN-X1-X2-X3` quadruple AccurateRip keys its checksum database on:
/// audio track count, two offset sums, and the CDDB ID.
///
/// Values of this type are returned by [`Toc::accuraterip_id`].
pub struct AccurateRip {
	/// # Audio Track Count.
	audio_len: u8,

	/// # Disc ID 1: Plain Offset Sum.
	id1: u32,

	/// # Disc ID 2: Position-Weighted Offset Sum.
	id2: u32,

	/// # Disc ID 3: CDDB.
	cddb: Cddb,
}

impl fmt::Display for AccurateRip {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{:03}-{:08x}-{:08x}-{}",
			self.audio_len,
			self.id1,
			self.id2,
			self.cddb,
		)
	}
}

impl From<&Toc> for AccurateRip {
	fn from(src: &Toc) -> Self {
		// Both sums run over the audio tracks, weighted (for the second)
		// by the 1-based position *among audio tracks*, not the absolute
		// track number. A first track at LBA zero still has to count for
		// something, hence the max(1).
		let mut id1: u32 = 0;
		let mut id2: u32 = 0;
		let mut idx: u32 = 1;
		for t in src.tracks().iter().filter(|t| t.is_audio()) {
			let lba = t.lba().max(0).unsigned_abs();
			id1 = id1.wrapping_add(lba);
			id2 = id2.wrapping_add(lba.max(1).wrapping_mul(idx));
			idx += 1;
		}

		// Both close with the *disc* leadout — not the audio-session one,
		// even on a CD-Extra.
		let leadout = src.leadout().max(0).unsigned_abs();
		id1 = id1.wrapping_add(leadout);
		id2 = id2.wrapping_add(leadout.wrapping_mul(idx));

		#[expect(clippy::cast_possible_truncation, reason = "Audio counts are capped at 99.")]
		Self {
			audio_len: (idx - 1) as u8,
			id1,
			id2,
			cddb: src.cddb_id(),
		}
	}
}

impl AccurateRip {
	#[must_use]
	/// # Audio Track Count.
	pub const fn audio_len(&self) -> u8 { self.audio_len }

	#[must_use]
	/// # CDDB ID.
	///
	/// Already computed as the ID's third part, so cheaper than calling
	/// [`Toc::cddb_id`] a second time.
	pub const fn cddb_id(&self) -> Cddb { self.cddb }
}



impl Toc {
	#[must_use]
	/// # AccurateRip ID.
	///
	/// This returns the [AccurateRip](http://accuraterip.com/) ID
	/// corresponding to the table of contents.
	///
	/// ## Examples
	///
	/// ```
	/// use discprint_core::TocDialect;
	///
	/// let toc = TocDialect::AccurateRip.parse("4 4 1 0 11413 25024 45713 55220").unwrap();
	/// assert_eq!(
	///     toc.accuraterip_id().to_string(),
	///     "004-0002189a-00087f33-1f02e004",
	/// );
	/// ```
	pub fn accuraterip_id(&self) -> AccurateRip { AccurateRip::from(self) }
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::TocDialect;

	#[test]
	fn t_accuraterip() {
		for (text, id) in [
			("4 4 1 0 11413 25024 45713 55220", "004-0002189a-00087f33-1f02e004"),
			// CD-Extra: thirteen audio tracks, one data; the data track
			// skips the sums but lands in the CDDB part, and the leadout
			// is the disc's, not the audio session's.
			(
				"14 13 1 0 15047 30797 45995 60397 78942 94607 108395 125382 146117 162905 177397 194782 220352 332850",
				"013-001802ed-00f8ee31-b611560e",
			),
		] {
			let toc = TocDialect::AccurateRip.parse(text).expect("Invalid TOC");
			assert_eq!(toc.accuraterip_id().to_string(), id);
		}
	}

	#[test]
	fn t_accuraterip_mixed() {
		// Mixed mode: data track 1 plus eight audio. The multiplier runs
		// 1..=8 over the *audio* positions, and NNN counts audio only.
		let toc = TocDialect::AccurateRip
			.parse("9 8 2 0 30000 45000 60000 75000 90000 105000 120000 135000 150000")
			.expect("Invalid TOC");
		let id = toc.accuraterip_id();
		assert_eq!(id.audio_len(), 8);
		assert!(id.to_string().starts_with("008-"));

		// X1: audio offsets plus the disc leadout.
		let expected1: u32 = 30_000 + 45_000 + 60_000 + 75_000 + 90_000 +
			105_000 + 120_000 + 135_000 + 150_000;
		// X2: audio-index weighting, leadout times (audio count + 1).
		let expected2: u32 = 30_000 + 45_000 * 2 + 60_000 * 3 + 75_000 * 4 +
			90_000 * 5 + 105_000 * 6 + 120_000 * 7 + 135_000 * 8 + 150_000 * 9;
		assert_eq!(
			id.to_string(),
			format!("008-{expected1:08x}-{expected2:08x}-{}", toc.cddb_id()),
		);
	}
}
