/*!
# Discprint: Table of Contents
*/

use crate::{
	DiscprintError,
	Isrc,
	MAX_TRACKS,
};
use std::fmt;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Track Type.
///
/// The control nibble's bit 2 separates the two; everything else about a
/// track is shared.
pub enum TrackType {
	/// # Audio Track.
	Audio,

	/// # Data Track.
	Data,
}

impl TrackType {
	/// # From Control Nibble.
	pub(crate) const fn from_control(control: u8) -> Self {
		if control & 0b0100 == 0 { Self::Audio }
		else { Self::Data }
	}
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Disc Type.
///
/// Where the data tracks sit — if any — determines how the identifier
/// algorithms slice the table of contents.
pub enum DiscType {
	/// # Audio-Only (CD-DA).
	Audio,

	/// # Audio With Trailing Data (CD-Extra).
	Enhanced,

	/// # Data First, Audio After (Mixed Mode).
	Mixed,

	/// # Anything Else.
	Unknown,
}

impl fmt::Display for DiscType {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl DiscType {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Audio => "audio-only",
			Self::Enhanced => "CD-Extra",
			Self::Mixed => "data+audio",
			Self::Unknown => "unknown",
		}
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Track.
///
/// A single TOC entry. Offsets are raw LBA, zero-based; the 150-frame
/// pregap external formats carry is stripped on the way in and restored on
/// the way out.
pub struct Track {
	/// # Track Number (1-99).
	num: u8,

	/// # Session Number (1-10).
	session: u8,

	/// # Audio or Data.
	kind: TrackType,

	/// # Starting LBA.
	lba: i32,

	/// # Length in Frames.
	frames: i32,

	/// # Control Nibble.
	control: u8,

	/// # ADR Nibble.
	adr: u8,

	/// # ISRC, If One Was Recovered.
	isrc: Option<Isrc>,
}

impl Track {
	/// # New.
	///
	/// Length is unknowable until the whole table has been seen; it gets
	/// filled in by [`Toc::from_tracks`].
	///
	/// ## Errors
	///
	/// This will return an error if the track or session number is out of
	/// range.
	pub(crate) fn new(num: u8, session: u8, kind: TrackType, lba: i32, control: u8, adr: u8)
	-> Result<Self, DiscprintError> {
		if num == 0 || MAX_TRACKS < num { return Err(DiscprintError::TrackNumber(num)); }
		if session == 0 || 10 < session { return Err(DiscprintError::TocInvalid); }
		Ok(Self {
			num,
			session,
			kind,
			lba,
			frames: 0,
			control,
			adr,
			isrc: None,
		})
	}

	#[must_use]
	/// # Track Number.
	pub const fn number(&self) -> u8 { self.num }

	#[must_use]
	/// # Session Number.
	pub const fn session(&self) -> u8 { self.session }

	#[must_use]
	/// # Track Type.
	pub const fn kind(&self) -> TrackType { self.kind }

	#[must_use]
	/// # Audio?
	pub const fn is_audio(&self) -> bool { matches!(self.kind, TrackType::Audio) }

	#[must_use]
	/// # Starting LBA (raw, zero-based).
	pub const fn lba(&self) -> i32 { self.lba }

	#[must_use]
	/// # Length in Frames.
	pub const fn frames(&self) -> i32 { self.frames }

	#[must_use]
	/// # Control Nibble.
	pub const fn control(&self) -> u8 { self.control }

	#[must_use]
	/// # ADR Nibble.
	pub const fn adr(&self) -> u8 { self.adr }

	#[must_use]
	/// # ISRC.
	pub const fn isrc(&self) -> Option<&Isrc> { self.isrc.as_ref() }
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Table of Contents.
///
/// The parsed disc structure: the ordered track list plus the session and
/// leadout details the identifier algorithms need.
///
/// A table is immutable once built, except that the ISRC scan may fill in
/// [`Track::isrc`] afterward.
pub struct Toc {
	/// # First Track Number.
	first: u8,

	/// # Last Track Number.
	last: u8,

	/// # The Tracks, In Offset Order.
	tracks: Vec<Track>,

	/// # Disc Leadout LBA.
	leadout: i32,

	/// # Audio-Session Leadout LBA.
	///
	/// Same as `leadout` except for Enhanced CDs, where the audio session
	/// ends before the trailing data does.
	audio_leadout: i32,

	/// # Last Session Number.
	last_session: u8,
}

impl Toc {
	/// # From Tracks.
	///
	/// Build and validate a table of contents from its parts. Track lengths
	/// are derived here; `audio_leadout`, if not supplied by a multi-session
	/// read, is derived from the position of any trailing data track.
	///
	/// ## Errors
	///
	/// Returns [`DiscprintError::TocInvalid`] if the table is empty, the
	/// offsets are not strictly increasing, the leadout does not clear the
	/// final track, or a track's control bit disagrees with its type.
	pub(crate) fn from_tracks(
		mut tracks: Vec<Track>,
		leadout: i32,
		audio_leadout: Option<i32>,
		last_session: u8,
	) -> Result<Self, DiscprintError> {
		if tracks.is_empty() || usize::from(MAX_TRACKS) < tracks.len() {
			return Err(DiscprintError::TocInvalid);
		}

		// Offsets must be strictly increasing, and the control bit must
		// agree with the track type.
		for pair in tracks.windows(2) {
			if pair[1].lba <= pair[0].lba { return Err(DiscprintError::TocInvalid); }
		}
		for t in &tracks {
			if TrackType::from_control(t.control) != t.kind {
				return Err(DiscprintError::TocInvalid);
			}
		}

		// The leadout comes after everything else.
		let last_lba = tracks[tracks.len() - 1].lba;
		if leadout <= last_lba { return Err(DiscprintError::TocInvalid); }

		let first = tracks[0].num;
		let last = tracks[tracks.len() - 1].num;
		if last < first { return Err(DiscprintError::TocInvalid); }

		// Fill in the lengths: each track runs to the start of the next,
		// the last to the leadout.
		for i in 0..tracks.len() - 1 {
			tracks[i].frames = tracks[i + 1].lba - tracks[i].lba;
		}
		if let Some(t) = tracks.last_mut() { t.frames = leadout - t.lba; }

		// The audio session ends wherever the caller says it does, or at
		// the first trailing data track, or at the disc leadout.
		let audio_leadout = audio_leadout.unwrap_or_else(|| {
			let last_audio = tracks.iter().rposition(Track::is_audio);
			match last_audio {
				Some(i) if i + 1 < tracks.len() => tracks[i + 1].lba,
				_ => leadout,
			}
		});

		Ok(Self {
			first,
			last,
			tracks,
			leadout,
			audio_leadout,
			last_session: last_session.clamp(1, 10),
		})
	}

	/// # Set a Track's ISRC.
	pub(crate) fn set_isrc(&mut self, num: u8, isrc: Isrc) {
		if let Some(t) = self.tracks.iter_mut().find(|t| t.num == num) {
			t.isrc.replace(isrc);
		}
	}
}

impl Toc {
	#[must_use]
	/// # First Track Number.
	pub const fn first_track(&self) -> u8 { self.first }

	#[must_use]
	/// # Last Track Number.
	pub const fn last_track(&self) -> u8 { self.last }

	#[must_use]
	/// # Total Track Count.
	pub const fn track_count(&self) -> usize { self.tracks.len() }

	#[must_use]
	/// # Audio Track Count.
	pub fn audio_count(&self) -> usize {
		self.tracks.iter().filter(|t| t.is_audio()).count()
	}

	#[must_use]
	/// # Data Track Count.
	pub fn data_count(&self) -> usize { self.track_count() - self.audio_count() }

	#[must_use]
	/// # The Tracks.
	pub fn tracks(&self) -> &[Track] { self.tracks.as_slice() }

	#[must_use]
	/// # A Specific Track, By Number.
	pub fn track(&self, num: u8) -> Option<&Track> {
		self.tracks.iter().find(|t| t.num == num)
	}

	#[must_use]
	/// # Disc Leadout LBA.
	pub const fn leadout(&self) -> i32 { self.leadout }

	#[must_use]
	/// # Audio-Session Leadout LBA.
	pub const fn audio_leadout(&self) -> i32 { self.audio_leadout }

	#[must_use]
	/// # Last Session Number.
	pub const fn last_session(&self) -> u8 { self.last_session }

	#[must_use]
	/// # First Audio Track Number.
	pub fn first_audio_track(&self) -> Option<u8> {
		self.tracks.iter().find(|t| t.is_audio()).map(Track::number)
	}

	#[must_use]
	/// # Last Audio Track Number.
	pub fn last_audio_track(&self) -> Option<u8> {
		self.tracks.iter().rev().find(|t| t.is_audio()).map(Track::number)
	}

	#[must_use]
	/// # Disc Type.
	///
	/// Classified by the position of the data tracks relative to the audio.
	pub fn disc_type(&self) -> DiscType {
		if self.data_count() == 0 { return DiscType::Audio; }

		// Leading data means mixed mode.
		if ! self.tracks[0].is_audio() { return DiscType::Mixed; }

		// Trailing data means CD-Extra.
		if ! self.tracks[self.tracks.len() - 1].is_audio() {
			return DiscType::Enhanced;
		}

		DiscType::Unknown
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	/// # Helper: Audio Track.
	fn audio(num: u8, lba: i32) -> Track {
		Track::new(num, 1, TrackType::Audio, lba, 0, 1).expect("Track failed.")
	}

	/// # Helper: Data Track.
	fn data(num: u8, lba: i32) -> Track {
		Track::new(num, 2, TrackType::Data, lba, 0b0100, 1).expect("Track failed.")
	}

	#[test]
	fn t_toc_audio() {
		let toc = Toc::from_tracks(
			vec![audio(1, 0), audio(2, 11_413), audio(3, 25_024), audio(4, 45_713)],
			55_220,
			None,
			1,
		).expect("Toc failed.");

		assert_eq!(toc.first_track(), 1);
		assert_eq!(toc.last_track(), 4);
		assert_eq!(toc.track_count(), 4);
		assert_eq!(toc.audio_count(), 4);
		assert_eq!(toc.data_count(), 0);
		assert_eq!(toc.leadout(), 55_220);
		assert_eq!(toc.audio_leadout(), 55_220);
		assert_eq!(toc.disc_type(), DiscType::Audio);

		// Lengths run track-to-track, and to the leadout at the end.
		assert_eq!(toc.tracks()[0].frames(), 11_413);
		assert_eq!(toc.tracks()[3].frames(), 9_507);
	}

	#[test]
	fn t_toc_enhanced() {
		let toc = Toc::from_tracks(
			vec![audio(1, 0), audio(2, 20_000), data(3, 50_000)],
			80_000,
			None,
			2,
		).expect("Toc failed.");

		assert_eq!(toc.disc_type(), DiscType::Enhanced);
		assert_eq!(toc.audio_count(), 2);
		assert_eq!(toc.data_count(), 1);

		// Without a session leadout, the audio session ends where the data
		// begins.
		assert_eq!(toc.audio_leadout(), 50_000);
		assert_eq!(toc.leadout(), 80_000);

		// With one, it ends there.
		let toc = Toc::from_tracks(
			vec![audio(1, 0), audio(2, 20_000), data(3, 50_000)],
			80_000,
			Some(38_600),
			2,
		).expect("Toc failed.");
		assert_eq!(toc.audio_leadout(), 38_600);
	}

	#[test]
	fn t_toc_mixed() {
		let toc = Toc::from_tracks(
			vec![data(1, 0), audio(2, 30_000), audio(3, 40_000)],
			60_000,
			None,
			1,
		).expect("Toc failed.");

		assert_eq!(toc.disc_type(), DiscType::Mixed);
		assert_eq!(toc.first_audio_track(), Some(2));
		assert_eq!(toc.last_audio_track(), Some(3));
		assert_eq!(toc.audio_leadout(), 60_000);
	}

	#[test]
	fn t_toc_bad() {
		// Out-of-order offsets.
		assert!(Toc::from_tracks(
			vec![audio(1, 100), audio(2, 50)],
			60_000,
			None,
			1,
		).is_err());

		// Leadout inside the last track.
		assert!(Toc::from_tracks(
			vec![audio(1, 0), audio(2, 50_000)],
			50_000,
			None,
			1,
		).is_err());

		// Empty.
		assert!(Toc::from_tracks(Vec::new(), 1000, None, 1).is_err());

		// Control bit at odds with the track type.
		let mut bad = audio(1, 0);
		bad.control = 0b0100;
		assert!(Toc::from_tracks(vec![bad], 1000, None, 1).is_err());
	}
}
