/*!
# Discprint: CD-Text

CD-Text lives in the lead-in as a stream of 18-byte packs:

```text
[type][track][seq][char_pos][ 12 bytes of text ][ crc16 ]
```

Strings span packs and are NUL-terminated inside the shared payload, so a
single pack routinely carries the tail of one track's title and the head of
the next. Each pack type keeps its own track cursor during reassembly.

Only block 0 (the primary language) is processed, and only the Latin
character sets; discs declaring a double-byte set are acknowledged and
skipped.
*/

use crate::{
	CDTEXT_PACK_SIZE,
	MAX_TRACKS,
	subchannel::crc16,
	verbose,
};
use std::collections::BTreeMap;



/// # Pack Type: Title.
const PACK_TITLE: u8 = 0x80;

/// # Pack Type: Performer.
const PACK_PERFORMER: u8 = 0x81;

/// # Pack Type: Songwriter.
const PACK_SONGWRITER: u8 = 0x82;

/// # Pack Type: Composer.
const PACK_COMPOSER: u8 = 0x83;

/// # Pack Type: Arranger.
const PACK_ARRANGER: u8 = 0x84;

/// # Pack Type: Message.
const PACK_MESSAGE: u8 = 0x85;

/// # Pack Type: Genre (album only).
const PACK_GENRE: u8 = 0x87;

/// # Pack Type: Size Info.
const PACK_SIZE_INFO: u8 = 0x8F;

/// # Character Set: ISO-8859-1.
const CHARSET_ISO_8859_1: u8 = 0x00;

/// # Character Set: 7-Bit ASCII.
const CHARSET_ASCII: u8 = 0x01;



#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # Album-Level CD-Text.
///
/// Absent fields are `None`; a present-but-empty string never survives
/// normalization.
pub struct CdTextAlbum {
	/// # Album Title.
	pub title: Option<String>,

	/// # Album Artist.
	pub performer: Option<String>,

	/// # Lyricist.
	pub songwriter: Option<String>,

	/// # Composer.
	pub composer: Option<String>,

	/// # Arranger.
	pub arranger: Option<String>,

	/// # Comment.
	pub message: Option<String>,

	/// # Genre.
	pub genre: Option<String>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # Track-Level CD-Text.
pub struct CdTextTrack {
	/// # Track Title.
	pub title: Option<String>,

	/// # Artist.
	pub performer: Option<String>,

	/// # Lyricist.
	pub songwriter: Option<String>,

	/// # Composer.
	pub composer: Option<String>,

	/// # Arranger.
	pub arranger: Option<String>,

	/// # Comment.
	pub message: Option<String>,
}

impl CdTextTrack {
	/// # Anything Here?
	fn is_empty(&self) -> bool {
		self.title.is_none() &&
		self.performer.is_none() &&
		self.songwriter.is_none() &&
		self.composer.is_none() &&
		self.arranger.is_none() &&
		self.message.is_none()
	}
}



#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # Parsed CD-Text.
pub struct CdText {
	/// # Album-Level Fields (pack track zero).
	album: CdTextAlbum,

	/// # Track-Level Fields, Keyed By Track Number.
	tracks: BTreeMap<u8, CdTextTrack>,
}

impl CdText {
	#[must_use]
	/// # Parse a Raw Pack Stream.
	///
	/// Returns `None` if the stream contains no usable block-0 text —
	/// whether because there isn't any, every pack failed its checksum, or
	/// the declared character set is one we don't decode.
	pub fn from_packs(raw: &[u8], verbosity: u8) -> Option<Self> {
		let pack_count = raw.len() / CDTEXT_PACK_SIZE;
		if pack_count == 0 {
			verbose(verbosity, 2, "cdtext: no data");
			return None;
		}
		verbose(verbosity, 1, &format!(
			"cdtext: parsing {pack_count} packs ({} bytes)",
			raw.len(),
		));

		let packs = raw.chunks_exact(CDTEXT_PACK_SIZE);

		// First pass: the size-info pack tells us the character set and
		// the track range. Without one, assume Latin-1 and the full range.
		let mut charset = CHARSET_ISO_8859_1;
		let mut last_track = MAX_TRACKS;
		for pack in packs.clone() {
			if
				pack[0] == PACK_SIZE_INFO &&
				pack[2] == 0 &&
				block_number(pack) == 0 &&
				pack_crc_valid(pack)
			{
				charset = pack[4];
				last_track = pack[6].min(MAX_TRACKS);
				verbose(verbosity, 2, &format!(
					"cdtext: block 0 charset={charset} tracks={}-{last_track}",
					pack[5],
				));
				break;
			}
		}

		// Double-byte sets (Japanese, Korean, Mandarin) are out of scope;
		// note the skip and move on.
		if charset != CHARSET_ISO_8859_1 && charset != CHARSET_ASCII {
			verbose(verbosity, 1, &format!(
				"cdtext: unsupported charset {charset}, skipping block",
			));
			return None;
		}

		// Second pass: reassemble the text. Accumulators are keyed by
		// (pack type, track); each pack type keeps its own track cursor,
		// reset whenever a sequence restarts.
		let mut accum: BTreeMap<(u8, u8), Vec<u8>> = BTreeMap::new();
		let mut cursors = [0_u8; 16];
		let mut valid = 0_u32;
		let mut invalid = 0_u32;

		for pack in packs {
			let kind = pack[0];
			if ! matches!(kind, PACK_TITLE..=PACK_MESSAGE | PACK_GENRE) { continue; }
			if block_number(pack) != 0 { continue; }

			if ! pack_crc_valid(pack) {
				invalid += 1;
				verbose(verbosity, 3, &format!(
					"cdtext: pack type {kind:#04x} failed its CRC",
				));
				continue;
			}
			valid += 1;

			let cursor = &mut cursors[usize::from(kind & 0x0F)];
			if pack[2] == 0 { *cursor = pack[1]; }

			// A NUL ends the current track's string; subsequent bytes
			// belong to the next track.
			for &b in &pack[4..16] {
				if b == 0 {
					*cursor += 1;
					if last_track < *cursor { break; }
				}
				else if *cursor <= MAX_TRACKS {
					accum.entry((kind, *cursor)).or_default().push(b);
				}
			}
		}

		verbose(verbosity, 1, &format!(
			"cdtext: {valid} valid packs, {invalid} invalid",
		));

		// Decode and normalize everything that accumulated.
		let mut out = Self::default();
		for ((kind, track), bytes) in accum {
			let Some(text) = finish_text(&bytes) else { continue; };

			if track == 0 {
				let field = match kind {
					PACK_TITLE => &mut out.album.title,
					PACK_PERFORMER => &mut out.album.performer,
					PACK_SONGWRITER => &mut out.album.songwriter,
					PACK_COMPOSER => &mut out.album.composer,
					PACK_ARRANGER => &mut out.album.arranger,
					PACK_MESSAGE => &mut out.album.message,
					_ => &mut out.album.genre,
				};
				field.replace(text);
			}
			else {
				// Genre is album-only.
				if kind == PACK_GENRE { continue; }
				let entry = out.tracks.entry(track).or_default();
				let field = match kind {
					PACK_TITLE => &mut entry.title,
					PACK_PERFORMER => &mut entry.performer,
					PACK_SONGWRITER => &mut entry.songwriter,
					PACK_COMPOSER => &mut entry.composer,
					PACK_ARRANGER => &mut entry.arranger,
					_ => &mut entry.message,
				};
				field.replace(text);
			}
		}

		// Drop tracks that normalized down to nothing, then see if the
		// whole thing was a wash.
		out.tracks.retain(|_, v| ! v.is_empty());
		if out.tracks.is_empty() && out.album == CdTextAlbum::default() { None }
		else { Some(out) }
	}

	#[must_use]
	/// # Album-Level Fields.
	pub const fn album(&self) -> &CdTextAlbum { &self.album }

	#[must_use]
	/// # A Track's Fields, If Any.
	pub fn track(&self, num: u8) -> Option<&CdTextTrack> { self.tracks.get(&num) }

	/// # Iterate Over (Track Number, Fields) Pairs.
	pub fn tracks(&self) -> impl Iterator<Item = (u8, &CdTextTrack)> {
		self.tracks.iter().map(|(k, v)| (*k, v))
	}
}



/// # Pack Block Number.
///
/// Bits 4-6 of the character-position byte select the language block.
const fn block_number(pack: &[u8]) -> u8 { (pack[3] >> 4) & 0b0111 }

/// # Pack Checksum Check.
///
/// CRC-16/CCITT over bytes 0..=15, initial value zero, stored at 16..=17
/// as the bitwise inversion of the computed value.
fn pack_crc_valid(pack: &[u8]) -> bool {
	let calc = ! crc16(&pack[..16], 0);
	let stored = u16::from_be_bytes([pack[16], pack[17]]);
	calc == stored
}

/// # Decode and Normalize an Accumulated String.
///
/// Both supported character sets map bytes straight onto Unicode scalars
/// (ASCII being a subset of Latin-1), so decoding is just a widening push;
/// ISO-8859-1 high bytes become two UTF-8 bytes along the way. Control
/// bytes other than newline become spaces, carriage returns vanish, and
/// the result is trimmed. Empty means absent.
fn finish_text(bytes: &[u8]) -> Option<String> {
	let mut text = String::with_capacity(bytes.len() * 2);
	for &b in bytes {
		match b {
			b'\r' => {},
			b'\n' => text.push('\n'),
			0..=0x1F => text.push(' '),
			_ => text.push(char::from(b)),
		}
	}

	let text = text.trim();
	if text.is_empty() { None }
	else { Some(text.to_owned()) }
}



#[cfg(test)]
mod tests {
	use super::*;

	/// # Helper: Build a Pack With a Valid CRC.
	fn pack(kind: u8, track: u8, seq: u8, char_pos: u8, text: &[u8]) -> [u8; 18] {
		let mut out = [0_u8; 18];
		out[0] = kind;
		out[1] = track;
		out[2] = seq;
		out[3] = char_pos;
		out[4..4 + text.len()].copy_from_slice(text);
		let crc = (! crc16(&out[..16], 0)).to_be_bytes();
		out[16..].copy_from_slice(&crc);
		out
	}

	/// # Helper: Size-Info Pack Declaring Charset/Tracks.
	fn size_info(charset: u8, first: u8, last: u8) -> [u8; 18] {
		pack(PACK_SIZE_INFO, 0, 0, 0, &[charset, first, last])
	}

	/// # Helper: Flatten Packs Into a Stream.
	fn stream(packs: &[[u8; 18]]) -> Vec<u8> {
		packs.iter().flatten().copied().collect()
	}

	#[test]
	fn t_crc() {
		let good = pack(PACK_TITLE, 0, 0, 0, b"HELLO");
		assert!(pack_crc_valid(&good));

		let mut bad = good;
		bad[5] ^= 0b0100;
		assert!(! pack_crc_valid(&bad));
	}

	#[test]
	fn t_album_and_track() {
		// "ALBUM TITLE\0TRACK ONE\0" split across two title packs.
		let raw = stream(&[
			size_info(CHARSET_ISO_8859_1, 1, 2),
			pack(PACK_TITLE, 0, 0, 0, b"ALBUM TITLE\0"),
			pack(PACK_TITLE, 1, 1, 0, b"TRACK ONE\0\0\0"),
		]);

		let cdtext = CdText::from_packs(&raw, 0).expect("CdText failed.");
		assert_eq!(cdtext.album().title.as_deref(), Some("ALBUM TITLE"));
		assert_eq!(
			cdtext.track(1).and_then(|t| t.title.as_deref()),
			Some("TRACK ONE"),
		);
		assert!(cdtext.track(2).is_none());
	}

	#[test]
	fn t_string_spanning_packs() {
		// One long album performer crossing a pack boundary mid-word.
		let raw = stream(&[
			size_info(CHARSET_ASCII, 1, 1),
			pack(PACK_PERFORMER, 0, 0, 0, b"THE QUICK BR"),
			pack(PACK_PERFORMER, 0, 1, 12, b"OWN FOX\0\0\0\0\0"),
		]);

		let cdtext = CdText::from_packs(&raw, 0).expect("CdText failed.");
		assert_eq!(
			cdtext.album().performer.as_deref(),
			Some("THE QUICK BROWN FOX"),
		);
	}

	#[test]
	fn t_latin1() {
		// 0xE9 is e-acute in ISO-8859-1; it should widen to UTF-8.
		let raw = stream(&[
			size_info(CHARSET_ISO_8859_1, 1, 1),
			pack(PACK_TITLE, 0, 0, 0, b"CAF\xE9\0\0\0\0\0\0\0\0"),
		]);

		let cdtext = CdText::from_packs(&raw, 0).expect("CdText failed.");
		assert_eq!(cdtext.album().title.as_deref(), Some("CAF\u{e9}"));
	}

	#[test]
	fn t_bad_crc_dropped() {
		let mut title = pack(PACK_TITLE, 0, 0, 0, b"GARBAGE\0\0\0\0\0");
		title[16] ^= 0xFF;
		let raw = stream(&[size_info(CHARSET_ISO_8859_1, 1, 1), title]);
		assert!(CdText::from_packs(&raw, 0).is_none());
	}

	#[test]
	fn t_unsupported_charset() {
		// A double-byte (MS-JIS-style) block gets skipped wholesale.
		let raw = stream(&[
			size_info(0x80, 1, 1),
			pack(PACK_TITLE, 0, 0, 0, b"IGNORED\0\0\0\0\0"),
		]);
		assert!(CdText::from_packs(&raw, 0).is_none());
	}

	#[test]
	fn t_other_blocks_ignored() {
		// Block 1 (second language) packs don't contribute.
		let raw = stream(&[
			size_info(CHARSET_ISO_8859_1, 1, 1),
			pack(PACK_TITLE, 0, 0, 0, b"PRIMARY\0\0\0\0\0"),
			pack(PACK_TITLE, 0, 0, 0b0001_0000, b"SECONDARY\0\0\0"),
		]);

		let cdtext = CdText::from_packs(&raw, 0).expect("CdText failed.");
		assert_eq!(cdtext.album().title.as_deref(), Some("PRIMARY"));
	}

	#[test]
	fn t_normalization() {
		// Tabs become spaces, carriage returns vanish, padding trims away.
		let raw = stream(&[
			size_info(CHARSET_ISO_8859_1, 1, 1),
			pack(PACK_TITLE, 0, 0, 0, b"  A\tB\rC \0\0\0\0"),
		]);

		let cdtext = CdText::from_packs(&raw, 0).expect("CdText failed.");
		assert_eq!(cdtext.album().title.as_deref(), Some("A B C"));
	}
}
