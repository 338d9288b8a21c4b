/*!
# Discprint: TOC Acquisition

Two queries cover every disc: the full TOC (format 2) exposes the session
structure Enhanced CDs hide from the basic query, and the basic TOC
(format 0) is the fallback for drives that reject it. CD-Text rides the
same READ TOC opcode as format 5.
*/

use crate::{
	cdio::READ_TIMEOUT,
	CDTEXT_PACK_SIZE,
	DeviceSession,
	DiscprintError,
	MAX_TRACKS,
	Toc,
	Track,
	TrackType,
	verbose,
};
use std::collections::BTreeMap;



/// # Full-TOC Response Buffer.
///
/// Four header bytes plus up to a hundred 11-byte descriptors.
const FULL_TOC_BUF: usize = 4 + 100 * 11;

/// # Basic-TOC Response Buffer.
///
/// Four header bytes plus up to a hundred 8-byte descriptors.
const BASIC_TOC_BUF: usize = 4 + 100 * 8;

/// # CD-Text Response Ceiling.
///
/// The pack area tops out at 255 packs per language block; anything
/// claiming more than 8 KiB is lying.
const CDTEXT_MAX: usize = 8192;



/// # Read the Table of Contents.
///
/// Full TOC first; basic TOC if the drive refuses it.
///
/// ## Errors
///
/// Returns an error if the drive cannot be read or the TOC bytes fail
/// structural checks.
pub(crate) fn read_toc(dev: &DeviceSession, verbosity: u8) -> Result<Toc, DiscprintError> {
	match read_full_toc(dev, verbosity) {
		Err(DiscprintError::CdReadUnsupported) => {
			verbose(verbosity, 1, "toc: full TOC unsupported, falling back to basic");
			read_basic_toc(dev, verbosity)
		},
		other => other,
	}
}

/// # Read and Parse the Full TOC (Format 2).
///
/// The full TOC is keyed by POINT: real tracks are `0x01..=0x63`, and the
/// `A0`/`A1`/`A2` entries carry each session's track range and leadout.
fn read_full_toc(dev: &DeviceSession, verbosity: u8) -> Result<Toc, DiscprintError> {
	let mut cdb = [0_u8; 10];
	cdb[0] = 0x43; // READ TOC/PMA/ATIP.
	cdb[1] = 0x02; // MSF addressing.
	cdb[2] = 0x02; // Format 2: full TOC.
	cdb[6] = 1;    // Starting session.
	cdb[7..9].copy_from_slice(&to_alloc(FULL_TOC_BUF));

	let mut buf = [0_u8; FULL_TOC_BUF];
	dev.send_cdb(&cdb, &mut buf, READ_TIMEOUT)?;

	// The length header excludes itself.
	let len = usize::from(u16::from_be_bytes([buf[0], buf[1]]));
	if len < 2 || buf.len() - 2 < len || (len - 2) % 11 != 0 {
		return Err(DiscprintError::TocInvalid);
	}

	let mut entries: BTreeMap<u8, (u8, u8, u8, i32)> = BTreeMap::new();
	let mut session_leadouts: [Option<i32>; 10] = [None; 10];
	let mut declared_first = 0_u8;
	let mut declared_last = 0_u8;
	let mut last_session = u8::max(buf[3], 1);

	for desc in buf[4..len + 2].chunks_exact(11) {
		let sess = desc[0];
		let adr = (desc[1] >> 4) & 0x0F;
		let control = desc[1] & 0x0F;
		let point = desc[3];
		let lba = msf_to_lba(desc[8], desc[9], desc[10]);

		if (1..=10).contains(&sess) && last_session < sess { last_session = sess; }

		match point {
			// A real track.
			1..=MAX_TRACKS => {
				entries.insert(point, (u8::max(sess, 1), control, adr, lba));
			},
			// First track number of this session.
			0xA0 => {
				let first = desc[8];
				if (1..=MAX_TRACKS).contains(&first) &&
					(declared_first == 0 || first < declared_first)
				{
					declared_first = first;
				}
			},
			// Last track number of this session.
			0xA1 => {
				let last = desc[8];
				if (1..=MAX_TRACKS).contains(&last) && declared_last < last {
					declared_last = last;
				}
			},
			// Session leadout.
			0xA2 => {
				if (1..=10).contains(&sess) {
					session_leadouts[usize::from(sess) - 1].replace(lba);
				}
			},
			_ => {},
		}
	}

	// A backwards track range means the TOC is garbage.
	if declared_first != 0 && declared_last != 0 && declared_last < declared_first {
		return Err(DiscprintError::TocInvalid);
	}
	if entries.is_empty() { return Err(DiscprintError::TocInvalid); }

	last_session = last_session.min(10);
	verbose(verbosity, 2, &format!(
		"toc: {} tracks across {last_session} session(s)",
		entries.len(),
	));

	// The disc leadout belongs to the final session; an A2 for it is not
	// optional.
	let leadout = session_leadouts[usize::from(last_session) - 1]
		.or_else(|| session_leadouts.iter().rev().find_map(|v| *v))
		.ok_or(DiscprintError::TocInvalid)?;

	// Multi-session discs also tell us exactly where the audio session
	// ends; single-session layouts derive it from track positions.
	let audio_leadout =
		if 1 < last_session { session_leadouts[0] }
		else { None };

	let mut tracks = Vec::with_capacity(entries.len());
	for (num, (sess, control, adr, lba)) in entries {
		tracks.push(Track::new(
			num,
			sess.min(10),
			TrackType::from_control(control),
			lba,
			control,
			adr,
		)?);
	}

	Toc::from_tracks(tracks, leadout, audio_leadout, last_session)
}

/// # Read and Parse the Basic TOC (Format 0).
///
/// Session structure is invisible here; everything reads as session one,
/// with the leadout riding the magic `0xAA` descriptor.
fn read_basic_toc(dev: &DeviceSession, verbosity: u8) -> Result<Toc, DiscprintError> {
	let mut cdb = [0_u8; 10];
	cdb[0] = 0x43; // READ TOC/PMA/ATIP.
	cdb[2] = 0x00; // Format 0: basic TOC, LBA addressing.
	cdb[7..9].copy_from_slice(&to_alloc(BASIC_TOC_BUF));

	let mut buf = [0_u8; BASIC_TOC_BUF];
	dev.send_cdb(&cdb, &mut buf, READ_TIMEOUT)?;

	let len = usize::from(u16::from_be_bytes([buf[0], buf[1]]));
	if len < 2 || buf.len() - 2 < len || (len - 2) % 8 != 0 {
		return Err(DiscprintError::TocInvalid);
	}

	let first = buf[2];
	let last = buf[3];
	if first == 0 || last < first || MAX_TRACKS < last {
		return Err(DiscprintError::TocInvalid);
	}

	let mut tracks = Vec::new();
	let mut leadout = None;
	for desc in buf[4..len + 2].chunks_exact(8) {
		let adr = (desc[1] >> 4) & 0x0F;
		let control = desc[1] & 0x0F;
		let num = desc[2];
		let lba = i32::from_be_bytes([desc[4], desc[5], desc[6], desc[7]]);

		// 0xAA marks the leadout; everything else is a track.
		if num == 0xAA { leadout.replace(lba); }
		else if (1..=MAX_TRACKS).contains(&num) {
			tracks.push(Track::new(
				num,
				1,
				TrackType::from_control(control),
				lba,
				control,
				adr,
			)?);
		}
	}

	verbose(verbosity, 2, &format!("toc: {} tracks (basic)", tracks.len()));

	let leadout = leadout.ok_or(DiscprintError::TocInvalid)?;
	Toc::from_tracks(tracks, leadout, None, 1)
}

/// # Read the Raw CD-Text Blob (Format 5).
///
/// Two-phase: a four-byte probe to learn the length, then the real fetch.
/// Returns the bare pack stream, header stripped; `None` covers both "no
/// CD-Text" and "drive can't say", neither of which is an error.
pub(crate) fn read_cdtext(dev: &DeviceSession, verbosity: u8) -> Option<Vec<u8>> {
	let mut cdb = [0_u8; 10];
	cdb[0] = 0x43; // READ TOC/PMA/ATIP.
	cdb[2] = 0x05; // Format 5: CD-Text.
	cdb[8] = 4;    // Header only for now.

	let mut header = [0_u8; 4];
	dev.send_cdb(&cdb, &mut header, READ_TIMEOUT).ok()?;

	// The length excludes its own two bytes; packs start at byte 4.
	let len = usize::from(u16::from_be_bytes([header[0], header[1]]));
	if len < 2 {
		verbose(verbosity, 2, "cdtext: none present");
		return None;
	}

	let total = len + 2;
	let packs = len - 2;
	if packs % CDTEXT_PACK_SIZE != 0 || CDTEXT_MAX < total {
		verbose(verbosity, 1, &format!("cdtext: implausible length {packs}, skipping"));
		return None;
	}

	cdb[7..9].copy_from_slice(&to_alloc(total));
	let mut buf = vec![0_u8; total];
	dev.send_cdb(&cdb, &mut buf, READ_TIMEOUT).ok()?;

	buf.drain(..4);
	Some(buf)
}



/// # MSF to LBA.
///
/// `lba = (M * 60 + S) * 75 + F - 150`.
const fn msf_to_lba(m: u8, s: u8, f: u8) -> i32 {
	(m as i32 * 60 + s as i32) * 75 + f as i32 - 150
}

/// # Allocation Length, Big-Endian.
fn to_alloc(len: usize) -> [u8; 2] {
	#[expect(clippy::cast_possible_truncation, reason = "Buffer sizes are fixed and small.")]
	(len as u16).to_be_bytes()
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_msf() {
		assert_eq!(msf_to_lba(0, 2, 0), 0);
		assert_eq!(msf_to_lba(0, 2, 33), 33);
		assert_eq!(msf_to_lba(3, 16, 40), 14_590);
		assert_eq!(msf_to_lba(79, 59, 74), 359_849);
	}
}
