/*!
# Discprint: Disc
*/

use crate::{
	AccurateRip,
	Cddb,
	CdText,
	DeviceSession,
	DiscprintError,
	DiscType,
	isrc::scan_isrcs,
	Mcn,
	readtoc,
	ShaB64,
	Toc,
	verbose,
};
use std::{
	fmt,
	path::Path,
};



/// # Lead-out Label.
///
/// This is used solely for the table of contents printout; e.g. 01 02 03 AA.
const CD_LEADOUT_LABEL: &str = "AA";



#[derive(Debug, Clone, Copy)]
/// # Read Options.
///
/// Which of the optional (slow) metadata scans to run on top of the TOC
/// read, and how chatty to be about it.
pub struct ReadOpts {
	/// # Query the Media Catalog Number?
	mcn: bool,

	/// # Scan the Per-Track ISRCs?
	isrc: bool,

	/// # Fetch and Parse CD-Text?
	cdtext: bool,

	/// # Diagnostic Verbosity (0-3).
	verbosity: u8,
}

impl Default for ReadOpts {
	#[inline]
	fn default() -> Self {
		Self {
			mcn: true,
			isrc: true,
			cdtext: true,
			verbosity: 0,
		}
	}
}

impl ReadOpts {
	#[must_use]
	/// # With MCN Query.
	pub const fn with_mcn(self, mcn: bool) -> Self { Self { mcn, ..self } }

	#[must_use]
	/// # With ISRC Scan.
	pub const fn with_isrc(self, isrc: bool) -> Self { Self { isrc, ..self } }

	#[must_use]
	/// # With CD-Text.
	pub const fn with_cdtext(self, cdtext: bool) -> Self { Self { cdtext, ..self } }

	#[must_use]
	/// # With Verbosity.
	pub const fn with_verbosity(self, verbosity: u8) -> Self {
		Self { verbosity, ..self }
	}
}



#[derive(Debug, Clone)]
/// # Disc Information.
///
/// Everything one acquisition cycle recovers from a disc: the table of
/// contents, plus whichever optional metadata was requested and actually
/// present.
pub struct DiscInfo {
	/// # The Table of Contents.
	toc: Toc,

	/// # Media Catalog Number, If Any.
	mcn: Option<Mcn>,

	/// # CD-Text, If Any.
	cdtext: Option<CdText>,

	/// # Drive Identity, For Diagnostics.
	drive: Option<String>,
}

impl DiscInfo {
	/// # Read a Disc.
	///
	/// Open the device — or the default drive if none was named — and pull
	/// everything `opts` asks for. The session holds the drive exclusively
	/// from first command to last and releases it on every exit path,
	/// success or not.
	///
	/// ## Errors
	///
	/// This will return an error if the drive cannot be opened, no disc is
	/// present, or the table of contents cannot be read. Missing optional
	/// metadata is not an error.
	pub fn read<P>(dev: Option<P>, opts: &ReadOpts) -> Result<Self, DiscprintError>
	where P: AsRef<Path> {
		let verbosity = opts.verbosity;
		let mut session = DeviceSession::new(dev)?;
		let drive = session.hwinfo();
		if let Some(d) = drive.as_deref() {
			verbose(verbosity, 1, &format!("drive: {d}"));
		}

		// The TOC is not optional; everything else keys off it.
		let mut toc = readtoc::read_toc(&session, verbosity)?;

		// Catalog number.
		let mcn =
			if opts.mcn { session.read_mcn() }
			else { None };

		// ISRCs. Zero finds is a perfectly normal outcome.
		if opts.isrc {
			let summary = scan_isrcs(&mut session, &mut toc, verbosity);
			if ! summary.complete() {
				verbose(verbosity, 1, "isrc: scan aborted early");
			}
		}

		// CD-Text.
		let cdtext =
			if opts.cdtext {
				readtoc::read_cdtext(&session, verbosity)
					.and_then(|raw| CdText::from_packs(&raw, verbosity))
			}
			else { None };

		// The session drops here, releasing the drive and waiting for the
		// device node to come back.
		Ok(Self { toc, mcn, cdtext, drive })
	}

	#[must_use]
	/// # Table of Contents.
	pub const fn toc(&self) -> &Toc { &self.toc }

	#[must_use]
	/// # Disc Type.
	pub fn disc_type(&self) -> DiscType { self.toc.disc_type() }

	#[must_use]
	/// # Media Catalog Number.
	pub const fn mcn(&self) -> Option<Mcn> { self.mcn }

	#[must_use]
	/// # CD-Text.
	pub const fn cdtext(&self) -> Option<&CdText> { self.cdtext.as_ref() }

	#[must_use]
	/// # Drive Identity.
	pub fn drive(&self) -> Option<&str> { self.drive.as_deref() }

	#[must_use]
	/// # Identifiers.
	pub fn identifiers(&self) -> Identifiers { Identifiers::from(&self.toc) }
}

impl fmt::Display for DiscInfo {
	/// # Summarize the Disc.
	///
	/// This prints the derived identifiers and table of contents in a nice
	/// little table.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		const DIVIDER: &str = "\x1b[2m----------------------------------------\x1b[0m\n";

		// A few key/value pairs.
		let ids = self.identifiers();
		let mut kv: Vec<(&str, String)> = vec![
			("Type:", self.disc_type().to_string()),
			("AccurateRip:", ids.accuraterip().to_string()),
			("CDDB:", ids.cddb().to_string()),
			("MusicBrainz:", ids.musicbrainz().to_string()),
		];
		if let Some(mcn) = self.mcn.as_ref() {
			kv.push(("MCN:", mcn.to_string()));
		}

		let col_max: usize = kv.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
		for (k, v) in kv {
			writeln!(f, "\x1b[1;38;5;4m{k:col_max$}\x1b[0m {v}")?;
		}

		// The table of contents.
		let any_isrc = self.toc.tracks().iter().any(|t| t.isrc().is_some());
		write!(
			f,
			"\n\x1b[2m##   FIRST    LAST  LENGTH          {}\x1b[0m\n",
			if any_isrc { "ISRC" } else { "" },
		)?;
		f.write_str(DIVIDER)?;

		for t in self.toc.tracks() {
			let num = t.number();
			let from = t.lba();
			let to = from + t.frames() - 1;
			let len = t.frames();
			if t.is_audio() {
				let isrc = t.isrc().map_or("", crate::Isrc::as_str);
				writeln!(f, "{num:02}  {from:>6}  {to:>6}  {len:>6}  {isrc:>12}")?;
			}
			else {
				writeln!(f, "\x1b[2m{num:02}  {from:>6}                    DATA TRACK\x1b[0m")?;
			}
		}

		// The leadout.
		writeln!(
			f,
			"\x1b[2m{CD_LEADOUT_LABEL}  {:>6}                      LEAD-OUT\x1b[0m",
			self.toc.leadout(),
		)?;

		// Close it off!
		f.write_str(DIVIDER)?;
		writeln!(f)
	}
}



#[derive(Debug, Clone, Copy)]
/// # Derived Identifiers.
///
/// All three are pure functions of the table of contents; equal TOCs
/// always produce byte-identical identifiers.
pub struct Identifiers {
	/// # MusicBrainz Disc ID.
	musicbrainz: ShaB64,

	/// # AccurateRip Disc ID.
	accuraterip: AccurateRip,

	/// # CDDB/FreeDB Disc ID.
	cddb: Cddb,
}

impl From<&Toc> for Identifiers {
	fn from(src: &Toc) -> Self {
		let accuraterip = src.accuraterip_id();
		Self {
			musicbrainz: src.musicbrainz_id(),
			cddb: accuraterip.cddb_id(),
			accuraterip,
		}
	}
}

impl Identifiers {
	#[must_use]
	/// # MusicBrainz Disc ID.
	pub const fn musicbrainz(&self) -> ShaB64 { self.musicbrainz }

	#[must_use]
	/// # AccurateRip Disc ID.
	pub const fn accuraterip(&self) -> AccurateRip { self.accuraterip }

	#[must_use]
	/// # CDDB/FreeDB Disc ID.
	pub const fn cddb(&self) -> Cddb { self.cddb }
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::TocDialect;

	#[test]
	fn t_identifiers() {
		let toc = TocDialect::AccurateRip
			.parse("4 4 1 0 11413 25024 45713 55220")
			.expect("Invalid TOC");
		let ids = Identifiers::from(&toc);

		assert_eq!(ids.musicbrainz().to_string(), "nljDXdC8B_pDwbdY1vZJvdrAZI4-");
		assert_eq!(ids.accuraterip().to_string(), "004-0002189a-00087f33-1f02e004");
		assert_eq!(ids.cddb().to_string(), "1f02e004");

		// Pure functions: run it again, get the same bytes.
		let again = Identifiers::from(&toc);
		assert_eq!(ids.musicbrainz(), again.musicbrainz());
		assert_eq!(ids.accuraterip(), again.accuraterip());
		assert_eq!(ids.cddb(), again.cddb());
	}

	#[test]
	fn t_opts() {
		let opts = ReadOpts::default()
			.with_mcn(false)
			.with_verbosity(2);
		assert!(! opts.mcn);
		assert!(opts.isrc);
		assert!(opts.cdtext);
		assert_eq!(opts.verbosity, 2);
	}
}
