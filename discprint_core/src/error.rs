/*!
# Discprint: Errors
*/

use fyi_msg::Msg;
use std::{
	error::Error,
	fmt,
};



#[cfg(feature = "bin")]
/// # Help Text.
const HELP: &str = concat!(r"
   ______
  / ____ \      Discprint v", env!("CARGO_PKG_VERSION"), r"
 / /    \ \     MusicBrainz, AccurateRip, and CDDB
| |  ()  | |    disc IDs, MCN, ISRCs, and CD-Text,
 \ \____/ /     from a drive or a textual TOC.
  \______/

USAGE:
    discprint [OPTIONS]

MODES (mutually exclusive; default is all of them):
    -A, --accuraterip Work with the AccurateRip ID/TOC.
    -C, --mcn         Read the Media Catalog Number (requires a disc).
    -F, --freedb      Work with the FreeDB/CDDB ID/TOC.
    -I, --isrc        Scan the per-track ISRCs (requires a disc).
    -M, --musicbrainz Work with the MusicBrainz ID/TOC.
    -R, --raw         Work with the raw TOC (no ID).

ACTIONS (combinable; default is -i):
    -i, --id          Print the disc ID.
    -t, --toc         Print the table of contents.
    -u, --url         Print the MusicBrainz submission URL.

SOURCE:
    -d, --dev <PATH>  The optical drive containing the CD of interest,
                      like /dev/cdrom. [default: auto]
    -c, --calculate <TOC>
                      Compute from textual TOC data instead of a disc.
        --format <FMT>
                      Disambiguate the TOC dialect when autodetection
                      cannot: raw, musicbrainz, accuraterip, or freedb.

MISCELLANEOUS:
    -h, --help        Print help information to STDOUT and exit.
    -q, --quiet       Suppress error messages.
    -v, --verbose     Print scan diagnostics to STDERR. Repeatable-ish:
                      use -v for phase/track detail, --very-verbose for
                      per-frame tallies.
    -V, --version     Print version information to STDOUT and exit.
");



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
pub enum DiscprintError {
	/// # Exclusive access never came through.
	AccessDenied,

	/// # Bug!
	Bug(&'static str),

	/// # CD read error.
	CdRead,

	/// # CD read operation rejected by the drive.
	CdReadUnsupported,

	/// # Invalid device.
	Device(String),

	/// # Unable to open device.
	DeviceOpen(Option<String>),

	/// # Ambiguous textual TOC.
	FormatAmbiguous(&'static str),

	/// # Invalid ISRC string.
	Isrc,

	/// # Invalid MCN string.
	Mcn,

	/// # No disc (or no supported disc) in the drive.
	MediaAbsent,

	/// # Unparseable textual TOC.
	TextInputInvalid(&'static str),

	/// # TOC bytes failed structural checks.
	TocInvalid,

	/// # Invalid track number.
	TrackNumber(u8),

	#[cfg(feature = "bin")]
	/// # Invalid CLI arg.
	CliArg(String),

	#[cfg(feature = "bin")]
	/// # CLI Parsing failure.
	CliParse(&'static str),

	#[cfg(feature = "bin")]
	/// # Print Help (Not an Error).
	PrintHelp,

	#[cfg(feature = "bin")]
	/// # Print Version (Not an Error).
	PrintVersion,
}

impl Error for DiscprintError {}

impl From<DiscprintError> for Msg {
	#[inline]
	fn from(src: DiscprintError) -> Self { Self::error(src.to_string()) }
}

impl fmt::Display for DiscprintError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::AccessDenied => f.write_str("Unable to obtain exclusive drive access."),
			Self::Bug(s) => write!(f, "Bug: {s}."),
			Self::CdRead => f.write_str("Read error."),
			Self::CdReadUnsupported => f.write_str("The drive rejected the read command."),
			Self::Device(s) => write!(f, "Invalid device path {s}."),
			Self::DeviceOpen(s) =>
				if let Some(s) = s { write!(f, "Unable to open connection with {s}.") }
				else {
					f.write_str("Unable to open connection with default optical drive.")
				},
			Self::FormatAmbiguous(s) => write!(f, "Ambiguous TOC: {s}; specify a format."),
			Self::Isrc => f.write_str("Invalid/unsupported ISRC."),
			Self::Mcn => f.write_str("Invalid/unsupported MCN."),
			Self::MediaAbsent => f.write_str("Missing or unsupported disc."),
			Self::TextInputInvalid(s) => write!(f, "Invalid TOC: {s}."),
			Self::TocInvalid => f.write_str("The disc table of contents is corrupt."),
			Self::TrackNumber(n) => write!(f, "Invalid track number ({n})."),

			#[cfg(feature = "bin")]
			Self::CliArg(s) => write!(f, "Invalid CLI option: {s}"),

			#[cfg(feature = "bin")]
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),

			#[cfg(feature = "bin")]
			Self::PrintHelp => f.write_str(HELP),

			#[cfg(feature = "bin")]
			Self::PrintVersion => f.write_str(concat!("Discprint v", env!("CARGO_PKG_VERSION"))),
		}
	}
}

impl DiscprintError {
	#[must_use]
	/// # Exit Code.
	///
	/// Map the error onto the `sysexits`-style enumeration the CLI shell
	/// inherits: `0` okay, `64` usage, `65` data, `69` unavailable, `70`
	/// software, `74` I/O.
	pub const fn exit_code(&self) -> u8 {
		match self {
			Self::Bug(_) => 70,
			Self::CdRead | Self::Device(_) | Self::DeviceOpen(_) => 74,
			Self::AccessDenied | Self::CdReadUnsupported | Self::MediaAbsent => 69,
			Self::FormatAmbiguous(_) |
			Self::Isrc |
			Self::Mcn |
			Self::TextInputInvalid(_) |
			Self::TocInvalid |
			Self::TrackNumber(_) => 65,

			#[cfg(feature = "bin")]
			Self::CliArg(_) | Self::CliParse(_) => 64,

			#[cfg(feature = "bin")]
			Self::PrintHelp | Self::PrintVersion => 0,
		}
	}
}

#[cfg(feature = "bin")]
impl From<argyle::ArgyleError> for DiscprintError {
	#[inline]
	fn from(err: argyle::ArgyleError) -> Self {
		match err {
			argyle::ArgyleError::WantsHelp => Self::PrintHelp,
			argyle::ArgyleError::WantsVersion => Self::PrintVersion,
			_ => Self::CliParse("the command line arguments"),
		}
	}
}
