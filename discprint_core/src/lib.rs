/*!
# Discprint: Library
*/

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
	unsafe_code,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::allow_attributes,
	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::impl_trait_in_params,
	clippy::lossy_float_literal,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::undocumented_unsafe_blocks,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![expect(clippy::doc_markdown, reason = "Names like MusicBrainz make this annoying.")]

mod accuraterip;
mod cddb;
mod cdio;
mod cdtext;
mod dialect;
mod disc;
mod error;
mod isrc;
mod mcn;
mod musicbrainz;
mod readtoc;
mod shab64;
mod subchannel;
mod toc;

pub use accuraterip::AccurateRip;
pub use cddb::Cddb;
pub(crate) use cdio::DeviceSession;
pub use cdtext::{
	CdText,
	CdTextAlbum,
	CdTextTrack,
};
pub use dialect::{
	Detection,
	parse_any,
	TocDialect,
};
pub use disc::{
	DiscInfo,
	Identifiers,
	ReadOpts,
};
pub use error::DiscprintError;
pub use isrc::Isrc;
pub use mcn::Mcn;
pub use shab64::ShaB64;
pub use subchannel::{
	QFrame,
	QValidity,
};
pub(crate) use subchannel::QSource;
pub use toc::{
	DiscType,
	Toc,
	Track,
	TrackType,
};



// Conversion
// ---------------

/// # Number of lead-in sectors.
///
/// All discs have a 2-second region at the start before any data. External
/// TOC formats include this amount in their offsets; internal storage does
/// not, so it gets added/removed at the boundary.
pub const CD_LEADIN: i32 = 150;

/// # Sectors (frames) per second of audio.
pub const FRAMES_PER_SECOND: i32 = 75;



// Block Sizes
// ---------------

/// # Size of (Formatted) Q-Subchannel Block.
pub(crate) const CD_SUBCHANNEL_SIZE: usize = 16;

/// # Size of a CD-Text Pack.
pub(crate) const CDTEXT_PACK_SIZE: usize = 18;



// Misc
// ---------------

/// # Highest track number a disc can hold.
pub(crate) const MAX_TRACKS: u8 = 99;

/// # Frame Ceiling.
///
/// No CD value — offset, leadout, or otherwise — can meaningfully exceed a
/// 100-minute disc. Dialect parsing rejects anything above this.
pub(crate) const FRAME_CEILING: u32 = 450_000;



/// # Gated Diagnostic Line.
///
/// Print a prefixed diagnostic to STDERR if the requested level is within
/// the caller's verbosity. Level 1 is phase-level, 2 per-track, 3 per-frame.
pub(crate) fn verbose(verbosity: u8, level: u8, msg: &str) {
	if level <= verbosity {
		fyi_msg::Msg::custom("Discprint", 199, msg).eprint();
	}
}
