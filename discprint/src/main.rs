/*!
# Discprint
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
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



use argyle::{
	Argue,
	FLAG_HELP,
	FLAG_VERSION,
};
use discprint_core::{
	DiscInfo,
	DiscprintError,
	Isrc,
	parse_any,
	ReadOpts,
	Toc,
	TocDialect,
};
use fyi_msg::Msg;
use std::sync::atomic::{
	AtomicBool,
	Ordering::SeqCst,
};



/// # Global Quiet Flag.
///
/// Errors surface after argument parsing has come and gone, so the quiet
/// preference has to live somewhere both halves can see.
static QUIET: AtomicBool = AtomicBool::new(false);



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Mode.
///
/// What to work with. Modes are mutually exclusive; the default is
/// everything at once.
enum Mode {
	/// # Everything.
	All,

	/// # Raw TOC.
	Raw,

	/// # AccurateRip.
	AccurateRip,

	/// # FreeDB/CDDB.
	FreeDb,

	/// # MusicBrainz.
	MusicBrainz,

	/// # Media Catalog Number.
	Mcn,

	/// # Per-Track ISRCs.
	Isrc,
}

#[derive(Debug, Clone, Copy)]
/// # Actions.
///
/// What to print for the chosen mode. Combinable.
struct Actions {
	/// # Print the Disc ID.
	id: bool,

	/// # Print the TOC.
	toc: bool,

	/// # Print the MusicBrainz URL.
	url: bool,
}



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed.
fn main() {
	match _main() {
		Ok(()) => {},
		Err(e @ (DiscprintError::PrintHelp | DiscprintError::PrintVersion)) => {
			println!("{e}");
		},
		Err(e) => {
			if ! QUIET.load(SeqCst) { Msg::from(e.clone()).eprint(); }
			std::process::exit(i32::from(e.exit_code()));
		},
	}
}

#[inline]
/// # Actual Main.
///
/// This does all the stuff.
fn _main() -> Result<(), DiscprintError> {
	// Load CLI arguments, if any.
	let args = Argue::new(FLAG_HELP | FLAG_VERSION)?;

	// Check for unknown args.
	if let Some(boo) = args.check_keys(
		&[
			b"--accuraterip",
			b"--all",
			b"--freedb",
			b"--id",
			b"--isrc",
			b"--mcn",
			b"--musicbrainz",
			b"--quiet",
			b"--raw",
			b"--toc",
			b"--url",
			b"--verbose",
			b"--very-verbose",
			b"-A",
			b"-C",
			b"-F",
			b"-I",
			b"-M",
			b"-R",
			b"-a",
			b"-i",
			b"-q",
			b"-t",
			b"-u",
			b"-v",
		],
		&[
			b"--calculate",
			b"--dev",
			b"--format",
			b"-c",
			b"-d",
		],
	) {
		return Err(DiscprintError::CliArg(String::from_utf8_lossy(boo).into_owned()));
	}

	QUIET.store(args.switch2(b"-q", b"--quiet"), SeqCst);
	let verbosity: u8 =
		if args.switch(b"--very-verbose") { 3 }
		else if args.switch2(b"-v", b"--verbose") { 2 }
		else { 0 };

	let mode = parse_mode(&args)?;
	let actions = parse_actions(&args, mode);

	// The offline path: compute everything from textual TOC data.
	if let Some(raw) = args.option2(b"-c", b"--calculate") {
		if matches!(mode, Mode::Mcn | Mode::Isrc) {
			return Err(DiscprintError::CliParse("-C/-I without a physical disc"));
		}

		let text = String::from_utf8_lossy(raw);
		let toc = match args.option(b"--format") {
			Some(f) => {
				let f = String::from_utf8_lossy(f);
				TocDialect::try_from(f.as_ref())?.parse(&text)?
			},
			None => parse_any(&text)?.1,
		};

		print_toc_modes(&toc, mode, actions, false);
	}
	// The real thing: read a disc.
	else {
		let opts = ReadOpts::default()
			.with_mcn(matches!(mode, Mode::All | Mode::Mcn))
			.with_isrc(matches!(mode, Mode::All | Mode::Isrc))
			.with_cdtext(matches!(mode, Mode::All))
			.with_verbosity(verbosity);
		let disc = DiscInfo::read(args.option2_os(b"-d", b"--dev"), &opts)?;

		// A little stderr summary for the curious.
		if 0 < verbosity {
			if let Some(drive) = disc.drive() { eprintln!("{drive}"); }
			eprintln!("{disc}");
		}

		print_disc(&disc, mode, actions);
	}

	Ok(())
}

/// # Parse the Mode Switches.
///
/// At most one mode may be chosen; none at all means everything.
fn parse_mode(args: &Argue) -> Result<Mode, DiscprintError> {
	let mut out = None;
	for (short, long, mode) in [
		(&b"-R"[..], &b"--raw"[..], Mode::Raw),
		(&b"-A"[..], &b"--accuraterip"[..], Mode::AccurateRip),
		(&b"-C"[..], &b"--mcn"[..], Mode::Mcn),
		(&b"-F"[..], &b"--freedb"[..], Mode::FreeDb),
		(&b"-I"[..], &b"--isrc"[..], Mode::Isrc),
		(&b"-M"[..], &b"--musicbrainz"[..], Mode::MusicBrainz),
		(&b"-a"[..], &b"--all"[..], Mode::All),
	] {
		if args.switch2(short, long) {
			if out.is_some() {
				return Err(DiscprintError::CliParse("more than one mode at a time"));
			}
			out.replace(mode);
		}
	}

	Ok(out.unwrap_or(Mode::All))
}

/// # Parse the Action Switches.
///
/// No explicit action means "the ID" for single modes, everything for the
/// catch-all.
fn parse_actions(args: &Argue, mode: Mode) -> Actions {
	let id = args.switch2(b"-i", b"--id");
	let toc = args.switch2(b"-t", b"--toc");
	let url = args.switch2(b"-u", b"--url");

	if id || toc || url { Actions { id, toc, url } }
	else if matches!(mode, Mode::All) {
		Actions { id: true, toc: true, url: true }
	}
	else { Actions { id: true, toc: false, url: false } }
}

/// # Print the TOC-Derived Modes.
///
/// Everything computable without a disc in the drive: the four dialect
/// renderings and the three identifiers.
fn print_toc_modes(toc: &Toc, mode: Mode, actions: Actions, mut separator: bool) {
	/// # Section Header (All Mode Only).
	fn header(label: &str, separator: bool) {
		if separator { println!(); }
		println!("----- {label} -----");
	}

	let all = matches!(mode, Mode::All);

	if matches!(mode, Mode::All | Mode::Raw) {
		if all {
			header("Raw", separator);
			separator = true;
			println!("{}", TocDialect::Raw.render(toc));
		}
		// Raw has no ID; the TOC is the output.
		else if actions.toc || actions.id {
			println!("{}", TocDialect::Raw.render(toc));
		}
	}

	if matches!(mode, Mode::All | Mode::AccurateRip) {
		if all {
			header("AccurateRip", separator);
			separator = true;
		}
		if actions.toc { println!("{}", TocDialect::AccurateRip.render(toc)); }
		if actions.id { println!("{}", toc.accuraterip_id()); }
	}

	if matches!(mode, Mode::All | Mode::FreeDb) {
		if all { header("FreeDB", separator); separator = true; }
		if actions.toc { println!("{}", TocDialect::FreeDb.render(toc)); }
		if actions.id { println!("{}", toc.cddb_id()); }
	}

	if matches!(mode, Mode::All | Mode::MusicBrainz) {
		if all { header("MusicBrainz", separator); }
		if actions.toc { println!("{}", TocDialect::MusicBrainz.render(toc)); }
		if actions.id { println!("{}", toc.musicbrainz_id()); }
		if actions.url { println!("{}", toc.musicbrainz_url()); }
	}
}

/// # Print Everything For a Read Disc.
fn print_disc(disc: &DiscInfo, mode: Mode, actions: Actions) {
	let toc = disc.toc();
	let mut separator = false;

	// The disc-only extras lead.
	if matches!(mode, Mode::All | Mode::Mcn) {
		if let Some(mcn) = disc.mcn() {
			if matches!(mode, Mode::All) {
				println!("----- MCN -----");
				separator = true;
			}
			println!("{mcn}");
		}
	}

	if matches!(mode, Mode::All | Mode::Isrc) {
		let isrcs: Vec<(u8, &Isrc)> = toc.tracks()
			.iter()
			.filter_map(|t| t.isrc().map(|i| (t.number(), i)))
			.collect();
		if ! isrcs.is_empty() {
			if matches!(mode, Mode::All) {
				if separator { println!(); }
				println!("----- ISRC -----");
				separator = true;
			}
			for (num, isrc) in isrcs { println!("{num}: {isrc}"); }
		}
	}

	if matches!(mode, Mode::All) {
		if let Some(cdtext) = disc.cdtext() {
			if separator { println!(); }
			println!("----- CD-Text -----");
			separator = true;

			let album = cdtext.album();
			if let Some(v) = album.title.as_deref() { println!("Album: {v}"); }
			if let Some(v) = album.performer.as_deref() { println!("Artist: {v}"); }
			if let Some(v) = album.genre.as_deref() { println!("Genre: {v}"); }
			for (num, t) in cdtext.tracks() {
				if let Some(v) = t.title.as_deref() { println!("{num}: {v}"); }
			}
		}
	}

	print_toc_modes(toc, mode, actions, separator);
}
