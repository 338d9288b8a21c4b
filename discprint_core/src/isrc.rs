/*!
# Discprint: ISRCs

Subchannel data is fragile — scratches, drive firmware quirks, and plain
bad luck all corrupt it — so per-track ISRCs are recovered statistically:
sample a few well-spaced tranches of Q frames, collect the decoded
candidates, and only emit a value that wins a strong majority.
*/

use crate::{
	DiscprintError,
	QFrame,
	QSource,
	Toc,
	verbose,
};
use std::fmt;



/// # Probe Tracks Before Committing to a Full Scan.
const PROBE_COUNT: usize = 3;

/// # Minimum Audio Tracks For the Probe Phase to Make Sense.
const MIN_TRACKS_FOR_PROBE: usize = 5;

/// # Distinct Candidate Strings Worth Remembering Per Track.
const MAX_CANDIDATES: usize = 8;

/// # Evenly-Spaced Tranches For the First Pass.
const INITIAL_TRANCHES: usize = 3;

/// # Extra Tranches When the First Pass Can't Decide.
const RESCUE_TRANCHES: usize = 1;

/// # Frames Per Tranche.
const FRAMES_PER_TRANCHE: i32 = 192;

/// # Frames Skipped at Each End of a Track (Two Seconds).
const BOOKEND_FRAMES: i32 = 2 * 75;

/// # Below This Length, Just Read the Whole Track.
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap, reason = "Tranche counts are tiny.")]
const SHORT_TRACK_THRESHOLD: i32 =
	2 * BOOKEND_FRAMES +
	(INITIAL_TRANCHES + RESCUE_TRANCHES + 1) as i32 * FRAMES_PER_TRANCHE;

/// # Validated Samples Needed to Consider Stopping Early.
const EARLY_STOP_VALID: u32 = 64;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # ISRC.
///
/// A twelve-character International Standard Recording Code: two-letter
/// country, three-character registrant, two-digit year, five-digit
/// designation. All-zero strings are pressing-plant filler, not codes.
pub struct Isrc([u8; 12]);

impl fmt::Display for Isrc {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl TryFrom<&[u8]> for Isrc {
	type Error = DiscprintError;

	fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
		let src: [u8; 12] = src.try_into().map_err(|_| DiscprintError::Isrc)?;
		if
			src[..2].iter().all(u8::is_ascii_uppercase) &&
			src[2..5].iter().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) &&
			src[5..].iter().all(u8::is_ascii_digit) &&
			src.iter().any(|&b| b != b'0')
		{
			Ok(Self(src))
		}
		else { Err(DiscprintError::Isrc) }
	}
}

impl TryFrom<&str> for Isrc {
	type Error = DiscprintError;

	#[inline]
	fn try_from(src: &str) -> Result<Self, Self::Error> {
		Self::try_from(src.as_bytes())
	}
}

impl Isrc {
	#[expect(unsafe_code, reason = "Content is ASCII.")]
	#[must_use]
	/// # As Str.
	pub const fn as_str(&self) -> &str {
		// Safety: validation restricts the content to ASCII.
		unsafe { std::str::from_utf8_unchecked(self.0.as_slice()) }
	}
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Scan Summary.
///
/// How the ISRC scan went. Zero finds with `complete` set is a normal
/// outcome — plenty of discs simply carry no ISRCs.
pub(crate) struct ScanSummary {
	/// # Tracks That Got an ISRC.
	found: usize,

	/// # Did the Scan Run to Completion?
	complete: bool,
}

impl ScanSummary {
	/// # Tracks That Got an ISRC.
	pub(crate) const fn found(&self) -> usize { self.found }

	/// # Did the Scan Run to Completion?
	pub(crate) const fn complete(&self) -> bool { self.complete }
}



#[derive(Debug, Default)]
/// # Candidate Collector.
///
/// A bounded, insertion-ordered tally of the distinct ISRC strings seen
/// while sampling one track, plus read statistics for diagnostics.
struct Candidates {
	/// # Distinct Candidates and Their Counts.
	list: Vec<(Isrc, u32)>,

	/// # Frames That Produced a Format-Valid ISRC.
	total_valid: u32,

	/// # Frames Read (or Attempted) Overall.
	total_read: u32,
}

impl Candidates {
	/// # Feed a Batch of Frames.
	///
	/// Every frame counts toward the read total; only valid ADR-3 frames
	/// whose ISRC survived the format gate count as candidates.
	fn feed(&mut self, frames: &[QFrame]) {
		for f in frames {
			self.total_read += 1;
			if f.is_valid() {
				if let Some(isrc) = f.isrc() { self.add(isrc); }
			}
		}
	}

	/// # Count Skipped Frames.
	///
	/// Whole-batch read failures still count toward the read total so the
	/// diagnostics reflect the real denominator.
	fn skipped(&mut self, n: i32) {
		self.total_read += n.max(0).unsigned_abs();
	}

	/// # Tally One Candidate.
	fn add(&mut self, isrc: &Isrc) {
		self.total_valid += 1;
		if let Some(entry) = self.list.iter_mut().find(|(i, _)| i == isrc) {
			entry.1 += 1;
		}
		else if self.list.len() < MAX_CANDIDATES {
			self.list.push((*isrc, 1));
		}
	}

	/// # Strong Majority, If Any.
	///
	/// The leader wins if it was seen at least twice and at least twice as
	/// often as the runner-up.
	fn majority(&self) -> Option<(Isrc, u32)> {
		let (leader, m) = self.list.iter()
			.max_by_key(|(_, count)| *count)
			.map(|(i, count)| (*i, *count))?;
		let s = self.list.iter()
			.filter(|(i, _)| *i != leader)
			.map(|(_, count)| *count)
			.max()
			.unwrap_or(0);

		if 2 <= m && (s == 0 || 2 * s <= m) { Some((leader, m)) }
		else { None }
	}

	/// # Format the Tallies For Diagnostics.
	fn tallies(&self) -> String {
		if self.list.is_empty() { "(none)".to_owned() }
		else {
			let mut out = String::with_capacity(self.list.len() * 18);
			for (isrc, count) in &self.list {
				if ! out.is_empty() { out.push_str(", "); }
				out.push_str(isrc.as_str());
				out.push('x');
				out.push_str(itoa::Buffer::new().format(*count));
			}
			out
		}
	}
}



/// # Scan a Disc's Audio Tracks For ISRCs.
///
/// Populates [`Track::isrc`](crate::Track::isrc) for every audio track the
/// majority vote could settle, and returns the tally.
///
/// When the disc has enough substantial audio tracks, three probes are
/// scanned first; a disc whose probes all come up empty is concluded to
/// carry no ISRCs at all, saving a long pointless crawl.
pub(crate) fn scan_isrcs<S: QSource>(src: &mut S, toc: &mut Toc, verbosity: u8)
-> ScanSummary {
	// Snapshot the audio geometry up front so the TOC stays free for
	// updates.
	let specs: Vec<(u8, i32, i32)> = toc.tracks()
		.iter()
		.filter(|t| t.is_audio())
		.map(|t| (t.number(), t.lba(), t.frames()))
		.collect();

	verbose(verbosity, 1, &format!("isrc: {} audio tracks to scan", specs.len()));
	if specs.is_empty() { return ScanSummary { found: 0, complete: true }; }

	// Make sure batch subchannel reads actually work on this drive before
	// committing to the sampling strategy.
	if ! batch_works(src, &specs, verbosity) {
		return fallback_scan(src, toc, &specs, verbosity);
	}

	let mut found = 0;
	let mut scanned: Vec<u8> = Vec::with_capacity(specs.len());

	// Probe phase.
	if MIN_TRACKS_FOR_PROBE <= specs.len() {
		if let Some(probes) = select_probe_tracks(&specs, verbosity) {
			verbose(verbosity, 1, "isrc: probing 3 tracks");
			let mut hit = false;
			for idx in probes {
				let (num, lba, frames) = specs[idx];
				scanned.push(num);
				if let Some(isrc) = scan_track(src, num, lba, frames, verbosity) {
					toc.set_isrc(num, isrc);
					found += 1;
					hit = true;
					verbose(verbosity, 1, &format!("isrc: probe hit on track {num}"));
				}
			}

			// No probe produced anything; call the whole disc ISRC-free.
			if ! hit {
				verbose(verbosity, 1, "isrc: no ISRCs in probe tracks, skipping full scan");
				return ScanSummary { found: 0, complete: true };
			}
		}
	}

	// Everything else.
	for &(num, lba, frames) in &specs {
		if scanned.contains(&num) { continue; }
		if let Some(isrc) = scan_track(src, num, lba, frames, verbosity) {
			toc.set_isrc(num, isrc);
			found += 1;
		}
	}

	verbose(verbosity, 1, &format!("isrc: scan complete, {found} found"));
	ScanSummary { found, complete: true }
}

/// # Do Batch Subchannel Reads Work Here?
///
/// Read a few frames from inside the first audio track; anything valid
/// means the command set is usable.
fn batch_works<S: QSource>(src: &mut S, specs: &[(u8, i32, i32)], verbosity: u8) -> bool {
	let (_, lba, frames) = specs[0];
	let probe_lba = lba + 100.min(frames / 2);
	verbose(verbosity, 2, &format!("isrc: testing batch read at LBA {probe_lba}"));
	match src.read_q_batch(probe_lba, 10) {
		Ok(frames) => frames.iter().any(crate::QFrame::is_valid),
		Err(_) => false,
	}
}

/// # Fallback: Drive-Formatted Per-Track Reads.
///
/// Some drives refuse subchannel-only READ CD transfers. The formatted
/// READ SUB-CHANNEL query is far less trustworthy — no checksum, no
/// voting — but it is better than giving up.
fn fallback_scan<S: QSource>(
	src: &mut S,
	toc: &mut Toc,
	specs: &[(u8, i32, i32)],
	verbosity: u8,
) -> ScanSummary {
	verbose(verbosity, 1, "isrc: WARNING - drive-formatted reads only (no validation)");

	let mut found = 0;
	for &(num, _, _) in specs {
		match src.read_track_isrc(num) {
			Ok(Some(isrc)) => {
				verbose(verbosity, 2, &format!("isrc: track {num}: {isrc}"));
				toc.set_isrc(num, isrc);
				found += 1;
			},
			Ok(None) => {
				verbose(verbosity, 2, &format!("isrc: track {num}: not found"));
			},
			Err(_) => return ScanSummary { found, complete: false },
		}
	}

	verbose(verbosity, 1, &format!("isrc: scan complete, {found} found"));
	ScanSummary { found, complete: true }
}

/// # Pick the Probe Tracks.
///
/// Roughly the 33%, 50%, and 67% marks of the eligible (audio, non-short)
/// list, nudged inward so the error-prone first and last tracks are
/// avoided when there's room.
fn select_probe_tracks(specs: &[(u8, i32, i32)], verbosity: u8) -> Option<[usize; 3]> {
	let eligible: Vec<usize> = specs.iter()
		.enumerate()
		.filter(|(_, (_, _, frames))| SHORT_TRACK_THRESHOLD <= *frames)
		.map(|(i, _)| i)
		.collect();

	verbose(verbosity, 2, &format!(
		"isrc: {} eligible tracks for probe (of {})",
		eligible.len(),
		specs.len(),
	));

	let len = eligible.len();
	if len < PROBE_COUNT { return None; }

	let mut pos = [len / 3, len / 2, len * 2 / 3];
	if pos[0] == 0 && 3 < len { pos[0] = 1; }
	if pos[2] == len - 1 && 3 < len { pos[2] = len - 2; }
	if pos[1] == pos[0] { pos[1] += 1; }
	if pos[2] == pos[1] { pos[2] += 1; }
	if len <= pos[2] { pos[2] = len - 1; }

	Some([eligible[pos[0]], eligible[pos[1]], eligible[pos[2]]])
}

/// # Tranche Positions.
///
/// Divide the usable region — the track minus its two-second bookends —
/// into `count + 1` equal steps and start a tranche at each interior step.
fn tranche_positions(lba: i32, frames: i32, count: usize) -> Vec<i32> {
	let mut start = lba + BOOKEND_FRAMES;
	let mut end = lba + frames - BOOKEND_FRAMES;
	if end <= start {
		start = lba;
		end = lba + frames;
	}
	let usable = end - start;

	if count == 1 { vec![start + usable / 2] }
	else {
		#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap, reason = "Tranche counts are tiny.")]
		let step = usable / (count as i32 + 1);
		(1..=count as i32).map(|i| start + step * i).collect()
	}
}

/// # Scan One Track.
///
/// Short tracks get read end-to-end; everything else gets the tranche
/// treatment with an early stop once the vote is already settled, plus a
/// rescue round if the initial tranches saw candidates but no winner.
fn scan_track<S: QSource>(src: &mut S, num: u8, lba: i32, frames: i32, verbosity: u8)
-> Option<Isrc> {
	let mut collector = Candidates::default();

	// Short track: one full read, one vote.
	if frames < SHORT_TRACK_THRESHOLD {
		verbose(verbosity, 2, &format!(
			"isrc: track {num}: short track ({frames} frames), full scan",
		));
		if let Ok(batch) = src.read_q_batch(lba, frames) {
			collector.feed(&batch);
		}
		else { collector.skipped(frames); }

		return finish_track(num, &collector, "majority", verbosity);
	}

	// Initial tranches.
	for pos in tranche_positions(lba, frames, INITIAL_TRANCHES) {
		if let Ok(batch) = src.read_q_batch(pos, FRAMES_PER_TRANCHE) {
			collector.feed(&batch);
		}
		else { collector.skipped(FRAMES_PER_TRANCHE); }

		// Early stop: enough validated samples and a clear winner.
		if EARLY_STOP_VALID <= collector.total_valid {
			if let Some(out) = finish_track(num, &collector, "early", verbosity) {
				return Some(out);
			}
		}
	}

	if let Some(out) = finish_track(num, &collector, "majority", verbosity) {
		return Some(out);
	}

	// Rescue round: something was seen, but nothing won. Re-layout the
	// tranche grid one step finer and sample the new interior positions.
	if ! collector.list.is_empty() {
		verbose(verbosity, 2, &format!(
			"isrc: track {num}: rescue sampling ({} candidates, no majority)",
			collector.list.len(),
		));

		let layout = tranche_positions(lba, frames, INITIAL_TRANCHES + RESCUE_TRANCHES);
		for &pos in &layout[INITIAL_TRANCHES..] {
			if let Ok(batch) = src.read_q_batch(pos, FRAMES_PER_TRANCHE) {
				collector.feed(&batch);
			}
			else { collector.skipped(FRAMES_PER_TRANCHE); }

			if let Some(out) = finish_track(num, &collector, "rescue", verbosity) {
				return Some(out);
			}
		}

		verbose(verbosity, 2, &format!(
			"isrc: track {num}: indeterminate ({} candidates, {}/{} valid)",
			collector.list.len(),
			collector.total_valid,
			collector.total_read,
		));
	}
	else if collector.total_valid == 0 {
		verbose(verbosity, 2, &format!(
			"isrc: track {num}: no ISRC frames ({} read)",
			collector.total_read,
		));
	}

	None
}

/// # Check the Vote and Log the Outcome.
fn finish_track(num: u8, collector: &Candidates, how: &str, verbosity: u8)
-> Option<Isrc> {
	let (winner, count) = collector.majority()?;
	verbose(verbosity, 3, &format!(
		"isrc: track {num}: candidates: {}",
		collector.tallies(),
	));
	verbose(verbosity, 2, &format!(
		"isrc: track {num}: {winner} ({how}, {count}/{})",
		collector.total_valid,
	));
	Some(winner)
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		QFrame,
		Track,
		TrackType,
	};

	/// # What Should the Synthetic Disc Hand Back?
	enum Oracle {
		/// # A Fixed ISRC, With One Unreadable Frame In Every `n`.
		Fixed(Isrc, u32),

		/// # Position Frames Only; No ISRCs Anywhere.
		PositionOnly,

		/// # Two ISRCs In Equal Proportion.
		Split(Isrc, Isrc),
	}

	/// # Synthetic Q-Subchannel Source.
	struct FakeDisc {
		oracle: Oracle,
		counter: u32,
		reads: u32,
	}

	impl FakeDisc {
		fn new(oracle: Oracle) -> Self {
			Self { oracle, counter: 0, reads: 0 }
		}
	}

	impl QSource for FakeDisc {
		fn read_q_batch(&mut self, _lba: i32, count: i32)
		-> Result<Vec<QFrame>, DiscprintError> {
			self.reads += 1;
			let mut out = Vec::with_capacity(count.max(0).unsigned_abs() as usize);
			for _ in 0..count {
				self.counter += 1;
				out.push(match &self.oracle {
					Oracle::Fixed(isrc, noise) => {
						if self.counter % *noise == 0 { QFrame::unreadable() }
						else { isrc_q(isrc) }
					},
					Oracle::PositionOnly => position_q(),
					Oracle::Split(a, b) => {
						if self.counter % 2 == 0 { isrc_q(a) }
						else { isrc_q(b) }
					},
				});
			}
			Ok(out)
		}
	}

	/// # Helper: a Valid ADR-3 Frame.
	fn isrc_q(isrc: &Isrc) -> QFrame {
		let raw = isrc.as_str().as_bytes();
		let six = |c: u8| -> u8 {
			match c {
				b'0'..=b'9' => c - b'0',
				_ => c - b'A' + 17,
			}
		};
		let mut buf = [0_u8; 16];
		buf[0] = 0x03;
		buf[1] = (six(raw[0]) << 2) | (six(raw[1]) >> 4);
		buf[2] = ((six(raw[1]) & 0b1111) << 4) | (six(raw[2]) >> 2);
		buf[3] = ((six(raw[2]) & 0b0011) << 6) | six(raw[3]);
		buf[4] = six(raw[4]) << 2;
		buf[5] = ((raw[5] - b'0') << 4) | (raw[6] - b'0');
		buf[6] = ((raw[7] - b'0') << 4) | (raw[8] - b'0');
		buf[7] = ((raw[9] - b'0') << 4) | (raw[10] - b'0');
		buf[8] = (raw[11] - b'0') << 4;
		QFrame::from_formatted(&buf)
	}

	/// # Helper: a Valid ADR-1 Frame.
	fn position_q() -> QFrame {
		let mut buf = [0_u8; 16];
		buf[0] = 0x01;
		buf[1] = 1;
		buf[2] = 1;
		QFrame::from_formatted(&buf)
	}

	/// # Helper: a TOC of `n` Audio Tracks, `frames` Apiece.
	fn fake_toc(n: u8, frames: i32) -> Toc {
		let tracks: Vec<Track> = (0..n).map(|i|
			Track::new(i + 1, 1, TrackType::Audio, i32::from(i) * frames, 0, 1)
				.expect("Track failed.")
		).collect();
		Toc::from_tracks(tracks, i32::from(n) * frames, None, 1)
			.expect("Toc failed.")
	}

	#[test]
	fn t_isrc_gate() {
		assert!(Isrc::try_from("USRC17607839").is_ok());
		assert!(Isrc::try_from("GBAYE0500605").is_ok());

		// Digits are fine in the registrant, but nowhere else letters go.
		assert!(Isrc::try_from("US1C17607839").is_ok());
		assert!(Isrc::try_from("U1RC17607839").is_err());
		assert!(Isrc::try_from("USRCA7607839").is_err());
		assert!(Isrc::try_from("USRC1760783").is_err());
		assert!(Isrc::try_from("usrc17607839").is_err());
		assert!(Isrc::try_from("000000000000").is_err());
	}

	#[test]
	fn t_tranche_positions() {
		// A 10,000-frame track at LBA 0: usable region is 150..9850, step
		// 2425.
		let pos = tranche_positions(0, 10_000, 3);
		assert_eq!(pos, vec![2575, 5000, 7425]);

		// The rescue layout re-divides with one more step.
		let pos = tranche_positions(0, 10_000, 4);
		assert_eq!(pos.len(), 4);
		assert!(pos.windows(2).all(|p| p[0] < p[1]));

		// Tiny tracks lose their bookends rather than inverting.
		let pos = tranche_positions(500, 200, 1);
		assert_eq!(pos, vec![600]);
	}

	#[test]
	fn t_scan_clean() {
		// A clean disc: every frame carries the ISRC; early-stop should
		// settle each track in the first tranche.
		let isrc = Isrc::try_from("USRC17607839").expect("Isrc failed.");
		let mut disc = FakeDisc::new(Oracle::Fixed(isrc, u32::MAX));
		let mut toc = fake_toc(6, 10_000);

		let summary = scan_isrcs(&mut disc, &mut toc, 0);
		assert!(summary.complete());
		assert_eq!(summary.found(), 6);
		for t in toc.tracks() {
			assert_eq!(t.isrc().map(Isrc::as_str), Some("USRC17607839"));
		}
	}

	#[test]
	fn t_scan_noisy() {
		// A third of all frames unreadable; the majority still lands.
		let isrc = Isrc::try_from("GBAYE0500605").expect("Isrc failed.");
		let mut disc = FakeDisc::new(Oracle::Fixed(isrc, 3));
		let mut toc = fake_toc(4, 10_000);

		let summary = scan_isrcs(&mut disc, &mut toc, 0);
		assert_eq!(summary.found(), 4);
	}

	#[test]
	fn t_scan_short_track() {
		// Below the threshold the whole track gets read in one go.
		let isrc = Isrc::try_from("USRC17607839").expect("Isrc failed.");
		let mut disc = FakeDisc::new(Oracle::Fixed(isrc, u32::MAX));
		let mut toc = fake_toc(1, 1_000);

		let summary = scan_isrcs(&mut disc, &mut toc, 0);
		assert_eq!(summary.found(), 1);
		assert_eq!(
			toc.tracks()[0].isrc().map(Isrc::as_str),
			Some("USRC17607839"),
		);
	}

	#[test]
	fn t_scan_probe_miss() {
		// Ten audio tracks, zero ADR-3 frames anywhere: the three probes
		// come up dry and the scan stops without touching the rest.
		let mut disc = FakeDisc::new(Oracle::PositionOnly);
		let mut toc = fake_toc(10, 10_000);

		let summary = scan_isrcs(&mut disc, &mut toc, 0);
		assert!(summary.complete());
		assert_eq!(summary.found(), 0);
		assert!(toc.tracks().iter().all(|t| t.isrc().is_none()));

		// One batch test plus three probes' worth of tranches, give or
		// take rescue rounds; nowhere near ten tracks' worth.
		assert!(disc.reads < 1 + 10 * (INITIAL_TRANCHES as u32 + 2));
	}

	#[test]
	fn t_scan_split_vote() {
		// Two ISRCs in equal proportion: no strong majority, no emission.
		let a = Isrc::try_from("USRC17607839").expect("Isrc failed.");
		let b = Isrc::try_from("GBAYE0500605").expect("Isrc failed.");
		let mut disc = FakeDisc::new(Oracle::Split(a, b));
		let mut toc = fake_toc(1, 10_000);

		let summary = scan_isrcs(&mut disc, &mut toc, 0);
		assert_eq!(summary.found(), 0);
		assert!(toc.tracks()[0].isrc().is_none());
	}

	#[test]
	fn t_probe_selection() {
		// Ten eligible tracks: thirds, nudged off the edges.
		let specs: Vec<(u8, i32, i32)> = (0..10_u8)
			.map(|i| (i + 1, i32::from(i) * 10_000, 10_000))
			.collect();
		let probes = select_probe_tracks(&specs, 0).expect("Probe selection failed.");
		assert_eq!(probes, [3, 5, 6]);

		// Too few eligible tracks: no probe phase.
		let specs: Vec<(u8, i32, i32)> = vec![(1, 0, 500), (2, 500, 10_000)];
		assert!(select_probe_tracks(&specs, 0).is_none());
	}
}
