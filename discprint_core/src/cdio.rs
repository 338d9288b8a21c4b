/*!
# Discprint: Device Sessions

Pretty much all drive communication runs through a single `libcdio`
object. Every interface is unsafe and awkward, so this struct exists to
abstract away the noise, hold exclusive access for the duration of one
read cycle, and guarantee cleanup on every exit path.
*/

use crate::{
	CD_SUBCHANNEL_SIZE,
	DiscprintError,
	Isrc,
	Mcn,
	QFrame,
	QSource,
};
use dactyl::traits::SaturatingFrom;
use libcdio_sys::{
	cdio_mmc_direction_SCSI_MMC_DATA_READ,
	discmode_t_CDIO_DISC_MODE_CD_DA,
	discmode_t_CDIO_DISC_MODE_CD_MIXED,
	discmode_t_CDIO_DISC_MODE_CD_XA,
	driver_id_t_DRIVER_DEVICE, // The equivalent of "use whatever's best".
	driver_return_code_t_DRIVER_OP_NOT_PERMITTED,
	driver_return_code_t_DRIVER_OP_SUCCESS,
	driver_return_code_t_DRIVER_OP_UNSUPPORTED,
	mmc_cdb_t,
};
use std::{
	ffi::{
		CStr,
		CString,
	},
	os::unix::ffi::OsStrExt,
	path::{
		Path,
		PathBuf,
	},
	sync::Once,
	time::{
		Duration,
		Instant,
	},
};



/// # How Long to Keep Retrying a Busy Open.
const OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// # Backoff Between Open Attempts.
const OPEN_BACKOFF: Duration = Duration::from_millis(500);

/// # How Long to Wait For the Device Node After Close.
///
/// The host may re-mount and index the disc the moment we let go; give it
/// time to finish before the program (and any follow-up run) moves on.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// # Poll Interval For the Post-Close Wait.
const CLOSE_POLL: Duration = Duration::from_millis(100);

/// # Timeout For Ordinary Reads.
pub(crate) const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// # Timeout For Quick Probe Reads.
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// # Frames Per Batched Subchannel Command.
const QBATCH_MAX: i32 = 75;

/// # Initialization Counter.
static LIBCDIO_INIT: Once = Once::new();



#[derive(Debug)]
/// # Device Session.
///
/// Exclusive communication with one optical drive for the duration of a
/// read cycle. The raw command blocks from the MMC spec all funnel through
/// [`DeviceSession::send_cdb`]; the platform differences in how exclusive
/// access is negotiated stay behind `libcdio`'s drivers.
pub(crate) struct DeviceSession {
	/// # The Device Argument, If One Was Given.
	dev: Option<CString>,

	/// # Same, As a Path For the Post-Close Poll.
	path: Option<PathBuf>,

	/// # The `libcdio` Object.
	ptr: *mut libcdio_sys::CdIo_t,
}

impl Drop for DeviceSession {
	#[expect(unsafe_code, reason = "Releasing the C memory.")]
	fn drop(&mut self) {
		if ! self.ptr.is_null() {
			// Safety: the pointer was checked non-null at construction and
			// is never handed out.
			unsafe { libcdio_sys::cdio_destroy(self.ptr); }

			// Wait for the device node to answer again before letting go.
			if let Some(path) = self.path.as_deref() {
				let started = Instant::now();
				while started.elapsed() < CLOSE_TIMEOUT {
					if std::fs::File::open(path).is_ok() { break; }
					std::thread::sleep(CLOSE_POLL);
				}
			}

			// Use the dev field so Rust won't complain about dead code. Haha.
			self.dev.take();
		}
	}
}

impl DeviceSession {
	#[expect(unsafe_code, reason = "The library is all pointers.")]
	/// # New!
	///
	/// Open a session, optionally against a specific device. Busy drives
	/// get retried with backoff for a while before the attempt is written
	/// off; media presence is confirmed before the session is handed back.
	///
	/// ## Errors
	///
	/// This will return an error if the device path is obviously wrong,
	/// exclusive access never comes through, or no supported disc is
	/// loaded.
	pub(crate) fn new<P>(dev: Option<P>) -> Result<Self, DiscprintError>
	where P: AsRef<Path> {
		// Make sure the library has been initialized.
		init();

		// Take a look at the desired device.
		let mut path = None;
		let dev = {
			if let Some(dev) = dev {
				let dev = dev.as_ref();
				let original: String = dev.to_string_lossy().into_owned();
				if ! dev.exists() {
					return Err(DiscprintError::Device(original));
				}
				path.replace(dev.to_path_buf());
				let dev = CString::new(dev.as_os_str().as_bytes())
					.map_err(|_| DiscprintError::Device(original))?;
				Some(dev)
			}
			else { None }
		};

		// Connect, retrying through transient busy states.
		let started = Instant::now();
		let mut ptr;
		loop {
			// Safety: null is an accepted argument (it means "default
			// drive"), and the return gets null-checked below.
			ptr = unsafe {
				libcdio_sys::cdio_open(
					dev.as_ref().map_or_else(std::ptr::null, |v| v.as_ptr()),
					driver_id_t_DRIVER_DEVICE,
				)
			};
			if ! ptr.is_null() || OPEN_TIMEOUT <= started.elapsed() { break; }
			std::thread::sleep(OPEN_BACKOFF);
		}

		// Still NULL means it was never going to happen.
		if ptr.is_null() {
			if path.is_some() { Err(DiscprintError::AccessDenied) }
			else { Err(DiscprintError::DeviceOpen(None)) }
		}
		else {
			let out = Self { dev, path, ptr };

			// Make sure a disc is actually present before leaving.
			out._check_disc_mode()?;
			Ok(out)
		}
	}

	#[expect(unsafe_code, reason = "The library is all pointers.")]
	#[allow(non_upper_case_globals, reason = "These aren't our globals.")]
	/// # Check Disc Mode.
	///
	/// This makes sure a CD is actually present in the drive.
	///
	/// ## Errors
	///
	/// Returns an error if the disc is missing or unsupported.
	fn _check_disc_mode(&self) -> Result<(), DiscprintError> {
		// Safety: the pointer was checked non-null at construction.
		let discmode = unsafe {
			libcdio_sys::cdio_get_discmode(self.ptr)
		};
		if matches!(
			discmode,
			discmode_t_CDIO_DISC_MODE_CD_DA |
			discmode_t_CDIO_DISC_MODE_CD_MIXED |
			discmode_t_CDIO_DISC_MODE_CD_XA
		) {
			Ok(())
		}
		else { Err(DiscprintError::MediaAbsent) }
	}
}

impl DeviceSession {
	#[expect(unsafe_code, reason = "The library is all pointers.")]
	#[allow(non_upper_case_globals, reason = "These aren't our globals.")]
	/// # Transport a Raw Command Block.
	///
	/// Ship a CDB to the drive and read the response into `buf`. This is
	/// the single entry point every MMC command in the program goes
	/// through; callers own the byte-exact encoding.
	///
	/// ## Errors
	///
	/// Returns [`DiscprintError::CdReadUnsupported`] if the drive rejects
	/// the command code, and [`DiscprintError::CdRead`] for any other
	/// transport failure.
	pub(crate) fn send_cdb(&self, cdb: &[u8], buf: &mut [u8], timeout: Duration)
	-> Result<(), DiscprintError> {
		if cdb.is_empty() || 16 < cdb.len() {
			return Err(DiscprintError::Bug("Invalid command block length."));
		}

		let mut raw = mmc_cdb_t { field: [0; 16] };
		raw.field[..cdb.len()].copy_from_slice(cdb);

		#[expect(clippy::cast_possible_truncation, reason = "Timeouts are seconds, not eons.")]
		let timeout_ms = timeout.as_millis().min(u128::from(u32::MAX)) as u32;

		#[expect(clippy::cast_possible_truncation, reason = "Response buffers are tiny.")]
		// Safety: the buffer length is passed along with the pointer, and
		// the session pointer was checked non-null at construction.
		let res = unsafe {
			libcdio_sys::mmc_run_cmd(
				self.ptr,
				timeout_ms,
				&raw,
				cdio_mmc_direction_SCSI_MMC_DATA_READ,
				buf.len() as u32,
				buf.as_mut_ptr().cast(),
			)
		};

		match res {
			driver_return_code_t_DRIVER_OP_SUCCESS => Ok(()),
			driver_return_code_t_DRIVER_OP_NOT_PERMITTED |
			driver_return_code_t_DRIVER_OP_UNSUPPORTED => Err(DiscprintError::CdReadUnsupported),
			_ => Err(DiscprintError::CdRead),
		}
	}

	#[expect(unsafe_code, reason = "The library is all pointers.")]
	/// # Drive Vendor/Model.
	///
	/// Fetch a human-readable drive identity for diagnostic strings, if
	/// the drive feels like sharing one.
	pub(crate) fn hwinfo(&self) -> Option<String> {
		let mut raw = libcdio_sys::cdio_hwinfo {
			psz_vendor: [0; 9],
			psz_model: [0; 17],
			psz_revision: [0; 5],
		};

		// The return code is a bool, true for good, instead of the usual
		// 0 for good.
		// Safety: the struct is sized per the header; the session pointer
		// was checked non-null at construction.
		if 1 == unsafe { libcdio_sys::cdio_get_hwinfo(self.ptr, &mut raw) } {
			// Rather than deal with the uncertainty of pointers, let's
			// recast the signs since we have everything right here.
			let vendor_u8 = raw.psz_vendor.map(u8::saturating_from);
			let model_u8 = raw.psz_model.map(u8::saturating_from);

			let vendor = CStr::from_bytes_until_nul(vendor_u8.as_slice())
				.ok()
				.and_then(|v| v.to_str().ok())
				.unwrap_or("")
				.trim();
			let model = CStr::from_bytes_until_nul(model_u8.as_slice())
				.ok()
				.and_then(|v| v.to_str().ok())?
				.trim();
			if model.is_empty() { return None; }

			if vendor.is_empty() { Some(model.to_owned()) }
			else { Some([vendor, " ", model].concat()) }
		}
		else { None }
	}

	/// # Media Catalog Number.
	///
	/// Query the disc's catalog number via READ SUB-CHANNEL. Some drives
	/// need the question asked more than once before they answer it, so a
	/// couple of retries are cheap and worth it. Absence is normal.
	pub(crate) fn read_mcn(&self) -> Option<Mcn> {
		for attempt in 0..3_u8 {
			if 0 < attempt { std::thread::sleep(Duration::from_millis(100)); }

			let mut cdb = [0_u8; 10];
			cdb[0] = 0x42; // READ SUB-CHANNEL.
			cdb[2] = 0x40; // SubQ.
			cdb[3] = 0x02; // Data format: MCN.
			cdb[8] = 24;   // Allocation length.

			let mut buf = [0_u8; 24];
			if self.send_cdb(&cdb, &mut buf, PROBE_TIMEOUT).is_ok() && buf[8] & 0x80 != 0 {
				// MCVAL says yes: thirteen ASCII digits at bytes 9..22.
				if let Ok(mcn) = Mcn::try_from(&buf[9..22]) { return Some(mcn); }
			}
		}

		None
	}

	/// # Read One Chunk of Formatted Q Frames.
	///
	/// A single READ CD command for up to [`QBATCH_MAX`] sectors, with the
	/// main channel suppressed and the formatted 16-byte Q block selected.
	fn read_q_chunk(&self, lba: i32, count: i32, out: &mut Vec<QFrame>)
	-> Result<(), DiscprintError> {
		let mut cdb = [0_u8; 12];
		cdb[0] = 0xBE; // READ CD.
		cdb[2..6].copy_from_slice(&lba.to_be_bytes());
		let len = count.max(0).unsigned_abs().to_be_bytes();
		cdb[6..9].copy_from_slice(&len[1..]); // 24-bit transfer length.
		cdb[10] = 0x02; // Formatted Q, 16 bytes per sector.

		let mut buf = vec![0_u8; count.max(0).unsigned_abs() as usize * CD_SUBCHANNEL_SIZE];
		self.send_cdb(&cdb, &mut buf, READ_TIMEOUT)?;

		for frame in buf.chunks_exact(CD_SUBCHANNEL_SIZE) {
			let frame: &[u8; 16] = frame.try_into()
				.map_err(|_| DiscprintError::Bug("Subchannel chunking broke."))?;
			out.push(QFrame::from_formatted(frame));
		}
		Ok(())
	}
}

impl QSource for DeviceSession {
	/// # Read a Batch of Consecutive Frames.
	///
	/// One command covers up to 75 frames; longer requests are split. If a
	/// batched command fails mid-run, the affected span is retried one
	/// frame at a time so a single bad sector doesn't wipe out its whole
	/// chunk. Only a whole-command rejection on the *first* chunk
	/// propagates, so callers can tell "this drive can't do this" apart
	/// from "this disc is scratched".
	fn read_q_batch(&mut self, lba: i32, count: i32) -> Result<Vec<QFrame>, DiscprintError> {
		let mut out = Vec::with_capacity(count.max(0).unsigned_abs() as usize);
		let mut pos = lba;
		let end = lba + count.max(0);

		while pos < end {
			let chunk = (end - pos).min(QBATCH_MAX);
			match self.read_q_chunk(pos, chunk, &mut out) {
				Ok(()) => {},
				Err(e @ DiscprintError::CdReadUnsupported) if pos == lba => return Err(e),
				Err(_) => {
					// Fall back to single-frame reads for this span.
					for f in 0..chunk {
						let mut single = Vec::with_capacity(1);
						if self.read_q_chunk(pos + f, 1, &mut single).is_ok() {
							out.append(&mut single);
						}
						else { out.push(QFrame::unreadable()); }
					}
				},
			}
			pos += chunk;
		}

		Ok(out)
	}

	/// # Drive-Formatted ISRC For One Track.
	///
	/// The READ SUB-CHANNEL fallback: no checksum, no voting, just
	/// whatever the drive's firmware scraped together.
	fn read_track_isrc(&mut self, track: u8) -> Result<Option<Isrc>, DiscprintError> {
		let mut cdb = [0_u8; 10];
		cdb[0] = 0x42; // READ SUB-CHANNEL.
		cdb[2] = 0x40; // SubQ.
		cdb[3] = 0x03; // Data format: ISRC.
		cdb[6] = track;
		cdb[8] = 24;   // Allocation length.

		let mut buf = [0_u8; 24];
		match self.send_cdb(&cdb, &mut buf, READ_TIMEOUT) {
			Ok(()) => {},
			Err(DiscprintError::CdReadUnsupported) => return Ok(None),
			Err(e) => return Err(e),
		}

		// TCVAL gates the whole response.
		if buf[8] & 0x80 == 0 { return Ok(None); }
		Ok(Isrc::try_from(&buf[9..21]).ok())
	}
}



#[expect(unsafe_code, reason = "The library insists.")]
/// # Initialize `libcdio`.
///
/// This is only called once, but to be safe, it is also wrapped in a
/// static to make sure it can never re-initialize.
fn init() {
	// Safety: guarded by `Once`.
	LIBCDIO_INIT.call_once(|| unsafe { libcdio_sys::cdio_init(); });
}
