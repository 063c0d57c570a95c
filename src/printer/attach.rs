use super::{command, status::STATUS_SIZE, DeviceId, Printer};

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

/// The Linux `usblp` driver exposes printers as `/dev/usb/lpN`.
const DEVICE_DIR: &str = "/dev/usb";
const DEVICE_PREFIX: &str = "lp";

/// The kernel copies at most this much of the device ID (including its 2-byte length).
const DEVICE_ID_BUFFER_SIZE: usize = 1024;

/// Number of `LPIOC_GET_DEVICE_ID` within the `'P'` ioctl group.
const IOCNR_GET_DEVICE_ID: u64 = 1;

/// Give up draining stale status packets after this many.
const MAX_STALE_PACKETS: usize = 64;

/// Position of the direction bits in an ioctl number. These architectures keep 3 direction bits
/// and 13 size bits instead of 2 and 14.
#[cfg(any(
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64"
))]
const IOC_DIRSHIFT: u64 = 29;

#[cfg(not(any(
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64"
)))]
const IOC_DIRSHIFT: u64 = 30;

/// `_IOC(_IOC_READ, 'P', IOCNR_GET_DEVICE_ID, len)`
const fn lpioc_get_device_id(len: usize) -> u64 {
    const IOC_READ: u64 = 2;

    (IOC_READ << IOC_DIRSHIFT) | ((len as u64) << 16) | ((b'P' as u64) << 8) | IOCNR_GET_DEVICE_ID
}

/// Read the IEEE 1284 device ID string of a printer.
fn read_device_id(file: &File) -> io::Result<DeviceId> {
    let mut buf = [0u8; DEVICE_ID_BUFFER_SIZE];

    // SAFETY: The request encodes the size of `buf`, so the kernel never writes beyond it.
    let ret = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            lpioc_get_device_id(buf.len()) as _,
            buf.as_mut_ptr(),
        )
    };

    if ret < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(DeviceId::parse_length_prefixed(&buf))
}

/// Candidate device paths in lexical order. A missing directory simply means that there are none.
fn candidates(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut paths = Vec::new();

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();

        let is_candidate = name
            .to_str()
            .and_then(|name| name.strip_prefix(DEVICE_PREFIX))
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));

        if is_candidate {
            paths.push(entry.path());
        }
    }

    paths.sort();
    Ok(paths)
}

/// Open the first device in `dir` that speaks our protocol.
fn discover_in(dir: &Path) -> io::Result<Option<Printer<File>>> {
    for path in candidates(dir)? {
        let file = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => file,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "Cannot open device, skipping it");
                continue;
            }
        };

        // Filter out obvious non-printers.
        let device_id = match read_device_id(&file) {
            Ok(device_id) => device_id,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "Cannot read device ID, skipping it");
                continue;
            }
        };

        if device_id.is_truncated() {
            tracing::warn!(path = %path.display(), "The device ID string got truncated");
        }

        // Filter out printers that wouldn't understand the protocol.
        if !device_id.is_compatible() {
            tracing::debug!(path = %path.display(), "Incompatible command set, skipping device");
            continue;
        }

        tracing::info!(
            path = %path.display(),
            manufacturer = device_id.manufacturer(),
            model = device_id.model(),
            "Found printer"
        );

        return Ok(Some(Printer::new(
            file,
            device_id.manufacturer(),
            device_id.model(),
        )));
    }

    Ok(None)
}

impl Printer<File> {
    /// Find and open the first USB printer supporting the raster protocol.
    /// Returns `None` if there is no such printer.
    pub fn discover() -> io::Result<Option<Self>> {
        discover_in(Path::new(DEVICE_DIR))
    }
}

impl<D: Read + Write> Printer<D> {
    /// Bring the printer into a defined state.
    pub fn initialize(&mut self) -> io::Result<()> {
        // Clear outstanding jobs by sending a bunch of "invalid" commands.
        // Then initialize the printer.
        self.write(&[0x00; command::CLEAR_LEN])?;
        self.write(command::INITIALIZE)?;

        // Flush former responses still waiting in the kernel or the printer.
        // They are leftovers, not replies to anything we are going to ask.
        let mut dummy = [0u8; STATUS_SIZE];

        for _ in 0..MAX_STALE_PACKETS {
            match self.read(&mut dummy) {
                Ok(0) => break,
                Ok(len) => tracing::debug!(len, "Discarded stale status data"),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }

        self.last_status = None;
        tracing::debug!("Printer initialized");

        Ok(())
    }
}
