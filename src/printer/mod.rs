use std::fs::File;
use std::io::{Read, Write};

/// Raw command bytes of the raster protocol.
mod command;

/// Status byte 4 identifies the printer model.
mod model;
pub use model::Model;

/// Brother printer labels are standardized. To properly print them, we need layout parameters (margins etc.).
mod label;
pub use label::MediaInfo;

/// Printers describe themselves with an IEEE 1284 device ID string.
mod device_id;
pub use device_id::DeviceId;

/// Enumerate the `usblp` character devices, find a compatible printer, open and initialize it.
mod attach;

/// The status response is the basic feedback method from the printer to the host.
mod status;
pub use status::{
    Error as StatusError, ErrorFlags as StatusErrorFlags, MediaType, Notification, Phase, Status,
    StatusType,
};

/// Conversion of the input picture into raster lines.
mod raster;
pub use raster::{encode as encode_raster, ColorMode, LINE_BYTES, LINE_PINS};

/// Assembly of the command sequence for one label.
mod job;
pub use job::PrintJob;

/// Submitting a job and following the printer until it is done.
mod print;
pub use print::{Error as PrintError, PrintConfig};

/// Raw reads and writes on the device handle.
mod io;

type StatusNotify = Box<dyn FnMut(&Status)>;

/// A session with one opened printer.
///
/// The device is generic so that anything speaking the `usblp` read semantics can stand in for it:
/// a read of zero bytes means that the printer has nothing to say yet.
pub struct Printer<D = File>
where
    D: Read + Write,
{
    /// The opened device (`None` once closed)
    device: Option<D>,

    /// Manufacturer as reported by the device ID
    manufacturer: String,

    /// Model as reported by the device ID
    model: String,

    /// The status packet of the last successful poll
    last_status: Option<Status>,

    /// Optional observer for every received status packet
    status_notify: Option<StatusNotify>,

    print_config: PrintConfig,
}

impl<D: Read + Write> Printer<D> {
    /// Wrap an already opened device.
    pub fn new(device: D, manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            device: Some(device),
            manufacturer: manufacturer.into(),
            model: model.into(),
            last_status: None,
            status_notify: None,
            print_config: PrintConfig::default(),
        }
    }

    /// Register an observer that is called for every status packet received from the printer.
    /// It is purely informational, the return values of the operations drive the control flow.
    pub fn with_status_notify<F>(mut self, notify: F) -> Self
    where
        F: FnMut(&Status) + 'static,
    {
        self.status_notify = Some(Box::new(notify));
        self
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The status obtained by the last poll, if it succeeded.
    pub fn last_status(&self) -> Option<&Status> {
        self.last_status.as_ref()
    }

    /// Media information for the last status. Never cached, it is derived on every call.
    pub fn media_info(&self) -> Option<MediaInfo> {
        self.last_status
            .as_ref()
            .and_then(|s| MediaInfo::lookup(s.media_width_mm(), s.media_length_mm()))
    }

    /// Release the device. Calling this again does nothing.
    pub fn close(&mut self) {
        if self.device.take().is_some() {
            tracing::debug!("Closed printer device");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.device.is_none()
    }
}
