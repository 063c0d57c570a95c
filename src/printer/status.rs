use super::{command, Model, Printer};

use std::fmt::Display;
use std::io::{self, ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

/// The status packet always has 32 bytes.
pub const STATUS_SIZE: usize = 32;

/// Wait between two reads that returned no data.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// Field offsets within the status packet.
const MODEL_CODE: usize = 4;
const ERROR_INFO_1: usize = 8;
const ERROR_INFO_2: usize = 9;
const MEDIA_WIDTH: usize = 10;
const MEDIA_TYPE: usize = 11;
const MODE: usize = 15;
const MEDIA_LENGTH: usize = 17;
const STATUS_TYPE: usize = 18;
const PHASE_TYPE: usize = 19;
const PHASE_NUMBER: usize = 20;
const NOTIFICATION: usize = 22;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("An I/O error has occurred: {0}")]
    Io(#[from] io::Error),

    #[error("The status response from the printer has the wrong size ({0} instead of 32 bytes).")]
    ShortRead(usize),

    #[error("The printer has not sent a status response in time.")]
    Timeout,
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ErrorFlags: u16 {
        // Error info 1 (LSB)
        const NO_MEDIA = 0b0000_0000_0000_0001;
        const END_OF_MEDIA = 0b0000_0000_0000_0010;
        const CUTTER_JAM = 0b0000_0000_0000_0100;
        const PRINTER_IN_USE = 0b0000_0000_0001_0000;
        const TURNED_OFF = 0b0000_0000_0010_0000;
        const HIGH_VOLTAGE_ADAPTER = 0b0000_0000_0100_0000;
        const FAN_MOTOR_ERROR = 0b0000_0000_1000_0000;

        // Error info 2 (MSB)
        const REPLACE_MEDIA = 0b0000_0001_0000_0000;
        const EXPANSION_BUFFER_FULL = 0b0000_0010_0000_0000;
        const COMMUNICATION_ERROR = 0b0000_0100_0000_0000;
        const COMMUNICATION_BUFFER_FULL = 0b0000_1000_0000_0000;
        const COVER_OPEN = 0b0001_0000_0000_0000;
        const CANCEL_KEY = 0b0010_0000_0000_0000;
        const CANNOT_FEED = 0b0100_0000_0000_0000;
        const SYSTEM_ERROR = 0b1000_0000_0000_0000;
    }
}

const ERROR_NAMES: &[(ErrorFlags, &str)] = &[
    (ErrorFlags::NO_MEDIA, "no media"),
    (ErrorFlags::END_OF_MEDIA, "end of media"),
    (ErrorFlags::CUTTER_JAM, "cutter jam"),
    (ErrorFlags::PRINTER_IN_USE, "printer in use"),
    (ErrorFlags::TURNED_OFF, "printer turned off"),
    (ErrorFlags::HIGH_VOLTAGE_ADAPTER, "high-voltage adapter"),
    (ErrorFlags::FAN_MOTOR_ERROR, "fan motor error"),
    (ErrorFlags::REPLACE_MEDIA, "replace media"),
    (ErrorFlags::EXPANSION_BUFFER_FULL, "expansion buffer full"),
    (ErrorFlags::COMMUNICATION_ERROR, "communication error"),
    (ErrorFlags::COMMUNICATION_BUFFER_FULL, "communication buffer full"),
    (ErrorFlags::COVER_OPEN, "cover open"),
    (ErrorFlags::CANCEL_KEY, "cancel key"),
    (ErrorFlags::CANNOT_FEED, "media cannot be fed"),
    (ErrorFlags::SYSTEM_ERROR, "system error"),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaType {
    NoMedia,
    Continuous,
    DieCut,
    Unknown(u8),
}

impl From<u8> for MediaType {
    fn from(value: u8) -> Self {
        use MediaType::*;

        // The documentation says 'J' and 'K', real printers send 0x0a and 0x0b.
        match value {
            0x00 => NoMedia,
            0x0a | 0x4a => Continuous,
            0x0b | 0x4b => DieCut,
            other => Unknown(other),
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use MediaType::*;

        match self {
            NoMedia => write!(f, "no media"),
            Continuous => write!(f, "continuous length tape"),
            DieCut => write!(f, "die-cut labels"),
            Unknown(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatusType {
    ReplyToRequest,
    PrintingCompleted,
    ErrorOccurred,
    TurnedOff,
    Notification,
    PhaseChange,
    Unknown(u8),
}

impl From<u8> for StatusType {
    fn from(value: u8) -> Self {
        use StatusType::*;

        match value {
            0x00 => ReplyToRequest,
            0x01 => PrintingCompleted,
            0x02 => ErrorOccurred,
            0x04 => TurnedOff,
            0x05 => Notification,
            0x06 => PhaseChange,
            other => Unknown(other),
        }
    }
}

impl Display for StatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use StatusType::*;

        match self {
            ReplyToRequest => write!(f, "reply to status request"),
            PrintingCompleted => write!(f, "printing completed"),
            ErrorOccurred => write!(f, "error occurred"),
            TurnedOff => write!(f, "turned off"),
            Notification => write!(f, "notification"),
            PhaseChange => write!(f, "phase change"),
            Unknown(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Receiving,
    Printing,
    Unknown(u8),
}

impl From<u8> for Phase {
    fn from(value: u8) -> Self {
        use Phase::*;

        match value {
            0x00 => Receiving,
            0x01 => Printing,
            other => Unknown(other),
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Phase::*;

        match self {
            Receiving => write!(f, "receiving state"),
            Printing => write!(f, "printing state"),
            Unknown(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Notification {
    NotAvailable,
    CoolingStarted,
    CoolingFinished,
    Unknown(u8),
}

impl From<u8> for Notification {
    fn from(value: u8) -> Self {
        use Notification::*;

        match value {
            0x00 => NotAvailable,
            0x03 => CoolingStarted,
            0x04 => CoolingFinished,
            other => Unknown(other),
        }
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Notification::*;

        match self {
            NotAvailable => write!(f, "not available"),
            CoolingStarted => write!(f, "cooling (started)"),
            CoolingFinished => write!(f, "cooling (finished)"),
            Unknown(value) => write!(f, "{}", value),
        }
    }
}

/// A status packet as sent by the printer. All fields are views into the raw bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Status([u8; STATUS_SIZE]);

impl From<[u8; STATUS_SIZE]> for Status {
    fn from(value: [u8; STATUS_SIZE]) -> Self {
        Status(value)
    }
}

impl TryFrom<&[u8]> for Status {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        value
            .try_into()
            .map(Status)
            .map_err(|_| Error::ShortRead(value.len()))
    }
}

impl Status {
    pub fn as_bytes(&self) -> &[u8; STATUS_SIZE] {
        &self.0
    }

    pub fn model_code(&self) -> u8 {
        self.0[MODEL_CODE]
    }

    pub fn model(&self) -> Option<Model> {
        Model::try_from(self.model_code()).ok()
    }

    pub fn error_flags(&self) -> ErrorFlags {
        ErrorFlags::from_bits_truncate(u16::from_le_bytes([
            self.0[ERROR_INFO_1],
            self.0[ERROR_INFO_2],
        ]))
    }

    /// Names of all error conditions that are set. Reserved bits are ignored.
    pub fn errors(&self) -> Vec<&'static str> {
        let flags = self.error_flags();

        ERROR_NAMES
            .iter()
            .filter(|(flag, _)| flags.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    pub fn media_width_mm(&self) -> u8 {
        self.0[MEDIA_WIDTH]
    }

    pub fn media_type(&self) -> MediaType {
        MediaType::from(self.0[MEDIA_TYPE])
    }

    pub fn mode(&self) -> u8 {
        self.0[MODE]
    }

    /// Zero for continuous tape.
    pub fn media_length_mm(&self) -> u8 {
        self.0[MEDIA_LENGTH]
    }

    pub fn status_type(&self) -> StatusType {
        StatusType::from(self.0[STATUS_TYPE])
    }

    pub fn phase(&self) -> Phase {
        Phase::from(self.0[PHASE_TYPE])
    }

    pub fn phase_number(&self) -> u16 {
        u16::from_be_bytes([self.0[PHASE_NUMBER], self.0[PHASE_NUMBER + 1]])
    }

    pub fn notification(&self) -> Notification {
        Notification::from(self.0[NOTIFICATION])
    }
}

/// A human-readable dump of the packet, one field per line.
impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.model() {
            Some(model) => writeln!(f, "model: {}", model)?,
            None => writeln!(f, "model: {}", self.model_code())?,
        }

        let flags = self.error_flags();

        for (flag, name) in ERROR_NAMES {
            if flags.contains(*flag) {
                let info = if flag.bits() & 0xff != 0 { 1 } else { 2 };
                writeln!(f, "error {}: {}", info, name)?;
            }
        }

        writeln!(f, "media width: {} mm", self.media_width_mm())?;
        writeln!(f, "media: {}", self.media_type())?;
        writeln!(f, "mode: {}", self.mode())?;
        writeln!(f, "media length: {} mm", self.media_length_mm())?;
        writeln!(f, "status type: {}", self.status_type())?;
        writeln!(f, "phase state: {}", self.phase())?;
        writeln!(f, "phase number: {}", self.phase_number())?;
        writeln!(f, "notification number: {}", self.notification())
    }
}

impl<D: Read + Write> Printer<D> {
    /// Request new status information from the printer.
    /// The printer must be on-line and not currently printing.
    /// On failure, the last status is forgotten.
    pub fn update_status(&mut self) -> Result<Status, Error> {
        if let Err(err) = self.write(command::STATUS_REQUEST) {
            self.last_status = None;
            return Err(err.into());
        }

        self.poll_status(self.print_config.status_timeout)
    }

    /// Wait for the printer to send a status packet.
    /// Reads without data are retried until `timeout` has passed, a read of any other size than
    /// a whole packet is a protocol violation. On failure, the last status is forgotten.
    pub fn poll_status(&mut self, timeout: Duration) -> Result<Status, Error> {
        let result = self.read_status(timeout);

        match &result {
            Ok(status) => {
                self.last_status = Some(*status);

                if let Some(notify) = self.status_notify.as_mut() {
                    notify(status);
                }
            }
            Err(_) => self.last_status = None,
        }

        result
    }

    fn read_status(&mut self, timeout: Duration) -> Result<Status, Error> {
        let start = Instant::now();
        let mut data = [0u8; STATUS_SIZE];

        loop {
            match self.read(&mut data) {
                Ok(0) => {}
                Ok(len) if len < STATUS_SIZE => return Err(Error::ShortRead(len)),
                Ok(_) => {
                    let status = Status::from(data);
                    tracing::trace!(bytes = ?status.as_bytes(), "Received status");

                    return Ok(status);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }

            if start.elapsed() > timeout {
                return Err(Error::Timeout);
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}
