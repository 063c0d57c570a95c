use super::{ColorMode, PrintJob, Printer, Status, StatusError, StatusType};

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use image::{GenericImageView, Pixel};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("An I/O error has occurred: {0}")]
    Io(#[from] io::Error),

    #[error("The status response from the printer has the wrong size ({0} instead of 32 bytes).")]
    ShortRead(usize),

    #[error("The printer has not sent a status response in time.")]
    Timeout,

    #[error("There is no current status. Please request one before printing.")]
    NoStatus,

    #[error("Unknown media ({width_mm} mm x {length_mm} mm).")]
    UnknownMedia { width_mm: u8, length_mm: u8 },

    #[error("The printer has reported an error: {}", .0.errors().join(", "))]
    PrinterError(Status),

    #[error("The printer has sent an unexpected status: {0}")]
    UnexpectedStatus(StatusType),
}

impl From<StatusError> for Error {
    fn from(value: StatusError) -> Self {
        match value {
            StatusError::Io(inner) => Error::Io(inner),
            StatusError::ShortRead(len) => Error::ShortRead(len),
            StatusError::Timeout => Error::Timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrintConfig {
    /// Monochrome or red/black printing
    pub color: ColorMode,

    /// How long to wait for the reply to a status request
    pub status_timeout: Duration,

    /// How long to wait for each status packet while printing
    pub poll_timeout: Duration,

    /// Upper bound for the whole print (`None` waits as long as the printer keeps reporting progress)
    pub deadline: Option<Duration>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Monochrome,
            status_timeout: Duration::from_secs(1),
            poll_timeout: Duration::from_secs(10),
            deadline: None,
        }
    }
}

impl<D: Read + Write> Printer<D> {
    pub fn print_config(&mut self) -> &mut PrintConfig {
        &mut self.print_config
    }

    /// Print an image on the media reported by the last status request.
    ///
    /// The status must be fresh: call `update_status()` right before, so that the geometry of the
    /// loaded media is current. Nothing is sent for unknown media. If waiting for the printer
    /// fails, the status is forgotten and has to be requested again.
    pub fn print<I>(&mut self, image: &I) -> Result<(), Error>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let status = self.last_status.ok_or(Error::NoStatus)?;

        let job = PrintJob::build(&status, image, self.print_config.color).ok_or(
            Error::UnknownMedia {
                width_mm: status.media_width_mm(),
                length_mm: status.media_length_mm(),
            },
        )?;

        tracing::info!(
            bytes = job.len(),
            width_mm = status.media_width_mm(),
            length_mm = status.media_length_mm(),
            "Sending print job"
        );

        self.write(job.as_bytes())?;

        // We may receive an error status instead of the transition to the printing phase,
        // or even after it.
        let start = Instant::now();
        let poll_timeout = self.print_config.poll_timeout;
        let deadline = self.print_config.deadline;

        loop {
            let status = self.poll_status(poll_timeout)?;

            match status.status_type() {
                StatusType::PhaseChange => {
                    tracing::debug!(phase = %status.phase(), "Phase change");
                }
                StatusType::PrintingCompleted => {
                    tracing::info!("Printing completed");
                    return Ok(());
                }
                StatusType::ErrorOccurred => return Err(Error::PrinterError(status)),
                other => return Err(Error::UnexpectedStatus(other)),
            }

            if deadline.is_some_and(|deadline| start.elapsed() > deadline) {
                return Err(Error::Timeout);
            }
        }
    }
}
