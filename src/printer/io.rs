use super::Printer;

use std::io::{self, ErrorKind, Read, Write};

impl<D: Read + Write> Printer<D> {
    fn device(&mut self) -> io::Result<&mut D> {
        self.device
            .as_mut()
            .ok_or_else(|| io::Error::new(ErrorKind::NotConnected, "the printer has been closed"))
    }

    /// Read whatever the printer has sent. `Ok(0)` means that there is nothing yet.
    pub(super) fn read(&mut self, data: &mut [u8]) -> io::Result<usize> {
        match self.device()?.read(data) {
            // Non-blocking handles report the same condition differently.
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(0),
            other => other,
        }
    }

    pub(super) fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let device = self.device()?;

        device.write_all(data)?;
        device.flush()
    }
}
