//! Drives a printer session against a scripted device.

use ql_printer::printer::{
    ColorMode, PrintError, Printer, StatusError, StatusErrorFlags, StatusType,
};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;

const STATUS_REQUEST: &[u8] = &[0x1b, 0x69, 0x53];

const REPLY_TO_REQUEST: u8 = 0x00;
const PRINTING_COMPLETED: u8 = 0x01;
const ERROR_OCCURRED: u8 = 0x02;
const TURNED_OFF: u8 = 0x04;
const PHASE_CHANGE: u8 = 0x06;

enum Reply {
    Packet([u8; 32]),
    Nothing,
    Short(usize),
    WouldBlock,
    Interrupted,
    Fail,
}

/// Answers reads from a script and records everything written.
/// Once the script is exhausted, the device stays silent.
struct ScriptedDevice {
    replies: VecDeque<Reply>,
    written: Rc<RefCell<Vec<u8>>>,
}

impl Read for ScriptedDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.replies.pop_front() {
            Some(Reply::Packet(packet)) => {
                buf[..32].copy_from_slice(&packet);
                Ok(32)
            }
            Some(Reply::Short(len)) => Ok(len),
            Some(Reply::WouldBlock) => Err(ErrorKind::WouldBlock.into()),
            Some(Reply::Interrupted) => Err(ErrorKind::Interrupted.into()),
            Some(Reply::Fail) => Err(io::Error::other("device unplugged")),
            Some(Reply::Nothing) | None => Ok(0),
        }
    }
}

impl Write for ScriptedDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn packet(width: u8, length: u8, status_type: u8) -> [u8; 32] {
    let mut data = [0u8; 32];
    data[0] = 0x80;
    data[1] = 0x20;
    data[4] = 0x38;
    data[10] = width;
    data[11] = if length == 0 { 0x0a } else { 0x0b };
    data[17] = length;
    data[18] = status_type;
    data
}

fn session(replies: Vec<Reply>) -> (Printer<ScriptedDevice>, Rc<RefCell<Vec<u8>>>) {
    let written = Rc::new(RefCell::new(Vec::new()));
    let device = ScriptedDevice {
        replies: replies.into(),
        written: Rc::clone(&written),
    };

    let mut printer = Printer::new(device, "Brother", "QL-800");
    printer.print_config().status_timeout = Duration::from_millis(50);
    printer.print_config().poll_timeout = Duration::from_millis(50);

    (printer, written)
}

fn white(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([0xff; 4]))
}

#[test]
fn print_completes_after_phase_changes() {
    let (printer, written) = session(vec![
        Reply::Packet(packet(29, 0, REPLY_TO_REQUEST)),
        Reply::Packet(packet(29, 0, PHASE_CHANGE)),
        Reply::Nothing,
        Reply::Packet(packet(29, 0, PHASE_CHANGE)),
        Reply::Packet(packet(29, 0, PRINTING_COMPLETED)),
    ]);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_by_notify = Rc::clone(&seen);
    let mut printer =
        printer.with_status_notify(move |status| seen_by_notify.borrow_mut().push(status.status_type()));

    let status = printer.update_status().unwrap();
    assert_eq!(status.media_width_mm(), 29);
    assert_eq!(printer.media_info().unwrap().print_area_pins, 306);

    printer.print(&white(306, 20)).unwrap();

    assert_eq!(
        *seen.borrow(),
        [
            StatusType::ReplyToRequest,
            StatusType::PhaseChange,
            StatusType::PhaseChange,
            StatusType::PrintingCompleted,
        ]
    );
    assert_eq!(
        printer.last_status().map(|s| s.status_type()),
        Some(StatusType::PrintingCompleted)
    );

    let written = written.borrow();
    assert_eq!(&written[..3], STATUS_REQUEST);
    assert_eq!(&written[3..7], &[0x1b, 0x69, 0x61, 0x01]);
    assert_eq!(written.last(), Some(&0x1a));
    assert_eq!(written.len(), 3 + 40 + 20 * 93 + 1);
}

#[test]
fn printer_error_is_reported() {
    let mut error = packet(62, 29, ERROR_OCCURRED);
    error[9] = 0x10;

    let (mut printer, _) = session(vec![
        Reply::Packet(packet(62, 29, REPLY_TO_REQUEST)),
        Reply::Packet(packet(62, 29, PHASE_CHANGE)),
        Reply::Packet(error),
    ]);

    printer.update_status().unwrap();

    match printer.print(&white(696, 271)) {
        Err(PrintError::PrinterError(status)) => {
            assert_eq!(status.errors(), ["cover open"]);
            assert_eq!(status.error_flags(), StatusErrorFlags::COVER_OPEN);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    assert_eq!(printer.last_status().unwrap().errors(), ["cover open"]);
}

#[test]
fn silent_printer_times_out() {
    let (mut printer, _) = session(vec![Reply::Packet(packet(29, 90, REPLY_TO_REQUEST))]);

    printer.update_status().unwrap();
    assert!(matches!(
        printer.print(&white(306, 991)),
        Err(PrintError::Timeout)
    ));
}

#[test]
fn failed_print_forgets_the_status() {
    let (mut printer, written) = session(vec![Reply::Packet(packet(29, 0, REPLY_TO_REQUEST))]);

    printer.update_status().unwrap();
    assert!(matches!(
        printer.print(&white(306, 10)),
        Err(PrintError::Timeout)
    ));
    assert!(printer.last_status().is_none());

    // Retrying without a fresh status must not resend the job.
    let sent = written.borrow().len();
    assert!(matches!(
        printer.print(&white(306, 10)),
        Err(PrintError::NoStatus)
    ));
    assert_eq!(written.borrow().len(), sent);
}

#[test]
fn printer_error_keeps_the_status() {
    let (mut printer, _) = session(vec![
        Reply::Packet(packet(29, 0, REPLY_TO_REQUEST)),
        Reply::Packet(packet(29, 0, ERROR_OCCURRED)),
    ]);

    printer.update_status().unwrap();
    assert!(matches!(
        printer.print(&white(306, 10)),
        Err(PrintError::PrinterError(_))
    ));
    assert_eq!(
        printer.last_status().map(|s| s.status_type()),
        Some(StatusType::ErrorOccurred)
    );
}

#[test]
fn would_block_means_no_data_yet() {
    let (mut printer, _) = session(vec![
        Reply::WouldBlock,
        Reply::Nothing,
        Reply::WouldBlock,
        Reply::Packet(packet(62, 100, REPLY_TO_REQUEST)),
    ]);

    let status = printer.update_status().unwrap();
    assert_eq!(status.media_width_mm(), 62);
    assert_eq!(status.media_length_mm(), 100);
}

#[test]
fn interrupted_reads_still_time_out() {
    let mut replies: Vec<_> = (0..1000).map(|_| Reply::Interrupted).collect();
    replies.push(Reply::Packet(packet(29, 0, REPLY_TO_REQUEST)));

    let (mut printer, _) = session(replies);

    assert!(matches!(
        printer.update_status(),
        Err(StatusError::Timeout)
    ));
}

#[test]
fn unknown_media_writes_nothing() {
    let (mut printer, written) = session(vec![Reply::Packet(packet(30, 0, REPLY_TO_REQUEST))]);

    printer.update_status().unwrap();
    assert_eq!(printer.media_info(), None);

    assert!(matches!(
        printer.print(&white(100, 100)),
        Err(PrintError::UnknownMedia {
            width_mm: 30,
            length_mm: 0
        })
    ));

    // Only the status request went out.
    assert_eq!(&written.borrow()[..], STATUS_REQUEST);
}

#[test]
fn print_requires_a_status() {
    let (mut printer, written) = session(vec![]);

    assert!(matches!(
        printer.print(&white(10, 10)),
        Err(PrintError::NoStatus)
    ));
    assert!(written.borrow().is_empty());
}

#[test]
fn unexpected_status_aborts() {
    let (mut printer, _) = session(vec![
        Reply::Packet(packet(29, 0, REPLY_TO_REQUEST)),
        Reply::Packet(packet(29, 0, TURNED_OFF)),
    ]);

    printer.update_status().unwrap();
    assert!(matches!(
        printer.print(&white(306, 10)),
        Err(PrintError::UnexpectedStatus(StatusType::TurnedOff))
    ));
}

#[test]
fn short_read_while_printing() {
    let (mut printer, _) = session(vec![
        Reply::Packet(packet(29, 0, REPLY_TO_REQUEST)),
        Reply::Short(12),
    ]);

    printer.update_status().unwrap();
    assert!(matches!(
        printer.print(&white(306, 10)),
        Err(PrintError::ShortRead(12))
    ));
}

#[test]
fn overall_deadline() {
    let mut replies = vec![Reply::Packet(packet(29, 0, REPLY_TO_REQUEST))];
    replies.extend((0..1000).map(|_| Reply::Packet(packet(29, 0, PHASE_CHANGE))));

    let (mut printer, _) = session(replies);
    printer.print_config().deadline = Some(Duration::ZERO);

    printer.update_status().unwrap();
    assert!(matches!(
        printer.print(&white(306, 10)),
        Err(PrintError::Timeout)
    ));
}

#[test]
fn failed_status_update_forgets_the_status() {
    let (mut printer, _) = session(vec![
        Reply::Packet(packet(29, 0, REPLY_TO_REQUEST)),
        Reply::Short(31),
        Reply::Fail,
    ]);

    printer.update_status().unwrap();
    assert!(printer.last_status().is_some());

    assert!(matches!(
        printer.update_status(),
        Err(StatusError::ShortRead(31))
    ));
    assert!(printer.last_status().is_none());

    assert!(matches!(printer.update_status(), Err(StatusError::Io(_))));

    // Nothing left in the script.
    assert!(matches!(
        printer.update_status(),
        Err(StatusError::Timeout)
    ));
    assert!(printer.media_info().is_none());
}

#[test]
fn initialize_drains_stale_packets() {
    let (mut printer, written) = session(vec![
        Reply::Packet(packet(29, 0, PHASE_CHANGE)),
        Reply::Packet(packet(29, 0, PRINTING_COMPLETED)),
        Reply::Nothing,
        Reply::Packet(packet(62, 100, REPLY_TO_REQUEST)),
    ]);

    printer.initialize().unwrap();

    let status = printer.update_status().unwrap();
    assert_eq!(status.status_type(), StatusType::ReplyToRequest);
    assert_eq!(status.media_length_mm(), 100);

    let written = written.borrow();
    assert_eq!(written.len(), 400 + 2 + 3);
    assert!(written[..400].iter().all(|&b| b == 0));
    assert_eq!(&written[400..402], &[0x1b, 0x40]);
    assert_eq!(&written[402..], STATUS_REQUEST);
}

#[test]
fn initialize_gives_up_on_a_chattering_device() {
    let replies = (0..100).map(|_| Reply::Packet(packet(29, 0, PHASE_CHANGE)));
    let (mut printer, _) = session(replies.collect());

    printer.initialize().unwrap();
    assert!(printer.last_status().is_none());

    // Draining stopped early, the device still has packets queued.
    let status = printer.poll_status(Duration::from_millis(50)).unwrap();
    assert_eq!(status.status_type(), StatusType::PhaseChange);
}

#[test]
fn red_black_job_on_the_wire() {
    let (mut printer, written) = session(vec![
        Reply::Packet(packet(62, 0, REPLY_TO_REQUEST)),
        Reply::Packet(packet(62, 0, PRINTING_COMPLETED)),
    ]);
    printer.print_config().color = ColorMode::RedBlack;

    printer.update_status().unwrap();
    printer.print(&white(696, 5)).unwrap();

    let written = written.borrow();
    assert_eq!(&written[3 + 29..3 + 33], &[0x1b, 0x69, 0x4b, 0x09]);
    assert_eq!(written.len(), 3 + 40 + 2 * 5 * 93 + 1);
}

#[test]
fn closed_session() {
    let (mut printer, _) = session(vec![Reply::Packet(packet(29, 0, REPLY_TO_REQUEST))]);

    printer.close();
    printer.close();
    assert!(printer.is_closed());

    match printer.update_status() {
        Err(StatusError::Io(err)) => assert_eq!(err.kind(), ErrorKind::NotConnected),
        other => panic!("unexpected result: {:?}", other),
    }
}
