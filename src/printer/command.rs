//! Every byte sequence the driver sends to the printer.

/// Number of zero bytes that flush a partially received job out of the printer's buffer.
pub const CLEAR_LEN: usize = 400;

/// `ESC @`
pub const INITIALIZE: &[u8] = &[0x1b, 0x40];

/// `ESC i S`
pub const STATUS_REQUEST: &[u8] = &[0x1b, 0x69, 0x53];

/// `ESC i a 0x01`: raster mode, the only one some models support.
pub const RASTER_MODE: &[u8] = &[0x1b, 0x69, 0x61, 0x01];

/// `ESC i ! 0x00`: automatic status notification (the default anyway).
pub const AUTO_STATUS: &[u8] = &[0x1b, 0x69, 0x21, 0x00];

/// `ESC i z`, followed by flags, media type, width, length, 4 bytes of raster line count and 2 reserved bytes.
pub const PRINT_INFO: &[u8] = &[0x1b, 0x69, 0x7a];

/// `ESC i M`, followed by the mode flags.
pub const MODE: &[u8] = &[0x1b, 0x69, 0x4d];

/// `ESC i A 0x01`: cut after every label.
pub const CUT_EACH_LABEL: &[u8] = &[0x1b, 0x69, 0x41, 0x01];

/// `ESC i K`, followed by the expanded mode flags.
pub const EXPANDED_MODE: &[u8] = &[0x1b, 0x69, 0x4b];

/// `ESC i d`, followed by the feed margin in pins (16-bit little-endian).
pub const FEED_MARGIN: &[u8] = &[0x1b, 0x69, 0x64];

/// `M 0x00`: no compression.
pub const NO_COMPRESSION: &[u8] = &[0x4d, 0x00];

/// Raster line of a single-color job: `g 0x00 <count> <data>`.
pub const RASTER_LINE: [u8; 2] = [0x67, 0x00];

/// Black plane of a two-color job: `w 0x01 <count> <data>`.
pub const RASTER_LINE_BLACK: [u8; 2] = [0x77, 0x01];

/// Red plane of a two-color job: `w 0x02 <count> <data>`.
pub const RASTER_LINE_RED: [u8; 2] = [0x77, 0x02];

/// `SUB`: print and feed.
pub const PRINT_AND_FEED: u8 = 0x1a;

/// Media type byte of the print information command for continuous tape.
pub const MEDIA_CONTINUOUS: u8 = 0x0a;

/// Media type byte of the print information command for die-cut labels.
pub const MEDIA_DIE_CUT: u8 = 0x0b;

/// Minimum feed margin for die-cut labels (35 pins, about 3 mm).
pub const DIE_CUT_FEED_MARGIN: u16 = 35;
