use super::raster::LINE_PINS;

/// Print area geometry of a media type, in 300 dpi pins.
///
/// The margins are approximations, many pins within them will work.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    /// Pins to skip on the right side of the print head before the print area starts
    pub side_margin_pins: u32,

    /// Width of the print area
    pub print_area_pins: u32,

    /// Length of a die-cut label's print area (zero for continuous tape)
    pub print_area_length: u32,
}

impl MediaInfo {
    const fn new(side_margin_pins: u32, print_area_pins: u32, print_area_length: u32) -> Self {
        Self {
            side_margin_pins,
            print_area_pins,
            print_area_length,
        }
    }

    /// Look up the media loaded in the printer by its dimensions.
    /// A length of zero denotes continuous tape. There is no fallback for unlisted sizes.
    pub fn lookup(width_mm: u8, length_mm: u8) -> Option<Self> {
        let info = match (width_mm, length_mm) {
            // Continuous length tape
            (12, 0) => Self::new(29, 106, 0),
            (29, 0) => Self::new(6, 306, 0),
            (38, 0) => Self::new(12, 413, 0),
            (50, 0) => Self::new(12, 554, 0),
            (54, 0) => Self::new(0, 590, 0),
            (62, 0) => Self::new(12, 696, 0),

            // Die-cut labels
            (17, 54) => Self::new(0, 165, 566),
            (17, 87) => Self::new(0, 165, 956),
            (23, 23) => Self::new(42, 236, 202),
            (29, 42) => Self::new(6, 306, 425),
            (29, 90) => Self::new(6, 306, 991),
            (38, 90) => Self::new(12, 413, 991),
            (39, 48) => Self::new(6, 425, 495),
            (52, 29) => Self::new(0, 578, 271),
            (54, 29) => Self::new(59, 602, 271),
            (60, 86) => Self::new(24, 672, 954),
            (62, 29) => Self::new(12, 696, 271),
            (62, 100) => Self::new(12, 696, 1109),

            // Die-cut round labels (length is the diameter)
            (12, 12) => Self::new(113, 94, 94),
            (24, 24) => Self::new(42, 236, 236),
            (58, 58) => Self::new(51, 618, 618),

            _ => return None,
        };

        debug_assert!(info.side_margin_pins + info.print_area_pins <= LINE_PINS as u32);
        Some(info)
    }

    pub fn is_continuous(&self) -> bool {
        self.print_area_length == 0
    }
}
