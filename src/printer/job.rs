use super::{command, raster, ColorMode, MediaInfo, Status};

use image::{GenericImageView, Pixel};

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    struct PrintInfoFlags: u8 {
        const VALIDATE_KIND = 0b0000_0010;
        const VALIDATE_WIDTH = 0b0000_0100;
        const PREFER_QUALITY = 0b0100_0000;
        const RECOVER = 0b1000_0000;
    }

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    struct PrintModeFlags: u8 {
        const AUTO_CUT = 0b0100_0000;
    }

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    struct ExpandedPrintModeFlags: u8 {
        const TWO_COLOR = 0b0000_0001;
        const CUT_AT_END = 0b0000_1000;
    }
}

/// The complete byte stream for printing one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    data: Vec<u8>,
}

impl PrintJob {
    /// Build the job for the media described by `status`.
    /// Returns `None` if the media is unknown: there is no sensible way to print on it.
    pub fn build<I>(status: &Status, image: &I, mode: ColorMode) -> Option<Self>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let media = MediaInfo::lookup(status.media_width_mm(), status.media_length_mm())?;
        Some(Self::new(status, &media, image, mode))
    }

    /// Build the job for `media`, which has to match the dimensions reported in `status`.
    pub fn new<I>(status: &Status, media: &MediaInfo, image: &I, mode: ColorMode) -> Self
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let die_cut = status.media_length_mm() != 0;

        // Die-cut labels always get their full length, tape is as long as the image.
        let lines = if media.print_area_length != 0 {
            media.print_area_length
        } else {
            image.height()
        };

        let mut data = Vec::new();

        data.extend_from_slice(command::RASTER_MODE);
        data.extend_from_slice(command::AUTO_STATUS);

        // Provide the print info.
        let print_info_flags = PrintInfoFlags::VALIDATE_KIND
            | PrintInfoFlags::VALIDATE_WIDTH
            | PrintInfoFlags::PREFER_QUALITY
            | PrintInfoFlags::RECOVER;

        let media_type = if die_cut {
            command::MEDIA_DIE_CUT
        } else {
            command::MEDIA_CONTINUOUS
        };

        data.extend_from_slice(command::PRINT_INFO);
        data.extend_from_slice(&[
            print_info_flags.bits(),
            media_type,
            status.media_width_mm(),
            status.media_length_mm(),
        ]);
        data.extend_from_slice(&lines.to_le_bytes());
        data.extend_from_slice(&[
            0x00, // Starting page (we only print one at a time).
            0x00, // Reserved
        ]);

        // Cut after every label.
        data.extend_from_slice(command::MODE);
        data.push(PrintModeFlags::AUTO_CUT.bits());
        data.extend_from_slice(command::CUT_EACH_LABEL);

        let mut expanded_mode_flags = ExpandedPrintModeFlags::CUT_AT_END;

        if mode == ColorMode::RedBlack {
            expanded_mode_flags |= ExpandedPrintModeFlags::TWO_COLOR;
        }

        data.extend_from_slice(command::EXPANDED_MODE);
        data.push(expanded_mode_flags.bits());

        // Continuous tape must not have any feed margin.
        let feed_margin: u16 = if die_cut {
            command::DIE_CUT_FEED_MARGIN
        } else {
            0
        };

        data.extend_from_slice(command::FEED_MARGIN);
        data.extend_from_slice(&feed_margin.to_le_bytes());

        data.extend_from_slice(command::NO_COMPRESSION);
        data.extend(raster::encode(image, media.side_margin_pins, lines, mode));

        // Commit the print with feeding.
        data.push(command::PRINT_AND_FEED);

        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::printer::{StatusType, LINE_BYTES};
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    const HEADER_LEN: usize = 4 + 4 + 13 + 4 + 4 + 4 + 5 + 2;
    const LINE_LEN: usize = 3 + LINE_BYTES;

    fn status(width: u8, length: u8) -> Status {
        let mut data = [0u8; 32];
        data[10] = width;
        data[11] = if length == 0 { 0x0a } else { 0x0b };
        data[17] = length;
        Status::from(data)
    }

    #[test]
    fn die_cut_job() {
        let status = status(29, 90);
        assert_eq!(status.status_type(), StatusType::ReplyToRequest);

        let image = RgbaImage::from_pixel(306, 100, Rgba([0xff; 4]));
        let job = PrintJob::build(&status, &image, ColorMode::Monochrome).unwrap();
        let data = job.as_bytes();

        assert_eq!(
            &data[..HEADER_LEN],
            &[
                0x1b, 0x69, 0x61, 0x01, // raster mode
                0x1b, 0x69, 0x21, 0x00, // automatic status
                0x1b, 0x69, 0x7a, 0xc6, 0x0b, 29, 90, 0xdf, 0x03, 0x00, 0x00, 0x00, 0x00,
                0x1b, 0x69, 0x4d, 0x40, // auto cut
                0x1b, 0x69, 0x41, 0x01, // every label
                0x1b, 0x69, 0x4b, 0x08, // cut at end
                0x1b, 0x69, 0x64, 0x23, 0x00, // feed margin
                0x4d, 0x00, // no compression
            ][..]
        );

        // 991 lines regardless of the image height.
        assert_eq!(job.len(), HEADER_LEN + 991 * LINE_LEN + 1);
        assert_eq!(data[HEADER_LEN], b'g');
        assert_eq!(data.last(), Some(&0x1a));
    }

    #[test]
    fn continuous_job() {
        let status = status(62, 0);
        let image = RgbaImage::from_pixel(696, 300, Rgba([0, 0, 0, 0xff]));
        let job = PrintJob::build(&status, &image, ColorMode::Monochrome).unwrap();
        let data = job.as_bytes();

        assert_eq!(
            &data[8..21],
            &[0x1b, 0x69, 0x7a, 0xc6, 0x0a, 62, 0, 0x2c, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(&data[33..38], &[0x1b, 0x69, 0x64, 0x00, 0x00]);
        assert_eq!(job.len(), HEADER_LEN + 300 * LINE_LEN + 1);

        // Side margin of 12 pins, then 696 black ones and 12 unused.
        let line = &data[HEADER_LEN + 3..HEADER_LEN + LINE_LEN];
        assert_eq!(line[0], 0x00);
        assert_eq!(line[1], 0x0f);
        assert!(line[2..88].iter().all(|&b| b == 0xff));
        assert_eq!(line[88], 0xf0);
        assert_eq!(line[89], 0x00);
    }

    #[test]
    fn red_black_job() {
        let status = status(62, 0);
        let image = RgbaImage::from_pixel(696, 10, Rgba([0xff, 0, 0, 0xff]));
        let job = PrintJob::build(&status, &image, ColorMode::RedBlack).unwrap();
        let data = job.as_bytes();

        assert_eq!(&data[29..33], &[0x1b, 0x69, 0x4b, 0x09]);
        assert_eq!(job.len(), HEADER_LEN + 2 * 10 * LINE_LEN + 1);
        assert_eq!(&data[HEADER_LEN..HEADER_LEN + 3], &[b'w', 0x01, 90]);
        assert_eq!(
            &data[HEADER_LEN + LINE_LEN..HEADER_LEN + LINE_LEN + 3],
            &[b'w', 0x02, 90]
        );
    }

    #[test]
    fn unknown_media_has_no_job() {
        let image = RgbaImage::new(10, 10);

        assert_eq!(PrintJob::build(&status(30, 0), &image, ColorMode::Monochrome), None);
        assert_eq!(PrintJob::build(&status(0, 0), &image, ColorMode::Monochrome), None);
    }
}
