use ql_printer::printer::{ColorMode, MediaInfo, Printer};

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use image::imageops::FilterType;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Query and print on Brother QL label printers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the printer status and the loaded media
    Info,

    /// Print an image on the loaded media
    Print {
        /// The image file
        image: PathBuf,

        /// Integer upscaling
        #[arg(long, default_value_t = 1)]
        scale: u32,

        /// Print sideways
        #[arg(long)]
        rotate: bool,

        /// Print red pixels too (requires two-color tape)
        #[arg(long)]
        red_black: bool,

        /// Give up waiting for the printer after this many seconds
        #[arg(long)]
        deadline: Option<u64>,
    },
}

fn open() -> Result<Printer, Box<dyn Error>> {
    let mut printer = Printer::discover()?.ok_or("no suitable printer found")?;
    printer.initialize()?;

    Ok(printer)
}

fn info() -> Result<(), Box<dyn Error>> {
    let mut printer = open()?;

    println!(
        "{}",
        format!("{} {}", printer.manufacturer(), printer.model()).bold()
    );

    // A printer that doesn't answer is worth a message, not a failure.
    let status = match printer.update_status() {
        Ok(status) => status,
        Err(err) => {
            println!("status unavailable: {}", err);
            return Ok(());
        }
    };

    print!("{}", status);

    println!("{}", "Media information".bold());

    match MediaInfo::lookup(status.media_width_mm(), status.media_length_mm()) {
        Some(info) => {
            println!("side margin pins: {}", info.side_margin_pins);
            println!("print area pins: {}", info.print_area_pins);
            println!("print area length: {}", info.print_area_length);
        }
        None => println!("unknown media"),
    }

    printer.close();
    Ok(())
}

fn print(
    path: PathBuf,
    scale: u32,
    rotate: bool,
    red_black: bool,
    deadline: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    // Load and eventually transform the picture.
    let mut image = image::open(path)?;

    if scale > 1 {
        image = image.resize_exact(
            image.width() * scale,
            image.height() * scale,
            FilterType::Nearest,
        );
    }

    if rotate {
        image = image.rotate270();
    }

    let image = image.to_rgba8();

    let mut printer =
        open()?.with_status_notify(|status| tracing::debug!("Status update\n{}", status));

    let config = printer.print_config();
    config.color = if red_black {
        ColorMode::RedBlack
    } else {
        ColorMode::Monochrome
    };
    config.deadline = deadline.map(Duration::from_secs);

    printer.update_status()?;

    // Check the picture against the media in the printer.
    let media = printer.media_info().ok_or("unknown media")?;

    if image.width() > media.print_area_pins {
        return Err(format!(
            "the image is too wide, {} > {} pt",
            image.width(),
            media.print_area_pins
        )
        .into());
    }

    if media.print_area_length != 0 && image.height() > media.print_area_length {
        return Err(format!(
            "the image is too high, {} > {} pt",
            image.height(),
            media.print_area_length
        )
        .into());
    }

    printer.print(&image)?;
    printer.close();

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Info => info(),
        Command::Print {
            image,
            scale,
            rotate,
            red_black,
            deadline,
        } => print(image, scale, rotate, red_black, deadline),
    }
}
