#[macro_use]
extern crate bitflags;

/// Connect to a Brother QL label printer through the Linux `usblp` driver and print bitmaps with it.
pub mod printer;
