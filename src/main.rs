//! # media-rename CLI
//!
//! Command-line interface for the media renamer.
//!
//! ## Usage
//! ```bash
//! media-rename preview ~/Pictures/Trip --prefix trip_
//! media-rename rename ~/Pictures/Trip --prefix trip_ --digits 4
//! media-rename watch ~/Downloads/Camera --pattern "IMG_*.jpg"
//! ```

mod cli;

use media_renamer::Result;

fn main() -> Result<()> {
    cli::run()
}
