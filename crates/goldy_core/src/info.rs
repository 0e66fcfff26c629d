//! Version and display information for Goldy Bot.

use owo_colors::OwoColorize;

/// Just the version number, e.g. `5.0`.
pub const VER: &str = "5.0";

/// Release stage and its iteration, e.g. `("dev", 1)`.
pub const STAGE: (&str, u32) = ("dev", 1);

/// Goldy Bot version string, e.g. `5.0dev1`.
pub const VERSION: &str = "5.0dev1";

/// Display name of Goldy Bot with its version, e.g. `Goldy Bot (v5.0dev1)`.
pub const DISPLAY_NAME: &str = "Goldy Bot (v5.0dev1)";

pub const COPYRIGHT: &str = "Copyright (C) 2023 - Goldy";

/// Line printed when Goldy Bot boots.
pub fn boot_banner() -> String {
    format!(
        " {} {} ({}) - {}\n",
        "Goldy".yellow(),
        "Bot".truecolor(255, 165, 0),
        VERSION.blue(),
        COPYRIGHT.dimmed()
    )
}
