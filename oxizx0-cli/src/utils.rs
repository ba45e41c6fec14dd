//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Output name for compression: the input name with `.zx0` appended.
pub fn compressed_name(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".zx0");
    PathBuf::from(name)
}

/// Output name for decompression: the input name without its `.zx0`
/// extension, or `None` when the input does not carry one.
pub fn decompressed_name(input: &Path) -> Option<PathBuf> {
    if input.extension() == Some(OsStr::new("zx0")) {
        Some(input.with_extension(""))
    } else {
        None
    }
}
