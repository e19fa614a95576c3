use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// How many leading bytes are inspected when classifying a file.
pub const SNIFF_LEN: usize = 512;

/// Lower-cased extension without the dot, if the name has one.
///
/// Dotfiles such as `.env` and names ending in a bare `.` have none.
pub fn file_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Decides whether a leading chunk of a file looks binary.
///
/// `window_full` tells whether the chunk was cut at the sniff limit, in which
/// case a multi-byte sequence split by the cut is not held against it.
pub fn looks_binary(chunk: &[u8], window_full: bool) -> bool {
    if chunk.contains(&0) {
        return true;
    }
    match std::str::from_utf8(chunk) {
        Ok(_) => false,
        Err(e) => !(window_full && e.error_len().is_none()),
    }
}

/// Reads up to [`SNIFF_LEN`] bytes and classifies the file.
pub fn is_binary(path: &Path) -> io::Result<bool> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut buf)?;

    if buf.is_empty() {
        return Ok(false);
    }
    Ok(looks_binary(&buf, buf.len() == SNIFF_LEN))
}
