//! Bounded tail reads for append-only JSONL logs.
//! Only the last `TAIL_WINDOW` bytes are ever touched, so multi-GB logs cost the same as small ones.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};

/// Maximum number of bytes read from the end of a file.
pub const TAIL_WINDOW: u64 = 256 * 1024;

/// Open `path` and return up to `max_lines` of its last complete lines, oldest first.
pub fn tail_lines(path: &Path, max_lines: usize) -> Result<Vec<String>> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    tail_lines_from(&mut file, max_lines).map_err(|e| Error::io(path, e))
}

/// Same as [`tail_lines`] for an already opened file.
pub fn tail_lines_from(file: &mut File, max_lines: usize) -> io::Result<Vec<String>> {
    if max_lines == 0 {
        return Ok(Vec::new());
    }
    let size = file.metadata()?.len();
    let start = size.saturating_sub(TAIL_WINDOW);
    file.seek(SeekFrom::Start(start))?;

    let mut buf = Vec::with_capacity((size - start) as usize);
    file.take(TAIL_WINDOW).read_to_end(&mut buf)?;
    let text = String::from_utf8_lossy(&buf);

    let mut body: &str = &text;
    if start > 0 {
        // Started mid-file: everything up to the first newline is a fragment.
        body = match body.find('\n') {
            Some(idx) => &body[idx + 1..],
            None => "",
        };
    }

    let mut lines: Vec<String> = Vec::new();
    let mut parts = body.split('\n').peekable();
    while let Some(part) = parts.next() {
        let line = part.trim_end_matches('\r');
        if parts.peek().is_none() && line.trim().is_empty() {
            // trailing fragment after the final newline
            break;
        }
        lines.push(line.to_string());
    }

    if lines.len() > max_lines {
        lines.drain(..lines.len() - max_lines);
    }
    Ok(lines)
}
