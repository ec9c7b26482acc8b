//! Hex capture files for replay.
//!
//! One frame per line as 78 hex digits. Whitespace between digits is
//! ignored; blank lines and `#` comments are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use atc_core::frame::{parse_hex_line, FRAME_LEN};

/// Read hex frames from a capture file.
pub struct FrameReader {
    path: PathBuf,
}

impl FrameReader {
    pub fn new(path: &Path) -> Self {
        FrameReader {
            path: path.to_path_buf(),
        }
    }

    /// Read all frames from the file, skipping lines that do not parse.
    pub fn read_all(&self) -> Result<Vec<[u8; FRAME_LEN]>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let (frames, skipped) = parse_capture(&content);
        if skipped > 0 {
            warn!(skipped, file = %self.path.display(), "skipped unparseable lines");
        }
        Ok(frames)
    }
}

/// Parse capture text into frames plus the number of rejected lines.
pub fn parse_capture(content: &str) -> (Vec<[u8; FRAME_LEN]>, usize) {
    let mut frames = Vec::new();
    let mut skipped = 0;
    for (i, line) in content.lines().enumerate() {
        match parse_hex_line(line) {
            None => {}
            Some(Ok(frame)) => frames.push(frame),
            Some(Err(e)) => {
                warn!(line = i + 1, "{e}");
                skipped += 1;
            }
        }
    }
    (frames, skipped)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use atc_core::frame::{encode_frame, frame_to_hex};
    use atc_core::FlightRecord;

    fn frame(flight_id: u32) -> [u8; FRAME_LEN] {
        encode_frame(&FlightRecord {
            flight_id,
            ..FlightRecord::default()
        })
    }

    #[test]
    fn test_parse_capture() {
        let text = format!(
            "# two contacts\n{}\n\n{}  # second\nA5A5A5\n",
            frame_to_hex(&frame(1)),
            frame_to_hex(&frame(2)).to_lowercase()
        );
        let (frames, skipped) = parse_capture(&text);
        assert_eq!(frames, vec![frame(1), frame(2)]);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_read_all_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", frame_to_hex(&frame(3))).unwrap();
        let frames = FrameReader::new(file.path()).read_all().unwrap();
        assert_eq!(frames, vec![frame(3)]);
    }

    #[test]
    fn test_missing_file() {
        let err = FrameReader::new(Path::new("/nonexistent/capture.hex"))
            .read_all()
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/capture.hex"));
    }
}
