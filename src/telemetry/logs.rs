//! Native `tail -n` over the traffic log.
//!
//! Reads fixed-size blocks backwards from the end of the file until enough
//! complete lines are buffered, so cost follows the tail size rather than
//! the file size.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

const BLOCK_SIZE: u64 = 8 * 1024;

/// Last `lines` non-empty lines of the file at `path`, oldest first.
pub fn tail(path: &Path, lines: usize) -> io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    tail_reader(&mut file, lines, BLOCK_SIZE)
}

pub(crate) fn tail_reader<R: Read + Seek>(
    reader: &mut R,
    lines: usize,
    block_size: u64,
) -> io::Result<Vec<String>> {
    if lines == 0 {
        return Ok(Vec::new());
    }

    let len = reader.seek(SeekFrom::End(0))?;
    let mut pos = len;
    let mut buf: Vec<u8> = Vec::new();

    while pos > 0 {
        let step = block_size.min(pos);
        pos -= step;
        reader.seek(SeekFrom::Start(pos))?;
        let mut block = vec![0u8; step as usize];
        reader.read_exact(&mut block)?;
        block.extend_from_slice(&buf);
        buf = block;

        // The first segment may be a partial line unless we reached offset 0.
        let complete = buf
            .split(|&b| b == b'\n')
            .skip(1)
            .filter(|segment| !is_blank(segment))
            .count();
        if complete >= lines {
            break;
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let mut segments: Vec<&str> = text.split('\n').collect();
    if pos > 0 && !segments.is_empty() {
        segments.remove(0);
    }

    let mut window: VecDeque<String> = VecDeque::with_capacity(lines);
    for segment in segments {
        let line = segment.strip_suffix('\r').unwrap_or(segment);
        if line.is_empty() {
            continue;
        }
        if window.len() == lines {
            window.pop_front();
        }
        window.push_back(line.to_string());
    }
    Ok(window.into())
}

fn is_blank(segment: &[u8]) -> bool {
    segment.is_empty() || segment == b"\r"
}
