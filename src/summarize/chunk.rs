//! Overlapping character windows over a transcript

use crate::{Error, Result};

/// Split `text` into windows of at most `size` characters, each sharing
/// `overlap` characters with its predecessor
///
/// Text no longer than `size` comes back as a single window. Lengths are
/// counted in characters, and every window starts and ends on a character
/// boundary.
///
/// # Errors
///
/// Returns [`Error::InvalidConfiguration`] when `size` is zero or
/// `overlap >= size`, since the window would never advance
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    if size == 0 {
        return Err(Error::InvalidConfiguration(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    if overlap >= size {
        return Err(Error::InvalidConfiguration(format!(
            "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
        )));
    }

    // Byte offset of every char start, plus the end of the string
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = offsets.len() - 1;

    if char_len <= size {
        return Ok(vec![text.to_string()]);
    }

    let step = size - overlap;
    let mut chunks = Vec::with_capacity(char_len.div_ceil(step));
    let mut start = 0;

    loop {
        let end = (start + size).min(char_len);
        chunks.push(text[offsets[start]..offsets[end]].to_string());

        if end >= char_len {
            break;
        }
        start += step;
    }

    Ok(chunks)
}
