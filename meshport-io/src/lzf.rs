//! LZF block compression, as used by `DATA binary_compressed` PCD files
//!
//! A stream is a sequence of chunks introduced by a control byte:
//! `000LLLLL` starts a run of `L + 1` literal bytes, any other value is a
//! back reference `LLLOOOOO [LLLLLLLL] OOOOOOOO` copying `len + 2` bytes from
//! `offset + 1` bytes behind the output cursor.

use meshport_core::{Error, Result};

const HASH_LOG: u32 = 14;
const MAX_LITERAL: usize = 1 << 5;
const MAX_OFFSET: usize = 1 << 13;
const MAX_MATCH: usize = (1 << 8) + (1 << 3);

fn hash(bytes: &[u8]) -> usize {
    let v = u32::from(bytes[0]) << 16 | u32::from(bytes[1]) << 8 | u32::from(bytes[2]);
    (v.wrapping_mul(0x9E37_79B1) >> (32 - HASH_LOG)) as usize
}

fn push_literals(out: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_LITERAL) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
}

/// Compress `input`. The output is never empty unless `input` is.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / MAX_LITERAL + 1);
    let mut table = vec![usize::MAX; 1 << HASH_LOG];
    let mut literal_start = 0;
    let mut i = 0;

    while i + 2 < input.len() {
        let slot = hash(&input[i..]);
        let candidate = table[slot];
        table[slot] = i;

        let is_match = candidate != usize::MAX
            && i - candidate <= MAX_OFFSET
            && input[candidate..candidate + 3] == input[i..i + 3];
        if !is_match {
            i += 1;
            continue;
        }

        let limit = (input.len() - i).min(MAX_MATCH);
        let mut len = 3;
        while len < limit && input[candidate + len] == input[i + len] {
            len += 1;
        }

        push_literals(&mut out, &input[literal_start..i]);
        let offset = i - candidate - 1;
        let code = len - 2;
        if code < 7 {
            out.push(((code << 5) | (offset >> 8)) as u8);
        } else {
            out.push(((7 << 5) | (offset >> 8)) as u8);
            out.push((code - 7) as u8);
        }
        out.push((offset & 0xff) as u8);

        i += len;
        literal_start = i;
    }

    push_literals(&mut out, &input[literal_start..]);
    out
}

/// Decompress `input`, which must expand to exactly `expected_len` bytes.
pub fn decompress(input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let corrupt = |what: &str| Error::Parse(format!("corrupt LZF data: {}", what));

    // A back reference expands three input bytes into at most 264 output bytes.
    let mut out = Vec::with_capacity(expected_len.min(input.len().saturating_mul(MAX_MATCH)));
    let mut i = 0;

    while i < input.len() {
        let ctrl = input[i] as usize;
        i += 1;

        if ctrl < MAX_LITERAL {
            let len = ctrl + 1;
            let literals = input
                .get(i..i + len)
                .ok_or_else(|| corrupt("literal run past end of input"))?;
            if out.len() + len > expected_len {
                return Err(corrupt("output exceeds declared size"));
            }
            out.extend_from_slice(literals);
            i += len;
            continue;
        }

        let mut len = ctrl >> 5;
        if len == 7 {
            len += *input.get(i).ok_or_else(|| corrupt("truncated match length"))? as usize;
            i += 1;
        }
        len += 2;
        let low = *input.get(i).ok_or_else(|| corrupt("truncated match offset"))? as usize;
        i += 1;

        let offset = ((ctrl & 0x1f) << 8) + low + 1;
        if offset > out.len() {
            return Err(corrupt("back reference before start of output"));
        }
        if out.len() + len > expected_len {
            return Err(corrupt("output exceeds declared size"));
        }
        // Source and destination may overlap, so copy byte by byte.
        let start = out.len() - offset;
        for k in 0..len {
            let byte = out[start + k];
            out.push(byte);
        }
    }

    if out.len() != expected_len {
        return Err(corrupt(&format!(
            "expanded to {} bytes, expected {}",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repetitive_data_shrinks() {
        let input: Vec<u8> = b"meshport ".iter().copied().cycle().take(4096).collect();
        let packed = compress(&input);
        assert!(packed.len() < input.len() / 10);
        assert_eq!(decompress(&packed, input.len()).unwrap(), input);
    }

    #[test]
    fn test_incompressible_data_survives() {
        let mut state = 0x2545_f491u32;
        let input: Vec<u8> = (0..10_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();
        assert_eq!(decompress(&compress(&input), input.len()).unwrap(), input);
    }

    #[test]
    fn test_long_runs_and_short_inputs() {
        for input in [vec![], vec![7u8], vec![1, 2], vec![0u8; 1000], vec![9u8; 70_000]] {
            assert_eq!(decompress(&compress(&input), input.len()).unwrap(), input);
        }
    }

    #[test]
    fn test_known_stream() {
        // "abc" literal, then a back reference of 6 bytes at offset 3
        let stream = [2, b'a', b'b', b'c', 4 << 5, 2];
        assert_eq!(decompress(&stream, 9).unwrap(), b"abcabcabc");
    }

    #[test]
    fn test_corrupt_streams_are_rejected() {
        assert!(matches!(decompress(&[5, 1, 2], 6), Err(Error::Parse(_))));
        assert!(matches!(decompress(&[1 << 5, 0], 3), Err(Error::Parse(_))));
        assert!(matches!(decompress(&[0, 1], 2), Err(Error::Parse(_))));
        assert!(matches!(decompress(&[1, 1, 2], 1), Err(Error::Parse(_))));
    }
}
