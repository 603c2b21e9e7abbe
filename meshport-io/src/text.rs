//! Line-oriented helpers shared by the text codecs
//!
//! All text formats handled here treat `#` as the start of a comment, ignore
//! blank lines and accept any mix of spaces, tabs and commas between values.

use meshport_core::{Error, Result};
use std::io::{self, BufRead};
use std::str::FromStr;

/// Reads meaningful lines one at a time, tracking line numbers for errors.
pub(crate) struct Records<'a, R: BufRead + ?Sized> {
    reader: &'a mut R,
    buffer: String,
    number: usize,
}

/// One non-blank line with its comment stripped
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'l> {
    pub number: usize,
    pub text: &'l str,
}

impl<'l> Line<'l> {
    pub fn tokens(&self) -> Vec<&'l str> {
        tokens(self.text).collect()
    }

    /// Build a parse error that names this line
    pub fn error<S: AsRef<str>>(&self, message: S) -> Error {
        Error::Parse(format!("line {}: {}", self.number, message.as_ref()))
    }
}

impl<'a, R: BufRead + ?Sized> Records<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            number: 0,
        }
    }

    /// Number of lines consumed so far
    #[cfg(test)]
    pub fn line_number(&self) -> usize {
        self.number
    }

    /// Next line holding at least one token, or `None` at end of input
    pub fn next_line(&mut self) -> Result<Option<Line<'_>>> {
        loop {
            self.buffer.clear();
            let read = match self.reader.read_line(&mut self.buffer) {
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    return Err(Error::Parse(format!("line {}: {}", self.number + 1, err)));
                }
                Err(err) => return Err(err.into()),
            };
            if read == 0 {
                return Ok(None);
            }
            self.number += 1;
            let content = strip_comment(&self.buffer);
            let start = content.len() - content.trim_start().len();
            let end = content.trim_end().len();
            if start < end && tokens(content).next().is_some() {
                return Ok(Some(Line {
                    number: self.number,
                    text: &self.buffer[start..end],
                }));
            }
        }
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Split a record on runs of whitespace and commas
pub(crate) fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
}

/// Parse one token, naming the line on failure
pub(crate) fn parse_token<T: FromStr>(token: &str, line: usize) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::Parse(format!("line {}: invalid number '{}'", line, token)))
}

/// Parse the first `N` tokens as `f64`
pub(crate) fn parse_floats<const N: usize>(tokens: &[&str], line: usize) -> Result<[f64; N]> {
    if tokens.len() < N {
        return Err(Error::Parse(format!(
            "line {}: expected at least {} values, found {}",
            line,
            N,
            tokens.len()
        )));
    }
    let mut values = [0.0; N];
    for (value, token) in values.iter_mut().zip(tokens) {
        *value = parse_token(token, line)?;
    }
    Ok(values)
}

/// Format a float so that parsing it back yields the same value
pub(crate) fn fmt_f64(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_records_skip_comments_and_blanks() {
        let data = "# header\n\n1 2 3\n  4,5,\t6  # trailing\n\n";
        let mut cursor = Cursor::new(data);
        let mut records = Records::new(&mut cursor);

        let line = records.next_line().unwrap().unwrap();
        assert_eq!((line.number, line.tokens()), (3, vec!["1", "2", "3"]));
        let line = records.next_line().unwrap().unwrap();
        assert_eq!((line.number, line.tokens()), (4, vec!["4", "5", "6"]));
        assert!(records.next_line().unwrap().is_none());
        assert_eq!(records.line_number(), 5);
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let mut cursor = Cursor::new(b"1 2 3\n4 \xff 6\n".to_vec());
        let mut records = Records::new(&mut cursor);
        assert!(records.next_line().unwrap().is_some());
        match records.next_line() {
            Err(Error::Parse(message)) => assert!(message.starts_with("line 2:"), "{}", message),
            other => panic!("expected a parse error, got {:?}", other.map(|line| line.map(|l| l.number))),
        }
    }

    #[test]
    fn test_parse_floats() {
        let values: [f64; 3] = parse_floats(&["1.5", "-2", "3e2", "9"], 1).unwrap();
        assert_eq!(values, [1.5, -2.0, 300.0]);

        assert!(matches!(parse_floats::<3>(&["1", "2"], 7), Err(Error::Parse(_))));
        assert!(matches!(parse_floats::<1>(&["abc"], 7), Err(Error::Parse(_))));
    }

    #[test]
    fn test_float_formatting_is_lossless() {
        for value in [0.1, 1.0 / 3.0, -1e-300, 12345.678901234567, f64::MAX] {
            assert_eq!(fmt_f64(value).parse::<f64>().unwrap(), value);
        }
        assert!(fmt_f64(f64::NAN).parse::<f64>().unwrap().is_nan());
        assert_eq!(fmt_f64(f64::INFINITY).parse::<f64>().unwrap(), f64::INFINITY);
    }
}
