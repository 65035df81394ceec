//! Splits a byte stream into tokenized logical lines.
use std::io::{self, BufRead, BufReader, Read};

/// Size of the chunks pulled from the underlying reader.
const CHUNK_SIZE: usize = 8 * 1024;

/// One logical line: all tokens of a statement.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Line {
  /// Number of the first physical line this logical line was built from.
  pub(crate) number: usize,
  pub(crate) tokens: Vec<String>,
  /// The line was longer than the configured limit; `tokens` only covers the
  /// part that fit.
  pub(crate) overlong: bool,
}

impl Line {
  pub(crate) fn keyword(&self) -> &str {
    &self.tokens[0]
  }

  pub(crate) fn args(&self) -> &[String] {
    &self.tokens[1..]
  }

  /// Everything after the keyword, as written but with whitespace runs
  /// collapsed to single spaces.
  pub(crate) fn rest(&self) -> String {
    self.args().join(" ")
  }
}

/// What `read_physical` saw of one physical line.
struct Physical {
  /// Bytes had to be discarded to stay within the limit.
  overflow: bool,
  /// The line ended in a backslash.
  continued: bool,
}

/// Streams logical lines out of a reader, never holding more than one
/// (bounded) logical line in memory.
pub(crate) struct LineReader<R> {
  reader: BufReader<R>,
  max_line_length: usize,
  physical_line: usize,
  logical: Vec<u8>,
  done: bool,
}

impl<R: Read> LineReader<R> {
  pub(crate) fn new(reader: R, max_line_length: usize) -> LineReader<R> {
    LineReader {
      reader: BufReader::with_capacity(CHUNK_SIZE, reader),
      max_line_length,
      physical_line: 0,
      logical: Vec::new(),
      done: false,
    }
  }

  /// Number of physical lines read so far.
  pub(crate) fn physical_line(&self) -> usize {
    self.physical_line
  }

  /// Appends the next physical line to `out`, without its terminator or a
  /// continuation backslash, storing at most `limit` bytes in total. Returns
  /// `None` at end of input.
  fn read_physical(&mut self, out: &mut Vec<u8>, limit: usize) -> io::Result<Option<Physical>> {
    let start = out.len();
    let room = limit.saturating_sub(start);
    let mut read_any = false;
    let mut seen = 0;
    // The last two bytes of the line, including any that did not fit.
    let mut tail = [0u8; 2];

    loop {
      let (consumed, found_newline) = {
        let chunk = match self.reader.fill_buf() {
          Ok(chunk) => chunk,
          Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
          Err(e) => return Err(e),
        };
        if chunk.is_empty() {
          break;
        }
        read_any = true;

        let (piece, consumed, found_newline) = match chunk.iter().position(|&b| b == b'\n') {
          Some(i) => (&chunk[..i], i + 1, true),
          None => (chunk, chunk.len(), false),
        };

        match piece {
          [] => {}
          [b] => tail = [tail[1], *b],
          [.., a, b] => tail = [*a, *b],
        }
        seen += piece.len();

        let free = room.saturating_sub(out.len() - start);
        out.extend_from_slice(&piece[..piece.len().min(free)]);
        (consumed, found_newline)
      };

      self.reader.consume(consumed);
      if found_newline {
        break;
      }
    }

    if !read_any {
      return Ok(None);
    }
    self.physical_line += 1;

    let cr = seen > 0 && tail[1] == b'\r';
    let last = if cr { tail[0] } else { tail[1] };
    let continued = seen > usize::from(cr) && last == b'\\';

    let content = seen - usize::from(cr) - usize::from(continued);
    out.truncate(start + content);
    Ok(Some(Physical {
      overflow: content > room,
      continued,
    }))
  }

  fn read_logical(&mut self) -> io::Result<Option<Line>> {
    loop {
      let mut logical = std::mem::take(&mut self.logical);
      logical.clear();
      let mut number = None;
      let mut overlong = false;

      loop {
        let start = logical.len();
        // Once a line is overlong its continuations are consumed but dropped.
        // Otherwise one spare byte, so that stripping a comment decides
        // whether a line right at the limit is too long.
        let limit = if overlong {
          start
        } else {
          self.max_line_length.saturating_add(1)
        };
        let physical = match self.read_physical(&mut logical, limit)? {
          Some(physical) => physical,
          None => break,
        };
        number.get_or_insert(self.physical_line);

        if !overlong {
          strip_comment(&mut logical, start);
          if physical.overflow || logical.len() > self.max_line_length {
            overlong = true;
            logical.truncate(self.max_line_length);
          }
        }
        if !physical.continued {
          break;
        }
      }

      let number = match number {
        Some(number) => number,
        None => {
          self.logical = logical;
          return Ok(None);
        }
      };

      let tokens: Vec<String> = String::from_utf8_lossy(&logical)
        .split(|c: char| c == ' ' || c == '\t')
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();
      self.logical = logical;

      if tokens.is_empty() && !overlong {
        continue;
      }

      return Ok(Some(Line {
        number,
        tokens,
        overlong,
      }));
    }
  }
}

/// Drops a comment from the physical line stored at `line[start..]`. A comment
/// starts at a `#` that begins a token.
fn strip_comment(line: &mut Vec<u8>, start: usize) {
  let mut at_token_start = start == 0 || matches!(line[start - 1], b' ' | b'\t');
  for i in start..line.len() {
    match line[i] {
      b' ' | b'\t' => at_token_start = true,
      b'#' if at_token_start => {
        line.truncate(i);
        return;
      }
      _ => at_token_start = false,
    }
  }
}

impl<R: Read> Iterator for LineReader<R> {
  type Item = io::Result<Line>;

  fn next(&mut self) -> Option<io::Result<Line>> {
    if self.done {
      return None;
    }
    match self.read_logical() {
      Ok(Some(line)) => Some(Ok(line)),
      Ok(None) => {
        self.done = true;
        None
      }
      Err(e) => {
        self.done = true;
        Some(Err(e))
      }
    }
  }
}

#[cfg(test)]
fn lines(input: &str) -> Vec<(usize, Vec<String>)> {
  LineReader::new(input.as_bytes(), 64 * 1024)
    .map(|l| l.unwrap())
    .map(|l| (l.number, l.tokens))
    .collect()
}

#[cfg(test)]
fn toks(xs: &[&str]) -> Vec<String> {
  xs.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_tokens_and_line_numbers() {
  let got = lines("v 1 2 3\n\n  \t\nvt\t0.5  0.25\n");
  assert_eq!(
    got,
    vec![
      (1, toks(&["v", "1", "2", "3"])),
      (4, toks(&["vt", "0.5", "0.25"])),
    ]
  );
}

#[test]
fn test_comments() {
  let got = lines("# header\nv 1 2 3 # trailing\nusemtl a#b\n   # indented\n");
  assert_eq!(
    got,
    vec![
      (2, toks(&["v", "1", "2", "3"])),
      (3, toks(&["usemtl", "a#b"])),
    ]
  );
}

#[test]
fn test_crlf_and_missing_final_newline() {
  let got = lines("v 1 2 3\r\nf 1 2 3");
  assert_eq!(
    got,
    vec![(1, toks(&["v", "1", "2", "3"])), (2, toks(&["f", "1", "2", "3"]))]
  );
}

#[test]
fn test_continuation() {
  let got = lines("f 1 2 \\\n  3 4\nv 0 0 0\n");
  assert_eq!(
    got,
    vec![
      (1, toks(&["f", "1", "2", "3", "4"])),
      (3, toks(&["v", "0", "0", "0"])),
    ]
  );
}

#[test]
fn test_continuation_through_comment() {
  let got = lines("f 1 2 # corners \\\n3\r\n");
  assert_eq!(got, vec![(1, toks(&["f", "1", "2", "3"]))]);
}

#[test]
fn test_continuation_at_eof() {
  let got = lines("g a \\");
  assert_eq!(got, vec![(1, toks(&["g", "a"]))]);
}

#[test]
fn test_continuation_joins_tokens() {
  // A `#` carried onto the next line is still inside the token.
  let got = lines("usemtl ab\\\n#c\nusemtl ab \\\n#c\n");
  assert_eq!(
    got,
    vec![(1, toks(&["usemtl", "ab#c"])), (3, toks(&["usemtl", "ab"]))]
  );
}

#[test]
fn test_overlong_line_swallows_continuation() {
  let input = format!("g {} \\\nv 9 9 9 \\\r\n  1\nv 1 2 3\n", "x".repeat(100));
  let got: Vec<Line> = LineReader::new(input.as_bytes(), 16)
    .map(|l| l.unwrap())
    .collect();

  assert_eq!(got.len(), 2);
  assert!(got[0].overlong);
  assert_eq!(got[0].number, 1);
  assert_eq!(got[1].number, 4);
  assert_eq!(got[1].tokens, toks(&["v", "1", "2", "3"]));
}

#[test]
fn test_line_at_limit_with_crlf_continuation() {
  let got: Vec<Line> = LineReader::new("g abcd\\\r\n ef\n".as_bytes(), 6)
    .map(|l| l.unwrap())
    .collect();
  assert_eq!(got.len(), 1);
  assert!(got[0].overlong);

  let got: Vec<Line> = LineReader::new("g abcd\\\r\n\n".as_bytes(), 6)
    .map(|l| l.unwrap())
    .collect();
  assert!(!got[0].overlong);
  assert_eq!(got[0].tokens, toks(&["g", "abcd"]));
}

#[test]
fn test_overlong_line() {
  let input = format!("v {}\nv 1 2 3\n", "9".repeat(100));
  let got: Vec<Line> = LineReader::new(input.as_bytes(), 16)
    .map(|l| l.unwrap())
    .collect();

  assert_eq!(got.len(), 2);
  assert!(got[0].overlong);
  assert_eq!(got[0].number, 1);
  assert!(!got[1].overlong);
  assert_eq!(got[1].tokens, toks(&["v", "1", "2", "3"]));
}

#[test]
fn test_small_chunks() {
  // Lines spanning many reader chunks are reassembled.
  let long = format!("g {}\n", "x".repeat(3 * CHUNK_SIZE));
  let got = lines(&long);
  assert_eq!(got.len(), 1);
  assert_eq!(got[0].1[1].len(), 3 * CHUNK_SIZE);
}
