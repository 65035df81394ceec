//! Parser configuration.

/// Options shared by the `.obj` and `.mtl` parsers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
  /// Split polygons with more than three corners into a triangle fan. When
  /// false, faces keep every corner they were written with.
  pub triangulate: bool,
  /// Longest logical line, in bytes, the reader will buffer. Longer lines are
  /// reported and skipped.
  pub max_line_length: usize,
  /// Abort on the first problem of any kind instead of recording it and
  /// continuing.
  pub strict: bool,
}

impl Default for ParseOptions {
  fn default() -> ParseOptions {
    ParseOptions {
      triangulate: true,
      max_line_length: 64 * 1024,
      strict: false,
    }
  }
}

impl ParseOptions {
  /// Sets whether faces with more than 3 corners are fanned into triangles.
  pub fn with_triangulate(mut self, triangulate: bool) -> ParseOptions {
    self.triangulate = triangulate;
    self
  }

  /// Sets the longest logical line, in bytes, that is parsed rather than skipped.
  pub fn with_max_line_length(mut self, max_line_length: usize) -> ParseOptions {
    self.max_line_length = max_line_length;
    self
  }

  /// Sets whether the first recoverable problem aborts the parse.
  pub fn with_strict(mut self, strict: bool) -> ParseOptions {
    self.strict = strict;
    self
  }
}
