//! Diagnostics and errors produced while parsing `.obj` and `.mtl` files.
//!
//! Most problems in a Wavefront file are recoverable: the offending statement
//! is dropped, a [`Diagnostic`] is recorded, and parsing continues. Only a
//! failure to read the input (or any problem at all, in strict mode) aborts
//! the parse with a [`ParseError`].
use std::fmt;
use std::io;

use thiserror::Error;

/// The kind of problem a diagnostic describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// The input stream could not be read. Always fatal.
  Io,
  /// A token that should have been a number was not one.
  InvalidNumber,
  /// A face or line vertex reference was zero, out of range or malformed.
  InvalidIndex,
  /// A statement had the wrong number of arguments, or appeared where it is
  /// not allowed.
  MalformedStatement,
  /// The statement keyword is not part of the format.
  UnknownKeyword,
  /// A `usemtl` name matched no loaded material.
  UnresolvedMaterial,
  /// A material name was defined more than once.
  DuplicateMaterialName,
  /// A material library named by `mtllib` could not be opened.
  FileNotFound,
}

impl ErrorKind {
  /// Returns a short, stable name for this kind.
  pub const fn name(self) -> &'static str {
    match self {
      ErrorKind::Io => "io error",
      ErrorKind::InvalidNumber => "invalid number",
      ErrorKind::InvalidIndex => "invalid index",
      ErrorKind::MalformedStatement => "malformed statement",
      ErrorKind::UnknownKeyword => "unknown keyword",
      ErrorKind::UnresolvedMaterial => "unresolved material",
      ErrorKind::DuplicateMaterialName => "duplicate material name",
      ErrorKind::FileNotFound => "file not found",
    }
  }

  /// Whether a parse may continue after this kind of problem when not in
  /// strict mode.
  pub const fn is_recoverable(self) -> bool {
    !matches!(self, ErrorKind::Io)
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// How serious a diagnostic is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
  /// The parse continued; some input was ignored.
  Warning,
  /// The parse was aborted.
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Warning => f.write_str("warning"),
      Severity::Error => f.write_str("error"),
    }
  }
}

/// A problem found in a specific line of a specific file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
  /// 1-based line number. For continued lines, the number of the first
  /// physical line.
  pub line_number: usize,
  /// The file the line belongs to: the `mtllib` name for material libraries.
  pub file: String,
  #[allow(missing_docs)]
  pub severity: Severity,
  #[allow(missing_docs)]
  pub kind: ErrorKind,
  /// Human-readable description.
  pub message: String,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}:{}: {} ({}): {}",
      self.file, self.line_number, self.severity, self.kind, self.message
    )
  }
}

/// A fatal parse failure.
///
/// Both variants carry every diagnostic recorded before the abort; the last
/// entry describes the failure itself.
#[derive(Debug, Error)]
pub enum ParseError {
  /// Reading the input failed.
  #[error("{file}:{line_number}: failed to read input: {source}")]
  Io {
    /// The file being read.
    file: String,
    /// The last physical line read before the failure.
    line_number: usize,
    /// The underlying failure.
    source: io::Error,
    /// Diagnostics up to and including the failure.
    diagnostics: Vec<Diagnostic>,
  },
  /// Strict mode turned a recoverable problem into an abort.
  #[error("{}", .diagnostics.last().map(ToString::to_string).unwrap_or_default())]
  Strict {
    /// Diagnostics up to and including the one that aborted the parse.
    diagnostics: Vec<Diagnostic>,
  },
}

impl ParseError {
  /// Every diagnostic recorded before the abort, the trigger last.
  pub fn diagnostics(&self) -> &[Diagnostic] {
    match self {
      ParseError::Io { diagnostics, .. } | ParseError::Strict { diagnostics } => diagnostics,
    }
  }

  /// The kind of the problem that aborted the parse.
  pub fn kind(&self) -> ErrorKind {
    match self {
      ParseError::Io { .. } => ErrorKind::Io,
      ParseError::Strict { diagnostics } => diagnostics
        .last()
        .map_or(ErrorKind::MalformedStatement, |d| d.kind),
    }
  }
}

/// A recoverable problem that is not yet tied to a file and line.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Issue {
  pub(crate) kind: ErrorKind,
  pub(crate) message: String,
}

impl Issue {
  pub(crate) fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Issue {
    Issue {
      kind,
      message: message.into(),
    }
  }

  pub(crate) fn malformed<S: Into<String>>(message: S) -> Issue {
    Issue::new(ErrorKind::MalformedStatement, message)
  }
}

/// Collects the diagnostics of one parse invocation and applies the strict
/// mode policy.
#[derive(Debug)]
pub(crate) struct Reporter {
  strict: bool,
  diagnostics: Vec<Diagnostic>,
}

impl Reporter {
  pub(crate) fn new(strict: bool) -> Reporter {
    Reporter {
      strict,
      diagnostics: Vec::new(),
    }
  }

  /// Records `issue`. Fails when strict mode is on.
  pub(crate) fn report(
    &mut self,
    file: &str,
    line_number: usize,
    issue: Issue,
  ) -> Result<(), ParseError> {
    let mut diagnostic = Diagnostic {
      line_number,
      file: file.to_owned(),
      severity: Severity::Warning,
      kind: issue.kind,
      message: issue.message,
    };

    if self.strict {
      diagnostic.severity = Severity::Error;
      log::error!("{}", diagnostic);
      self.diagnostics.push(diagnostic);
      return Err(ParseError::Strict {
        diagnostics: std::mem::take(&mut self.diagnostics),
      });
    }

    log::warn!("{}", diagnostic);
    self.diagnostics.push(diagnostic);
    Ok(())
  }

  /// Builds the fatal error for a failed read.
  pub(crate) fn io(&mut self, file: &str, line_number: usize, source: io::Error) -> ParseError {
    let diagnostic = Diagnostic {
      line_number,
      file: file.to_owned(),
      severity: Severity::Error,
      kind: ErrorKind::Io,
      message: source.to_string(),
    };
    log::error!("{}", diagnostic);
    self.diagnostics.push(diagnostic);

    ParseError::Io {
      file: file.to_owned(),
      line_number,
      source,
      diagnostics: std::mem::take(&mut self.diagnostics),
    }
  }

  pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
    self.diagnostics
  }
}

#[test]
fn test_reporter_lenient() {
  let mut reporter = Reporter::new(false);
  reporter
    .report("a.obj", 3, Issue::new(ErrorKind::UnknownKeyword, "unknown keyword `foo`"))
    .unwrap();

  let diagnostics = reporter.into_diagnostics();
  assert_eq!(diagnostics.len(), 1);
  assert_eq!(diagnostics[0].severity, Severity::Warning);
  assert_eq!(diagnostics[0].kind, ErrorKind::UnknownKeyword);
  assert_eq!(diagnostics[0].line_number, 3);
  assert_eq!(
    diagnostics[0].to_string(),
    "a.obj:3: warning (unknown keyword): unknown keyword `foo`"
  );
}

#[test]
fn test_reporter_strict() {
  let mut reporter = Reporter::new(true);
  let err = reporter
    .report("a.obj", 7, Issue::malformed("`vn` takes 3 numbers"))
    .unwrap_err();

  assert_eq!(err.kind(), ErrorKind::MalformedStatement);
  assert_eq!(err.diagnostics().len(), 1);
  assert_eq!(err.diagnostics()[0].severity, Severity::Error);
  assert!(err.to_string().contains("`vn` takes 3 numbers"));
}

#[test]
fn test_reporter_io_keeps_history() {
  let mut reporter = Reporter::new(false);
  reporter
    .report("a.obj", 1, Issue::new(ErrorKind::InvalidNumber, "bad"))
    .unwrap();
  let err = reporter.io("a.obj", 2, io::Error::new(io::ErrorKind::Other, "disk on fire"));

  assert_eq!(err.kind(), ErrorKind::Io);
  let kinds: Vec<_> = err.diagnostics().iter().map(|d| d.kind).collect();
  assert_eq!(kinds, vec![ErrorKind::InvalidNumber, ErrorKind::Io]);
}
