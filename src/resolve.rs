//! Locating the material libraries an `.obj` file refers to.
//!
//! The parser never touches the filesystem on its own. Every `mtllib` name is
//! handed to a [`FileResolver`], so files can come from a directory, an
//! archive, memory, or anywhere else.
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Opens files referenced from inside an `.obj` file.
pub trait FileResolver {
  /// The stream returned for a resolved name.
  type Reader: Read;

  /// Opens `name` exactly as written in the referencing statement. Any error
  /// is reported as a missing file and the statement is skipped.
  fn resolve(&mut self, name: &str) -> io::Result<Self::Reader>;
}

impl<F, R> FileResolver for F
where
  F: FnMut(&str) -> io::Result<R>,
  R: Read,
{
  type Reader = R;

  fn resolve(&mut self, name: &str) -> io::Result<R> {
    self(name)
  }
}

/// Resolves names relative to a base directory.
#[derive(Clone, Debug)]
pub struct FsResolver {
  root: PathBuf,
}

impl FsResolver {
  /// Creates a resolver that opens names relative to `root`.
  pub fn new<P: AsRef<Path>>(root: P) -> FsResolver {
    FsResolver {
      root: root.as_ref().to_path_buf(),
    }
  }
}

impl FileResolver for FsResolver {
  type Reader = File;

  fn resolve(&mut self, name: &str) -> io::Result<File> {
    File::open(self.root.join(name))
  }
}

/// Resolves nothing; every `mtllib` is reported as not found.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoResolver;

impl FileResolver for NoResolver {
  type Reader = io::Empty;

  fn resolve(&mut self, name: &str) -> io::Result<io::Empty> {
    Err(io::Error::new(
      io::ErrorKind::NotFound,
      format!("no resolver configured for `{}`", name),
    ))
  }
}

#[test]
fn test_closure_resolver() {
  let mut resolver = |name: &str| -> io::Result<&'static [u8]> {
    match name {
      "a.mtl" => Ok(&b"newmtl a\n"[..]),
      _ => Err(io::Error::new(io::ErrorKind::NotFound, name.to_owned())),
    }
  };

  let mut contents = String::new();
  resolver
    .resolve("a.mtl")
    .unwrap()
    .read_to_string(&mut contents)
    .unwrap();
  assert_eq!(contents, "newmtl a\n");
  assert_eq!(
    resolver.resolve("b.mtl").unwrap_err().kind(),
    io::ErrorKind::NotFound
  );
}

#[test]
fn test_fs_resolver() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join("lib.mtl"), "newmtl x\n").unwrap();

  let mut resolver = FsResolver::new(dir.path());
  let mut contents = String::new();
  resolver
    .resolve("lib.mtl")
    .unwrap()
    .read_to_string(&mut contents)
    .unwrap();
  assert_eq!(contents, "newmtl x\n");
  assert!(resolver.resolve("missing.mtl").is_err());
}

#[test]
fn test_no_resolver() {
  assert_eq!(
    NoResolver.resolve("x.mtl").unwrap_err().kind(),
    io::ErrorKind::NotFound
  );
}
