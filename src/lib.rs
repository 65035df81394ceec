//! Parsers for wavefront's `.obj` and `.mtl` file format for loading meshes.
//!
//! Parsing is streaming and fault tolerant: a bad statement is dropped and
//! recorded as a [`Diagnostic`], and the rest of the file is still read.
//! [`ParseOptions::strict`] turns any such problem into a hard failure.
//!
//! ```
//! use std::io;
//! use wavefront_scene::{parse_obj, ParseOptions};
//!
//! let obj = "mtllib a.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl Red\nf 1 2 3\n";
//! let mut resolver = |name: &str| -> io::Result<&'static [u8]> {
//!   match name {
//!     "a.mtl" => Ok(&b"newmtl Red\nKd 1 0 0\n"[..]),
//!     _ => Err(io::ErrorKind::NotFound.into()),
//!   }
//! };
//!
//! let scene = parse_obj(obj.as_bytes(), &mut resolver, &ParseOptions::default()).unwrap();
//! let material = scene.material_of(&scene.faces[0]).unwrap();
//! assert_eq!(material.diffuse, [1.0, 0.0, 0.0]);
//! assert!(scene.diagnostics.is_empty());
//! ```
#![crate_type = "lib"]
#![deny(missing_docs)]
#![warn(unreachable_pub)]

use std::fs::File;
use std::io;
use std::path::Path;

pub use error::{Diagnostic, ErrorKind, ParseError, Severity};
pub use mtl::{Material, MaterialSet, TextureKind};
pub use obj::parse as parse_obj;
pub use options::ParseOptions;
pub use resolve::{FileResolver, FsResolver, NoResolver};
pub use scene::{Scene, Triangle};
pub use summary::{Summary, SummaryOptions};

mod context;
mod error;
mod lex;
mod options;
mod resolve;
mod scene;
mod summary;
mod util;

pub mod mtl;
pub mod obj;

/// Parses a standalone `.mtl` file.
pub fn parse_mtl<R: io::Read>(
  input: R,
  options: &ParseOptions,
) -> Result<(MaterialSet, Vec<Diagnostic>), ParseError> {
  mtl::parse(input, options)
}

/// Opens and parses the `.obj` file at `path`. Material libraries are looked
/// up relative to the directory containing it.
pub fn load_obj<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Scene, ParseError> {
  let path = path.as_ref();
  let name = path.display().to_string();
  let input = File::open(path).map_err(|e| open_error(&name, e))?;

  let root = path.parent().unwrap_or_else(|| Path::new(""));
  obj::parse_named(&name, input, &mut FsResolver::new(root), options)
}

/// Opens and parses the `.mtl` file at `path`.
pub fn load_mtl<P: AsRef<Path>>(
  path: P,
  options: &ParseOptions,
) -> Result<(MaterialSet, Vec<Diagnostic>), ParseError> {
  let path = path.as_ref();
  let name = path.display().to_string();
  let input = File::open(path).map_err(|e| open_error(&name, e))?;

  let mut materials = MaterialSet::new();
  let mut reporter = error::Reporter::new(options.strict);
  mtl::read_library(input, &name, options, &mut materials, &mut reporter)?;
  Ok((materials, reporter.into_diagnostics()))
}

fn open_error(name: &str, source: io::Error) -> ParseError {
  error::Reporter::new(false).io(name, 0, source)
}
