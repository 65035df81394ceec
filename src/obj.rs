//! A parser for Wavefront's `.obj` file format for storing 3D meshes.
use std::io::Read;
use std::ops::Range;

use crate::context::Context;
use crate::error::{ErrorKind, Issue, ParseError, Reporter};
use crate::lex::{Line, LineReader};
use crate::mtl::{self, Color, MaterialSet};
use crate::options::ParseOptions;
use crate::resolve::FileResolver;
use crate::scene::{self, Scene};
use crate::util::{parse_face_ref, parse_floats, parse_int};

/// A named, contiguous run of faces and lines, started by an `o` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
  /// A human-readable name for this object. Geometry that precedes every `o`
  /// statement lands in an object called `default`.
  pub name: String,
  /// The faces of this object, as a range into [`Scene::faces`].
  pub faces: Range<usize>,
  /// The polylines of this object, as a range into [`Scene::lines`].
  pub lines: Range<usize>,
}

/// A polygon. With triangulation on (the default) every face is a triangle.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
  /// The corners of the face, in winding order.
  pub vertices: Vec<VTNIndex>,
  /// The material bound by the last `usemtl`. `None` when no material was
  /// bound, or when the bound name matched no loaded material.
  pub material: Option<String>,
  /// Index into [`Scene::objects`].
  pub object: usize,
  /// Active groups. No associated group means the face uses the default
  /// group.
  pub groups: Vec<GroupName>,
  /// Smoothing group id; 0 means flat shading.
  pub smoothing_group: u32,
}

/// A polyline from an `l` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
  /// Vertex and optional texture vertex of each point.
  pub vertices: Vec<(VertexIndex, Option<TextureIndex>)>,
  #[allow(missing_docs)]
  pub material: Option<String>,
  /// Index into [`Scene::objects`].
  pub object: usize,
  #[allow(missing_docs)]
  pub groups: Vec<GroupName>,
}

/// Name of a group.
pub type GroupName = String;

/// A single 3-dimensional point on the corner of an object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
  #[allow(missing_docs)]
  pub x: f64,
  #[allow(missing_docs)]
  pub y: f64,
  #[allow(missing_docs)]
  pub z: f64,
  /// Weight, 1.0 unless given.
  pub w: f64,
  /// Vertex color, for exporters that append `r g b` to `v` statements.
  pub color: Option<Color>,
}

/// A single 3-dimensional normal. Not renormalized by the parser.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normal {
  pub x: f64,
  pub y: f64,
  pub z: f64,
}

/// A single 3-dimensional point on a texture. "Texture Vertex".
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TVertex {
  pub u: f64,
  pub v: f64,
  pub w: f64,
}

/// A point in the parameter space of a free-form curve or surface (`vp`).
/// Stored as read; nothing in this crate interprets it.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamVertex {
  pub u: f64,
  pub v: f64,
  pub w: f64,
}

/// An index into the `vertices` array of a scene, representing a vertex in
/// the mesh. After parsing, this is guaranteed to be a valid index into the
/// array, so unchecked indexing may be used.
pub type VertexIndex = usize;

/// An index into the `texture vertex` array of a scene.
///
/// Unchecked indexing may be used, because the values are guaranteed to be in
/// range by the parser.
pub type TextureIndex = usize;

/// An index into the `normals` array of a scene.
///
/// Unchecked indexing may be used, because the values are guaranteed to be in
/// range by the parser.
pub type NormalIndex = usize;

/// An index into the vertex array, with optional indices into the texture
/// and normal arrays. This is used to define the corners of faces which may
/// or may not be textured.
pub type VTNIndex = (VertexIndex, Option<TextureIndex>, Option<NormalIndex>);

/// Splits a convex polygon into a triangle fan around its first corner.
pub(crate) fn fan(xs: &[VTNIndex]) -> impl Iterator<Item = [VTNIndex; 3]> + '_ {
  let first = xs.first().copied();
  xs.windows(2)
    .skip(1)
    .filter_map(move |w| first.map(|f| [f, w[0], w[1]]))
}

/// Turns the corners of one face statement into the faces to store.
fn to_polygons(xs: Vec<VTNIndex>, triangulate: bool) -> Vec<Vec<VTNIndex>> {
  if triangulate && xs.len() > 3 {
    fan(&xs).map(|t| t.to_vec()).collect()
  } else {
    vec![xs]
  }
}

/// Keywords that are part of the format but describe free-form geometry or
/// rendering hints this crate does not model.
fn is_ignored(keyword: &str) -> bool {
  matches!(
    keyword,
    "cstype"
      | "deg"
      | "bmat"
      | "step"
      | "curv"
      | "curv2"
      | "surf"
      | "parm"
      | "trim"
      | "hole"
      | "scrv"
      | "sp"
      | "end"
      | "con"
      | "p"
      | "bevel"
      | "c_interp"
      | "d_interp"
      | "lod"
      | "shadow_obj"
      | "trace_obj"
      | "ctech"
      | "stech"
      | "mg"
  )
}

fn arity(keyword: &str, args: &[String], min: usize, max: usize) -> Result<(), Issue> {
  if args.len() < min || args.len() > max {
    let expected = if min == max {
      format!("{}", min)
    } else {
      format!("{} to {}", min, max)
    };
    return Err(Issue::malformed(format!(
      "`{}` takes {} numbers but got {}",
      keyword,
      expected,
      args.len()
    )));
  }
  Ok(())
}

fn parse_vertex(args: &[String]) -> Result<Vertex, Issue> {
  if args.len() == 6 {
    let c = parse_floats(args)?;
    return Ok(Vertex {
      x: c[0],
      y: c[1],
      z: c[2],
      w: 1.0,
      color: Some([c[3], c[4], c[5]]),
    });
  }

  arity("v", args, 3, 4)?;
  let c = parse_floats(args)?;
  Ok(Vertex {
    x: c[0],
    y: c[1],
    z: c[2],
    w: c.get(3).copied().unwrap_or(1.0),
    color: None,
  })
}

fn parse_tex_vertex(args: &[String]) -> Result<TVertex, Issue> {
  arity("vt", args, 1, 3)?;
  let c = parse_floats(args)?;
  Ok(TVertex {
    u: c[0],
    v: c.get(1).copied().unwrap_or(0.),
    w: c.get(2).copied().unwrap_or(0.),
  })
}

fn parse_normal(args: &[String]) -> Result<Normal, Issue> {
  arity("vn", args, 3, 3)?;
  let c = parse_floats(args)?;
  Ok(Normal {
    x: c[0],
    y: c[1],
    z: c[2],
  })
}

fn parse_param_vertex(args: &[String]) -> Result<ParamVertex, Issue> {
  arity("vp", args, 1, 3)?;
  let c = parse_floats(args)?;
  Ok(ParamVertex {
    u: c[0],
    v: c.get(1).copied().unwrap_or(0.),
    w: c.get(2).copied().unwrap_or(1.),
  })
}

fn parse_smoothing_group(args: &[String]) -> Result<u32, Issue> {
  match args {
    [s] if s == "off" => Ok(0),
    [s] => {
      let group = parse_int(s)?;
      u32::try_from(group).map_err(|_| {
        Issue::new(
          ErrorKind::InvalidNumber,
          format!("smoothing group {} is out of range", group),
        )
      })
    }
    _ => Err(Issue::malformed("`s` takes a group number or `off`")),
  }
}

struct Parser<'a, F> {
  file: &'a str,
  options: &'a ParseOptions,
  resolver: &'a mut F,
  reporter: Reporter,
  context: Context,
  materials: MaterialSet,
}

impl<'a, F: FileResolver> Parser<'a, F> {
  fn new(file: &'a str, options: &'a ParseOptions, resolver: &'a mut F) -> Parser<'a, F> {
    Parser {
      file,
      options,
      resolver,
      reporter: Reporter::new(options.strict),
      context: Context::new(),
      materials: MaterialSet::new(),
    }
  }

  fn parse_face(&mut self, line: &Line) -> Result<(), Issue> {
    let args = line.args();
    if args.len() < 3 {
      return Err(Issue::malformed(format!(
        "a face needs at least 3 vertices but got {}",
        args.len()
      )));
    }

    let sizes = self.context.sizes();
    let corners = args
      .iter()
      .map(|t| parse_face_ref(t, sizes))
      .collect::<Result<Vec<_>, _>>()?;

    for polygon in to_polygons(corners, self.options.triangulate) {
      self.context.add_face(polygon);
    }
    Ok(())
  }

  fn parse_line(&mut self, line: &Line) -> Result<(), Issue> {
    let args = line.args();
    if args.len() < 2 {
      return Err(Issue::malformed(format!(
        "a line needs at least 2 vertices but got {}",
        args.len()
      )));
    }

    let sizes = self.context.sizes();
    let mut points = Vec::with_capacity(args.len());
    for t in args {
      match parse_face_ref(t, sizes)? {
        (v, vt, None) => points.push((v, vt)),
        (_, _, Some(_)) => {
          return Err(Issue::new(
            ErrorKind::InvalidIndex,
            format!("line vertex `{}` may not reference a normal", t),
          ))
        }
      }
    }

    self.context.add_line(points);
    Ok(())
  }

  /// Parses every library named by an `mtllib` statement, in order.
  fn load_libraries(&mut self, line: &Line) -> Result<(), ParseError> {
    if line.args().is_empty() {
      return self.reporter.report(
        self.file,
        line.number,
        Issue::malformed("`mtllib` needs at least one file name"),
      );
    }

    for name in line.args() {
      self.context.add_material_library(name);
      match self.resolver.resolve(name) {
        Ok(input) => {
          log::debug!("loading material library `{}`", name);
          mtl::read_library(
            input,
            name,
            self.options,
            &mut self.materials,
            &mut self.reporter,
          )?;
        }
        Err(e) => {
          let issue = Issue::new(
            ErrorKind::FileNotFound,
            format!("cannot open material library `{}`: {}", name, e),
          );
          self.reporter.report(self.file, line.number, issue)?;
        }
      }
    }
    Ok(())
  }

  fn statement(&mut self, line: &Line) -> Result<(), ParseError> {
    if line.overlong {
      let issue = Issue::malformed(format!(
        "line exceeds the maximum length of {} bytes",
        self.options.max_line_length
      ));
      return self.reporter.report(self.file, line.number, issue);
    }

    let args = line.args();
    let result = match line.keyword() {
      "v" => parse_vertex(args).map(|v| self.context.add_vertex(v)),
      "vt" => parse_tex_vertex(args).map(|v| self.context.add_tex_vertex(v)),
      "vn" => parse_normal(args).map(|v| self.context.add_normal(v)),
      "vp" => parse_param_vertex(args).map(|v| self.context.add_parameter(v)),
      "f" => self.parse_face(line),
      "l" => self.parse_line(line),
      "o" => {
        if args.is_empty() {
          Err(Issue::malformed("`o` needs an object name"))
        } else {
          self.context.set_name(line.rest());
          Ok(())
        }
      }
      "g" => {
        // g without any name is valid and means default group
        self.context.set_current_groups(args.to_vec());
        Ok(())
      }
      "s" => parse_smoothing_group(args).map(|s| self.context.set_current_smoothing_group(s)),
      "usemtl" => {
        if args.is_empty() {
          Err(Issue::malformed("`usemtl` needs a material name"))
        } else {
          self.context.set_material_name(line.rest(), line.number);
          Ok(())
        }
      }
      "mtllib" => return self.load_libraries(line),
      keyword if is_ignored(keyword) => {
        log::debug!(
          "{}:{}: ignoring unsupported statement `{}`",
          self.file,
          line.number,
          keyword
        );
        Ok(())
      }
      keyword => Err(Issue::new(
        ErrorKind::UnknownKeyword,
        format!("unknown statement `{}`", keyword),
      )),
    };

    match result {
      Ok(()) => Ok(()),
      Err(issue) => self.reporter.report(self.file, line.number, issue),
    }
  }

  fn parse_scene<R: Read>(mut self, input: R) -> Result<Scene, ParseError> {
    log::info!("parsing {}", self.file);

    let mut lines = LineReader::new(input, self.options.max_line_length);
    loop {
      match lines.next() {
        Some(Ok(line)) => self.statement(&line)?,
        Some(Err(e)) => return Err(self.reporter.io(self.file, lines.physical_line(), e)),
        None => break,
      }
    }

    let (mut scene, material_uses) = self.context.finish(self.materials);
    scene::resolve_materials(&mut scene, &material_uses, self.file, &mut self.reporter)?;
    debug_assert!(scene.validate());
    scene.diagnostics = self.reporter.into_diagnostics();

    log::info!(
      "parsed {}: {} vertices, {} texture vertices, {} normals, {} faces, {} objects, {} materials, {} diagnostics",
      self.file,
      scene.vertices.len(),
      scene.tex_vertices.len(),
      scene.normals.len(),
      scene.faces.len(),
      scene.objects.len(),
      scene.materials.len(),
      scene.diagnostics.len()
    );
    Ok(scene)
  }
}

pub(crate) fn parse_named<R: Read, F: FileResolver>(
  file: &str,
  input: R,
  resolver: &mut F,
  options: &ParseOptions,
) -> Result<Scene, ParseError> {
  Parser::new(file, options, resolver).parse_scene(input)
}

/// Parses a wavefront `.obj` file, returning either the scene it describes
/// together with every recoverable problem found on the way, or the fatal
/// error that stopped the parse.
///
/// Material libraries named by `mtllib` are opened through `resolver`.
pub fn parse<R: Read, F: FileResolver>(
  input: R,
  resolver: &mut F,
  options: &ParseOptions,
) -> Result<Scene, ParseError> {
  parse_named("<obj>", input, resolver, options)
}

#[cfg(test)]
fn parse_str(input: &str) -> Scene {
  parse(input.as_bytes(), &mut crate::resolve::NoResolver, &ParseOptions::default()).unwrap()
}

#[cfg(test)]
fn corners(scene: &Scene) -> Vec<Vec<VertexIndex>> {
  scene
    .faces
    .iter()
    .map(|f| f.vertices.iter().map(|c| c.0).collect())
    .collect()
}

#[test]
fn test_fan() {
  let xs: Vec<VTNIndex> = (0..5).map(|i| (i, None, None)).collect();
  let tris: Vec<[usize; 3]> = fan(&xs).map(|t| [t[0].0, t[1].0, t[2].0]).collect();
  assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);

  assert_eq!(fan(&xs[..3]).count(), 1);
  assert_eq!(fan(&xs[..2]).count(), 0);
  assert_eq!(fan(&[]).count(), 0);
}

#[test]
fn test_parse() {
  let test_case = r#"
# Blender v2.69 (sub 0) OBJ File: ''
# www.blender.org
o Cube.001
v -1.000000 -1.000000 1.000000
v -1.000000 -1.000000 -1.000000
v 1.000000 -1.000000 -1.000000
v 1.000000 -1.000000 1.000000
v -1.000000 1.000000 1.000000
v -1.000000 1.000000 -1.000000
v 1.000000 1.000000 -1.000000
v 1.000000 1.000000 1.000000
s off
f 5 6 2 1
f 6 7 3 2
f 7 8 4 3
f 8 5 1 4
f 1 2 3 4
f 8 7 6 5
o Circle
v 0.000000 0.000000 -1.000000
v -0.195090 0.000000 -0.980785
l 9 10
l -2 -1
"#;

  let scene = parse_str(test_case);
  assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);
  assert_eq!(scene.vertices.len(), 10);
  assert_eq!(
    scene.vertices[0],
    Vertex {
      x: -1.0,
      y: -1.0,
      z: 1.0,
      w: 1.0,
      color: None
    }
  );
  assert_eq!(scene.faces.len(), 12);
  assert_eq!(scene.faces[0].vertices, vec![(4, None, None), (5, None, None), (1, None, None)]);
  assert_eq!(scene.faces[1].vertices, vec![(4, None, None), (1, None, None), (0, None, None)]);

  assert_eq!(scene.objects.len(), 2);
  assert_eq!(scene.objects[0].name, "Cube.001");
  assert_eq!(scene.objects[0].faces, 0..12);
  assert_eq!(scene.objects[1].name, "Circle");
  assert_eq!(scene.objects[1].faces, 12..12);
  assert_eq!(scene.objects[1].lines, 0..2);
  assert_eq!(scene.lines[0].vertices, vec![(8, None), (9, None)]);
  assert_eq!(scene.lines[1].vertices, vec![(8, None), (9, None)]);
}

#[test]
fn test_vertex_forms() {
  let scene = parse_str("v 1 2 3 0.5\nv 1 2 3 0.1 0.2 0.3\nvt 0.5\nvt 0.5 0.25 0.125\nvn 0 0 2\nvp 0.3\n");
  assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);

  assert_eq!(scene.vertices[0].w, 0.5);
  assert_eq!(scene.vertices[1].w, 1.0);
  assert_eq!(scene.vertices[1].color, Some([0.1, 0.2, 0.3]));
  assert_eq!(scene.tex_vertices[0], TVertex { u: 0.5, v: 0.0, w: 0.0 });
  assert_eq!(scene.tex_vertices[1], TVertex { u: 0.5, v: 0.25, w: 0.125 });
  assert_eq!(scene.normals[0], Normal { x: 0.0, y: 0.0, z: 2.0 });
  assert_eq!(scene.parameters[0], ParamVertex { u: 0.3, v: 0.0, w: 1.0 });
}

#[test]
fn test_malformed_vertex_adds_nothing() {
  let scene = parse_str("v 1 2\nv 1 two 3\nv 0 0 0\nvn 1 0\nf 1 1 1\n");
  assert_eq!(scene.vertices.len(), 1);
  assert!(scene.normals.is_empty());

  let kinds: Vec<_> = scene.diagnostics.iter().map(|d| (d.line_number, d.kind)).collect();
  assert_eq!(
    kinds,
    vec![
      (1, ErrorKind::MalformedStatement),
      (2, ErrorKind::InvalidNumber),
      (4, ErrorKind::MalformedStatement),
    ]
  );
  // The face still refers to the only vertex that made it in.
  assert_eq!(corners(&scene), vec![vec![0, 0, 0]]);
}

#[test]
fn test_face_vertex_forms() {
  let test_case = r#"
v 0 0 0
v 1 0 0
v 1 1 0
vt 0 0
vt 1 0
vt 1 1
vn 0 0 1
f 1/1 2/2 3/3
f 1//1 2//1 3//1
f 1/1/1 2/2/1 3/3/1
"#;

  let scene = parse_str(test_case);
  assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);
  assert_eq!(scene.faces[0].vertices[2], (2, Some(2), None));
  assert_eq!(scene.faces[1].vertices[2], (2, None, Some(0)));
  assert_eq!(scene.faces[2].vertices[2], (2, Some(2), Some(0)));
}

#[test]
fn test_relative_indices_use_current_pool() {
  // `-1` means the newest vertex at the time the face is read, not at the end
  // of the file.
  let scene = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\nv 5 5 5\nf -4 -3 -2\nf -1 1 2\n");
  assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);
  assert_eq!(corners(&scene), vec![vec![0, 1, 2], vec![0, 1, 2], vec![3, 0, 1]]);
}

#[test]
fn test_forward_reference_is_invalid() {
  let scene = parse_str("v 0 0 0\nv 1 0 0\nf 1 2 3\nv 0 1 0\n");
  assert!(scene.faces.is_empty());
  assert_eq!(scene.diagnostics.len(), 1);
  assert_eq!(scene.diagnostics[0].kind, ErrorKind::InvalidIndex);
  assert_eq!(scene.diagnostics[0].line_number, 3);
}

#[test]
fn test_preserve_ngons() {
  let input = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0 2 0\nf 1 2 3 4 5\n";

  let options = ParseOptions::default();
  let fanned = parse(input.as_bytes(), &mut crate::resolve::NoResolver, &options).unwrap();
  assert_eq!(corners(&fanned), vec![vec![0, 1, 2], vec![0, 2, 3], vec![0, 3, 4]]);

  let options = ParseOptions::default().with_triangulate(false);
  let kept = parse(input.as_bytes(), &mut crate::resolve::NoResolver, &options).unwrap();
  assert_eq!(corners(&kept), vec![vec![0, 1, 2, 3, 4]]);
}

#[test]
fn test_groups_and_smoothing() {
  let test_case = r#"
v 0 0 0
v 1 0 0
v 1 1 0
g left right
s 2
f 1 2 3
g
s off
f 3 2 1
g solo
s 1
f 1 3 2
"#;

  let scene = parse_str(test_case);
  assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);
  assert_eq!(scene.faces[0].groups, vec!["left".to_string(), "right".to_string()]);
  assert_eq!(scene.faces[0].smoothing_group, 2);
  assert!(scene.faces[1].groups.is_empty());
  assert_eq!(scene.faces[1].smoothing_group, 0);
  assert_eq!(scene.faces[2].groups, vec!["solo".to_string()]);
  assert_eq!(scene.faces[2].smoothing_group, 1);
}

#[test]
fn test_bad_statements_are_skipped() {
  let test_case = r#"
v 0 0 0
v 1 0 0
v 1 1 0
frobnicate 1 2
s -1
s
o
usemtl
mtllib
l 1
l 1//1 2
cstype bspline
f 1 2 3
"#;

  let scene = parse_str(test_case);
  let kinds: Vec<_> = scene.diagnostics.iter().map(|d| (d.line_number, d.kind)).collect();
  assert_eq!(
    kinds,
    vec![
      (5, ErrorKind::UnknownKeyword),
      (6, ErrorKind::InvalidNumber),
      (7, ErrorKind::MalformedStatement),
      (8, ErrorKind::MalformedStatement),
      (9, ErrorKind::MalformedStatement),
      (10, ErrorKind::MalformedStatement),
      (11, ErrorKind::MalformedStatement),
      (12, ErrorKind::InvalidIndex),
    ]
  );
  assert_eq!(scene.faces.len(), 1);
  assert!(scene.lines.is_empty());
}

#[test]
fn test_overlong_line_is_reported() {
  let input = format!("v 0 0 0\ng {}\nv 1 1 1\n", "x".repeat(200));
  let options = ParseOptions::default().with_max_line_length(64);
  let scene = parse(input.as_bytes(), &mut crate::resolve::NoResolver, &options).unwrap();

  assert_eq!(scene.vertices.len(), 2);
  assert_eq!(scene.diagnostics.len(), 1);
  assert_eq!(scene.diagnostics[0].kind, ErrorKind::MalformedStatement);
  assert_eq!(scene.diagnostics[0].line_number, 2);
}

#[test]
fn test_overlong_line_continuation_is_skipped() {
  let input = format!("v 0 0 0\ng {} \\\nv 9 9 9\nf 1 1 1\n", "x".repeat(100));
  let options = ParseOptions::default().with_max_line_length(32);
  let scene = parse(input.as_bytes(), &mut crate::resolve::NoResolver, &options).unwrap();

  assert_eq!(scene.vertices.len(), 1);
  let found: Vec<_> = scene.diagnostics.iter().map(|d| (d.line_number, d.kind)).collect();
  assert_eq!(found, vec![(2, ErrorKind::MalformedStatement)]);
  assert_eq!(scene.faces.len(), 1);
}

#[test]
fn test_missing_library() {
  let scene = parse_str("mtllib nowhere.mtl\n");
  assert_eq!(scene.material_libraries, vec!["nowhere.mtl".to_string()]);
  assert_eq!(scene.diagnostics.len(), 1);
  assert_eq!(scene.diagnostics[0].kind, ErrorKind::FileNotFound);
}
