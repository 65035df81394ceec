use std::collections::HashMap;
use std::io;

use wavefront_scene::{parse_obj, ErrorKind, NoResolver, ParseOptions, Scene, Severity};

fn library<'a>(
  files: &'a HashMap<&'a str, &'a str>,
) -> impl FnMut(&str) -> io::Result<&'a [u8]> + 'a {
  move |name: &str| match files.get(name) {
    Some(contents) => Ok(contents.as_bytes()),
    None => Err(io::Error::new(io::ErrorKind::NotFound, name.to_owned())),
  }
}

fn parse(input: &str) -> Scene {
  parse_obj(input.as_bytes(), &mut NoResolver, &ParseOptions::default()).unwrap()
}

fn positions(scene: &Scene) -> Vec<Vec<usize>> {
  scene
    .faces
    .iter()
    .map(|f| f.vertices.iter().map(|c| c.0).collect())
    .collect()
}

#[test]
fn test_simple_triangle() {
  let scene = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
  assert!(scene.diagnostics.is_empty());
  assert_eq!(positions(&scene), vec![vec![0, 1, 2]]);
  assert_eq!(scene.faces[0].material, None);
  assert_eq!(scene.objects.len(), 1);
  assert_eq!(scene.objects[0].name, "default");
}

#[test]
fn test_negative_indices() {
  let scene = parse("v 0 0 0\nv 1 0 0\nv 2 0 0\nv 3 0 0\nv 4 0 0\nf -1 -2 -3\n");
  assert!(scene.diagnostics.is_empty());
  assert_eq!(positions(&scene), vec![vec![4, 3, 2]]);
}

#[test]
fn test_zero_index_drops_face() {
  let scene = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\nf 1 2 3\n");
  assert_eq!(positions(&scene), vec![vec![0, 1, 2]]);
  assert_eq!(scene.diagnostics.len(), 1);
  assert_eq!(scene.diagnostics[0].kind, ErrorKind::InvalidIndex);
  assert_eq!(scene.diagnostics[0].severity, Severity::Warning);
  assert_eq!(scene.diagnostics[0].line_number, 4);
}

#[test]
fn test_short_face_is_dropped() {
  let scene = parse("v 0 0 0\nv 1 0 0\nf 1 2\nv 0 1 0\nf 1 2 3\n");
  assert_eq!(scene.vertices.len(), 3);
  assert_eq!(positions(&scene), vec![vec![0, 1, 2]]);
  assert_eq!(scene.diagnostics.len(), 1);
  assert_eq!(scene.diagnostics[0].kind, ErrorKind::MalformedStatement);
}

#[test]
fn test_material_binding() {
  let files: HashMap<&str, &str> = vec![("a.mtl", "newmtl Red\nKd 1 0 0\n")].into_iter().collect();
  let obj = "mtllib a.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl Red\nf 1 2 3\n";

  let scene = parse_obj(obj.as_bytes(), &mut library(&files), &ParseOptions::default()).unwrap();
  assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);
  assert_eq!(scene.faces[0].material.as_deref(), Some("Red"));
  assert_eq!(scene.material_of(&scene.faces[0]).unwrap().diffuse, [1.0, 0.0, 0.0]);
}

#[test]
fn test_unresolved_material() {
  let scene = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl Missing\nf 1 2 3\n");
  assert_eq!(scene.faces.len(), 1);
  assert_eq!(scene.faces[0].material, None);
  assert_eq!(scene.diagnostics.len(), 1);
  assert_eq!(scene.diagnostics[0].kind, ErrorKind::UnresolvedMaterial);
}

#[test]
fn test_material_defined_after_use() {
  // Names are checked once the whole file is read.
  let files: HashMap<&str, &str> =
    vec![("late.mtl", "newmtl Blue\nKd 0 0 1\n")].into_iter().collect();
  let obj = "v 0 0 0\nusemtl Blue\nf 1 1 1\nmtllib late.mtl\n";

  let scene = parse_obj(obj.as_bytes(), &mut library(&files), &ParseOptions::default()).unwrap();
  assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);
  assert_eq!(scene.material_of(&scene.faces[0]).unwrap().diffuse, [0.0, 0.0, 1.0]);
}

#[test]
fn test_libraries_merge_and_override() {
  let files: HashMap<&str, &str> = vec![
    ("a.mtl", "newmtl Red\nKd 1 0 0\nnewmtl Green\nKd 0 1 0\n"),
    ("b.mtl", "newmtl Red\nKd 0.5 0 0\n"),
  ]
  .into_iter()
  .collect();
  let obj = "mtllib a.mtl b.mtl missing.mtl\nv 0 0 0\nusemtl Red\nf 1 1 1\n";

  let scene = parse_obj(obj.as_bytes(), &mut library(&files), &ParseOptions::default()).unwrap();
  assert_eq!(scene.materials.len(), 2);
  assert_eq!(scene.material_of(&scene.faces[0]).unwrap().diffuse, [0.5, 0.0, 0.0]);
  assert_eq!(
    scene.material_libraries,
    vec!["a.mtl".to_string(), "b.mtl".to_string(), "missing.mtl".to_string()]
  );

  let found: Vec<_> = scene
    .diagnostics
    .iter()
    .map(|d| (d.file.as_str(), d.line_number, d.kind))
    .collect();
  assert_eq!(
    found,
    vec![
      ("b.mtl", 1, ErrorKind::DuplicateMaterialName),
      ("<obj>", 1, ErrorKind::FileNotFound),
    ]
  );
}

#[test]
fn test_idempotent() {
  let files: HashMap<&str, &str> =
    vec![("a.mtl", "newmtl Red\nKd 1 0 0\nbogus\n")].into_iter().collect();
  let obj = "mtllib a.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\ng quad\nusemtl Red\nf 1 2 4 3\nf 0 1 2\nwat\n";

  let first = parse_obj(obj.as_bytes(), &mut library(&files), &ParseOptions::default()).unwrap();
  let second = parse_obj(obj.as_bytes(), &mut library(&files), &ParseOptions::default()).unwrap();
  assert_eq!(first, second);
  assert_eq!(first.diagnostics.len(), 3);
}

#[test]
fn test_strict_mode() {
  let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\nf 1 2 9\nf 3 2 1\n";

  let lenient = parse(obj);
  assert_eq!(lenient.faces.len(), 2);
  assert_eq!(lenient.diagnostics.len(), 1);
  assert_eq!(lenient.diagnostics[0].kind, ErrorKind::InvalidIndex);

  let strict = ParseOptions::default().with_strict(true);
  let err = parse_obj(obj.as_bytes(), &mut NoResolver, &strict).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidIndex);
  assert_eq!(err.diagnostics().len(), 1);
  assert_eq!(err.diagnostics()[0].line_number, 5);
  assert_eq!(err.diagnostics()[0].severity, Severity::Error);
}

#[test]
fn test_strict_mode_every_kind() {
  let strict = ParseOptions::default().with_strict(true);
  let cases = [
    ("v 1 x 3\n", ErrorKind::InvalidNumber),
    ("v 0 0 0\nf 1 1 2\n", ErrorKind::InvalidIndex),
    ("vn 0 1\n", ErrorKind::MalformedStatement),
    ("bogus\n", ErrorKind::UnknownKeyword),
    ("usemtl nope\n", ErrorKind::UnresolvedMaterial),
    ("mtllib nope.mtl\n", ErrorKind::FileNotFound),
  ];

  for (obj, kind) in cases.iter() {
    let lenient = parse(obj);
    assert_eq!(lenient.diagnostics.len(), 1, "{}", obj);
    assert_eq!(lenient.diagnostics[0].kind, *kind, "{}", obj);

    let err = parse_obj(obj.as_bytes(), &mut NoResolver, &strict).unwrap_err();
    assert_eq!(err.kind(), *kind, "{}", obj);
  }
}

#[test]
fn test_strict_duplicate_material() {
  let files: HashMap<&str, &str> = vec![("a.mtl", "newmtl A\nnewmtl A\n")].into_iter().collect();
  let strict = ParseOptions::default().with_strict(true);
  let err = parse_obj("mtllib a.mtl\n".as_bytes(), &mut library(&files), &strict).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::DuplicateMaterialName);
  assert_eq!(err.diagnostics()[0].file, "a.mtl");
}

struct FailingReader {
  served: bool,
}

impl io::Read for FailingReader {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    if self.served {
      return Err(io::Error::new(io::ErrorKind::Other, "connection reset"));
    }
    self.served = true;
    let data = b"v 0 0 0\nbogus\n";
    buf[..data.len()].copy_from_slice(data);
    Ok(data.len())
  }
}

#[test]
fn test_io_error_is_fatal() {
  let input = FailingReader { served: false };
  let err = parse_obj(input, &mut NoResolver, &ParseOptions::default()).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Io);

  let kinds: Vec<_> = err.diagnostics().iter().map(|d| d.kind).collect();
  assert_eq!(kinds, vec![ErrorKind::UnknownKeyword, ErrorKind::Io]);
  assert!(err.to_string().contains("connection reset"));
}

#[test]
fn test_io_error_in_library_is_fatal() {
  let mut resolver =
    |_: &str| -> io::Result<FailingReader> { Ok(FailingReader { served: true }) };
  let input = "mtllib a.mtl\n".as_bytes();
  let err = parse_obj(input, &mut resolver, &ParseOptions::default()).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Io);
  assert_eq!(err.diagnostics().last().unwrap().file, "a.mtl");
}

#[test]
fn test_continuation_and_comments() {
  let obj = "# a quad\r\nv 0 0 0\r\nv 1 0 0\r\nv 1 1 0\r\nv 0 1 0\r\nf 1 2 \\\r\n  3 4 # closing corner\r\n";
  let scene = parse(obj);
  assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);
  assert_eq!(positions(&scene), vec![vec![0, 1, 2], vec![0, 2, 3]]);
}
