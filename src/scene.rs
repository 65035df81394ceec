//! The result of parsing an `.obj` file.
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Diagnostic, ErrorKind, Issue, ParseError, Reporter};
use crate::mtl::{Material, MaterialSet};
use crate::obj::{fan, Face, Normal, Object, ParamVertex, Polyline, TVertex, VTNIndex, Vertex};
use crate::summary::{Summary, SummaryOptions};

/// Three corners of a triangle.
pub type Triangle = [VTNIndex; 3];

/// Everything read from one `.obj` file and the material libraries it
/// references.
///
/// Faces and lines never hold coordinates, only indices into the vertex
/// pools; every such index is in range.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
  /// `v` statements, in file order.
  pub vertices: Vec<Vertex>,
  /// `vt` statements, in file order.
  pub tex_vertices: Vec<TVertex>,
  /// `vn` statements, in file order.
  pub normals: Vec<Normal>,
  /// `vp` statements, in file order.
  pub parameters: Vec<ParamVertex>,
  /// Every face, in file order.
  pub faces: Vec<Face>,
  /// Every `l` statement, in file order.
  pub lines: Vec<Polyline>,
  /// Partition of `faces` and `lines` into named objects.
  pub objects: Vec<Object>,
  /// Materials from every library that was loaded.
  pub materials: MaterialSet,
  /// Every library named by `mtllib`, loaded or not.
  pub material_libraries: Vec<String>,
  /// Recoverable problems, in the order they were found.
  pub diagnostics: Vec<Diagnostic>,
}

impl Scene {
  /// The material bound to `face`.
  pub fn material_of(&self, face: &Face) -> Option<&Material> {
    face.material.as_deref().and_then(|name| self.materials.get(name))
  }

  /// The faces belonging to `object`.
  pub fn object_faces(&self, object: &Object) -> &[Face] {
    &self.faces[object.faces.clone()]
  }

  /// Faces that have `name` among their groups.
  pub fn faces_in_group<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Face> + 'a {
    self
      .faces
      .iter()
      .filter(move |f| f.groups.iter().any(|g| g == name))
  }

  /// Every group name used by some face, sorted.
  pub fn groups(&self) -> BTreeSet<&str> {
    self
      .faces
      .iter()
      .flat_map(|f| f.groups.iter().map(String::as_str))
      .collect()
  }

  /// Every face as triangles, fanning any face that kept more than three
  /// corners. Each triangle comes with the face it was cut from.
  pub fn triangles(&self) -> impl Iterator<Item = (Triangle, &Face)> + '_ {
    self
      .faces
      .iter()
      .flat_map(|f| fan(&f.vertices).map(move |t| (t, f)))
  }

  /// Checks that every index held by a face or line is inside its pool.
  pub fn validate(&self) -> bool {
    let vertex_ok = |i: usize| i < self.vertices.len();
    let tex_ok = |i: Option<usize>| i.map_or(true, |i| i < self.tex_vertices.len());
    let normal_ok = |i: Option<usize>| i.map_or(true, |i| i < self.normals.len());

    let faces_ok = self.faces.iter().all(|f| {
      f.object < self.objects.len()
        && f
          .vertices
          .iter()
          .all(|&(v, t, n)| vertex_ok(v) && tex_ok(t) && normal_ok(n))
    });
    let lines_ok = self.lines.iter().all(|l| {
      l.object < self.objects.len() && l.vertices.iter().all(|&(v, t)| vertex_ok(v) && tex_ok(t))
    });
    faces_ok && lines_ok
  }

  /// Counts, then the first few entries of each pool, every material and the
  /// first faces of each object, as limited by `options`.
  pub fn summary<'a>(&'a self, options: &'a SummaryOptions) -> Summary<'a> {
    Summary {
      scene: self,
      options,
    }
  }
}

/// Formats [`Scene::summary`] with the default limits.
impl fmt::Display for Scene {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.summary(&SummaryOptions::default()), f)
  }
}

/// Reports every `usemtl` name that matched no loaded material and unbinds it
/// from the faces and lines that used it.
pub(crate) fn resolve_materials(
  scene: &mut Scene,
  material_uses: &[(String, usize)],
  file: &str,
  reporter: &mut Reporter,
) -> Result<(), ParseError> {
  let mut unresolved = Vec::new();
  for (name, line_number) in material_uses {
    if !scene.materials.contains(name) {
      let issue = Issue::new(
        ErrorKind::UnresolvedMaterial,
        format!("material `{}` is not defined by any loaded library", name),
      );
      reporter.report(file, *line_number, issue)?;
      unresolved.push(name.as_str());
    }
  }

  if unresolved.is_empty() {
    return Ok(());
  }

  let is_unresolved = |m: &Option<String>| m.as_deref().map_or(false, |m| unresolved.contains(&m));
  for face in &mut scene.faces {
    if is_unresolved(&face.material) {
      face.material = None;
    }
  }
  for line in &mut scene.lines {
    if is_unresolved(&line.material) {
      line.material = None;
    }
  }
  Ok(())
}

#[cfg(test)]
fn scene(input: &str) -> Scene {
  crate::obj::parse(
    input.as_bytes(),
    &mut crate::resolve::NoResolver,
    &crate::options::ParseOptions::default().with_triangulate(false),
  )
  .unwrap()
}

#[test]
fn test_triangles() {
  let s = scene("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\nf 4 3 2\n");
  assert_eq!(s.faces.len(), 2);

  let tris: Vec<[usize; 3]> = s.triangles().map(|(t, _)| [t[0].0, t[1].0, t[2].0]).collect();
  assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3], [3, 2, 1]]);
}

#[test]
fn test_groups() {
  let s = scene("v 0 0 0\ng a b\nf 1 1 1\ng b\nf 1 1 1\ng\nf 1 1 1\n");
  assert_eq!(s.groups().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
  assert_eq!(s.faces_in_group("b").count(), 2);
  assert_eq!(s.faces_in_group("a").count(), 1);
  assert_eq!(s.faces_in_group("c").count(), 0);
}

#[test]
fn test_object_faces() {
  let s = scene("v 0 0 0\nf 1 1 1\no second\nf 1 1 1\nf 1 1 1\n");
  assert_eq!(s.object_faces(&s.objects[0]).len(), 1);
  assert_eq!(s.object_faces(&s.objects[1]).len(), 2);
}

#[test]
fn test_unresolved_material() {
  let s = scene("v 0 0 0\nusemtl Missing\nf 1 1 1\nl 1 1\nusemtl Missing\nf 1 1 1\n");
  assert_eq!(s.faces.len(), 2);
  assert!(s.faces.iter().all(|f| f.material.is_none()));
  assert!(s.lines[0].material.is_none());

  // Reported once, at the first `usemtl`.
  assert_eq!(s.diagnostics.len(), 1);
  assert_eq!(s.diagnostics[0].kind, ErrorKind::UnresolvedMaterial);
  assert_eq!(s.diagnostics[0].line_number, 2);
}

#[test]
fn test_validate() {
  let mut s = scene("v 0 0 0\nvt 0 0\nf 1/1 1/1 1/1\n");
  assert!(s.validate());

  s.faces[0].vertices[1].1 = Some(1);
  assert!(!s.validate());
}
