use crate::mtl::MaterialSet;
use crate::obj::{
  Face, GroupName, Normal, Object, ParamVertex, Polyline, TVertex, TextureIndex, VTNIndex, Vertex,
  VertexIndex,
};
use crate::scene::Scene;
use crate::util::PoolSizes;

/// Name of the object faces belong to before the first `o` statement.
pub(crate) const DEFAULT_OBJECT: &str = "default";

/// Everything one `.obj` parse accumulates. Owned by a single invocation and
/// threaded through the statement handlers by `&mut`.
pub(crate) struct Context {
  vertices: Vec<Vertex>,
  tex_vertices: Vec<TVertex>,
  normals: Vec<Normal>,
  parameters: Vec<ParamVertex>,

  faces: Vec<Face>,
  lines: Vec<Polyline>,
  objects: Vec<Object>,

  name: String, // object name
  object_first_face: usize,
  object_first_line: usize,

  material_name: Option<String>,
  current_groups: Vec<GroupName>,
  current_smoothing_group: u32,

  // Each distinct `usemtl` name with the line it was first bound on.
  material_uses: Vec<(String, usize)>,
  material_libraries: Vec<String>,
}

impl Context {
  pub(crate) fn new() -> Self {
    Context {
      vertices: vec![],
      tex_vertices: vec![],
      normals: vec![],
      parameters: vec![],
      faces: vec![],
      lines: vec![],
      objects: vec![],
      name: DEFAULT_OBJECT.to_string(),
      object_first_face: 0,
      object_first_line: 0,
      material_name: None,
      current_groups: vec![],
      current_smoothing_group: 0,
      material_uses: vec![],
      material_libraries: vec![],
    }
  }

  /// Pool lengths right now; relative indices resolve against these.
  pub(crate) fn sizes(&self) -> PoolSizes {
    PoolSizes {
      vertices: self.vertices.len(),
      tex_vertices: self.tex_vertices.len(),
      normals: self.normals.len(),
    }
  }

  /// Closes the current object. Objects without any element are dropped.
  fn close_object(&mut self) {
    let faces = self.object_first_face..self.faces.len();
    let lines = self.object_first_line..self.lines.len();
    if !faces.is_empty() || !lines.is_empty() {
      self.objects.push(Object {
        name: std::mem::take(&mut self.name),
        faces,
        lines,
      });
    }
    self.object_first_face = self.faces.len();
    self.object_first_line = self.lines.len();
  }

  pub(crate) fn set_name(&mut self, name: String) {
    self.close_object();
    self.name = name;
  }

  pub(crate) fn set_material_name(&mut self, material_name: String, line_number: usize) {
    if !self.material_uses.iter().any(|(n, _)| *n == material_name) {
      self.material_uses.push((material_name.clone(), line_number));
    }
    self.material_name = Some(material_name);
  }

  pub(crate) fn set_current_groups(&mut self, names: Vec<GroupName>) {
    self.current_groups = names;
  }

  pub(crate) fn set_current_smoothing_group(&mut self, group: u32) {
    self.current_smoothing_group = group;
  }

  pub(crate) fn add_material_library(&mut self, name: &str) {
    self.material_libraries.push(name.to_owned());
  }

  pub(crate) fn add_vertex(&mut self, v: Vertex) {
    self.vertices.push(v);
  }

  pub(crate) fn add_tex_vertex(&mut self, v: TVertex) {
    self.tex_vertices.push(v);
  }

  pub(crate) fn add_normal(&mut self, v: Normal) {
    self.normals.push(v);
  }

  pub(crate) fn add_parameter(&mut self, v: ParamVertex) {
    self.parameters.push(v);
  }

  /// Adds one assembled polygon, tagged with the current state.
  pub(crate) fn add_face(&mut self, vertices: Vec<VTNIndex>) {
    self.faces.push(Face {
      vertices,
      material: self.material_name.clone(),
      object: self.objects.len(),
      groups: self.current_groups.clone(),
      smoothing_group: self.current_smoothing_group,
    });
  }

  pub(crate) fn add_line(&mut self, vertices: Vec<(VertexIndex, Option<TextureIndex>)>) {
    self.lines.push(Polyline {
      vertices,
      material: self.material_name.clone(),
      object: self.objects.len(),
      groups: self.current_groups.clone(),
    });
  }

  /// Moves the accumulated geometry into a scene, along with the `usemtl`
  /// names that still need checking against `materials`.
  pub(crate) fn finish(mut self, materials: MaterialSet) -> (Scene, Vec<(String, usize)>) {
    self.close_object();

    let scene = Scene {
      vertices: self.vertices,
      tex_vertices: self.tex_vertices,
      normals: self.normals,
      parameters: self.parameters,
      faces: self.faces,
      lines: self.lines,
      objects: self.objects,
      materials,
      material_libraries: self.material_libraries,
      diagnostics: vec![],
    };
    (scene, self.material_uses)
  }
}

#[cfg(test)]
fn v(x: f64) -> Vertex {
  Vertex {
    x,
    y: 0.0,
    z: 0.0,
    w: 1.0,
    color: None,
  }
}

#[test]
fn test_object_partition() {
  let mut context = Context::new();
  for i in 0..3 {
    context.add_vertex(v(i as f64));
  }
  context.add_face(vec![(0, None, None), (1, None, None), (2, None, None)]);
  context.set_name("empty".to_string());
  context.set_name("cube".to_string());
  context.add_face(vec![(2, None, None), (1, None, None), (0, None, None)]);
  context.add_line(vec![(0, None), (1, None)]);

  let (scene, _) = context.finish(MaterialSet::new());
  let names: Vec<&str> = scene.objects.iter().map(|o| o.name.as_str()).collect();
  assert_eq!(names, vec![DEFAULT_OBJECT, "cube"]);
  assert_eq!(scene.objects[0].faces, 0..1);
  assert_eq!(scene.objects[1].faces, 1..2);
  assert_eq!(scene.objects[1].lines, 0..1);
  assert_eq!(scene.faces[1].object, 1);
  assert_eq!(scene.lines[0].object, 1);
}

#[test]
fn test_state_is_inherited() {
  let mut context = Context::new();
  context.set_material_name("red".to_string(), 4);
  context.set_current_groups(vec!["a".to_string(), "b".to_string()]);
  context.set_current_smoothing_group(3);
  context.add_face(vec![]);
  context.set_material_name("red".to_string(), 9);

  let (scene, uses) = context.finish(MaterialSet::new());
  let face = &scene.faces[0];
  assert_eq!(face.material.as_deref(), Some("red"));
  assert_eq!(face.groups, vec!["a".to_string(), "b".to_string()]);
  assert_eq!(face.smoothing_group, 3);
  assert_eq!(uses, vec![("red".to_string(), 4)]);
}
