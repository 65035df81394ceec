use std::fs;

use wavefront_scene::{load_mtl, load_obj, ErrorKind, ParseOptions, TextureKind};

static CUBE_OBJ: &str = "mtllib cube.mtl
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
usemtl white
f 1 2 3 4
f 2 6 7 3
f 6 5 8 7
f 5 1 4 8
f 4 3 7 8
f 5 6 2 1
";

static CUBE_MTL: &str = "newmtl white
Kd 1.0 1.0 1.0
illum 2
map_Kd -o 0 0 textures/white.png
";

#[test]
fn test_load_cube() {
  let dir = tempfile::tempdir().unwrap();
  fs::write(dir.path().join("cube.obj"), CUBE_OBJ).unwrap();
  fs::write(dir.path().join("cube.mtl"), CUBE_MTL).unwrap();

  let scene = load_obj(dir.path().join("cube.obj"), &ParseOptions::default()).unwrap();
  assert!(scene.diagnostics.is_empty(), "{:?}", scene.diagnostics);
  assert_eq!(scene.vertices.len(), 8);
  assert!(scene.tex_vertices.is_empty());
  assert!(scene.normals.is_empty());
  assert_eq!(scene.faces.len(), 12);
  assert_eq!(scene.triangles().count(), 12);
  assert!(scene.validate());

  let white = scene.material_of(&scene.faces[11]).unwrap();
  assert_eq!(white.diffuse, [1.0, 1.0, 1.0]);
  assert_eq!(white.illumination_model, 2);
  assert_eq!(white.texture(TextureKind::Diffuse), Some("textures/white.png"));
}

#[test]
fn test_load_missing_library() {
  let dir = tempfile::tempdir().unwrap();
  fs::write(dir.path().join("cube.obj"), CUBE_OBJ).unwrap();

  let scene = load_obj(dir.path().join("cube.obj"), &ParseOptions::default()).unwrap();
  let kinds: Vec<_> = scene.diagnostics.iter().map(|d| d.kind).collect();
  assert_eq!(kinds, vec![ErrorKind::FileNotFound, ErrorKind::UnresolvedMaterial]);
  assert!(scene.faces.iter().all(|f| f.material.is_none()));
}

#[test]
fn test_load_mtl() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("cube.mtl");
  fs::write(&path, CUBE_MTL).unwrap();

  let (materials, diagnostics) = load_mtl(&path, &ParseOptions::default()).unwrap();
  assert!(diagnostics.is_empty());
  assert_eq!(materials.len(), 1);
  assert_eq!(materials.get("white").unwrap().diffuse, [1.0, 1.0, 1.0]);
}

#[test]
fn test_load_nonexistent_file() {
  let dir = tempfile::tempdir().unwrap();
  let err = load_obj(dir.path().join("nope.obj"), &ParseOptions::default()).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Io);
  assert_eq!(err.diagnostics().len(), 1);
}
