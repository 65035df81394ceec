//! A human-readable overview of a parsed scene.
use std::fmt;

use crate::mtl::{Color, Material};
use crate::obj::VTNIndex;
use crate::scene::Scene;

/// How many entries of each section [`Scene::summary`] lists before eliding
/// the rest. `None` lists everything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryOptions {
  #[allow(missing_docs)]
  pub vertices: Option<usize>,
  #[allow(missing_docs)]
  pub tex_vertices: Option<usize>,
  #[allow(missing_docs)]
  pub normals: Option<usize>,
  #[allow(missing_docs)]
  pub parameters: Option<usize>,
  #[allow(missing_docs)]
  pub materials: Option<usize>,
  /// Faces listed per object.
  pub faces: Option<usize>,
}

impl Default for SummaryOptions {
  fn default() -> SummaryOptions {
    SummaryOptions {
      vertices: Some(10),
      tex_vertices: Some(10),
      normals: Some(10),
      parameters: Some(10),
      materials: None,
      faces: Some(5),
    }
  }
}

impl SummaryOptions {
  /// Lists every entry of every section.
  pub fn unlimited() -> SummaryOptions {
    SummaryOptions {
      vertices: None,
      tex_vertices: None,
      normals: None,
      parameters: None,
      materials: None,
      faces: None,
    }
  }
}

/// A [`Scene`] formatted through [`fmt::Display`]. Created by
/// [`Scene::summary`].
#[derive(Clone, Copy, Debug)]
pub struct Summary<'a> {
  pub(crate) scene: &'a Scene,
  pub(crate) options: &'a SummaryOptions,
}

/// Writes the heading and the first `limit` items of one section.
fn section<T, F>(
  f: &mut fmt::Formatter<'_>,
  title: &str,
  noun: &str,
  items: &[T],
  limit: Option<usize>,
  mut item: F,
) -> fmt::Result
where
  F: FnMut(&mut fmt::Formatter<'_>, usize, &T) -> fmt::Result,
{
  if items.is_empty() {
    return Ok(());
  }
  writeln!(f)?;
  writeln!(f, "{}", title)?;
  let shown = limit.map_or(items.len(), |l| l.min(items.len()));
  for (i, x) in items[..shown].iter().enumerate() {
    item(f, i, x)?;
  }
  if shown < items.len() {
    writeln!(f, "  ... and {} more {}", items.len() - shown, noun)?;
  }
  Ok(())
}

fn write_color(f: &mut fmt::Formatter<'_>, label: &str, c: &Color) -> fmt::Result {
  writeln!(f, "    {} {:.3} {:.3} {:.3}", label, c[0], c[1], c[2])
}

fn write_material(f: &mut fmt::Formatter<'_>, i: usize, m: &Material) -> fmt::Result {
  writeln!(f, "  Material {}: {}", i, m.name)?;
  write_color(f, "Ka", &m.ambient)?;
  write_color(f, "Kd", &m.diffuse)?;
  write_color(f, "Ks", &m.specular)?;
  write_color(f, "Ke", &m.emissive)?;
  write_color(f, "Tf", &m.transmission_filter)?;
  writeln!(
    f,
    "    Ns: {:.3}, Ni: {:.3}, d: {:.3}, illum: {}",
    m.shininess, m.optical_density, m.opacity, m.illumination_model
  )?;
  for (kind, path) in &m.textures {
    writeln!(f, "    {}: {}", kind.keyword(), path)?;
  }
  Ok(())
}

/// Writes a corner the way an `f` statement would, with 1-based indices.
fn write_corner(f: &mut fmt::Formatter<'_>, &(v, vt, vn): &VTNIndex) -> fmt::Result {
  write!(f, "{}", v + 1)?;
  match (vt, vn) {
    (None, None) => Ok(()),
    (Some(t), None) => write!(f, "/{}", t + 1),
    (None, Some(n)) => write!(f, "//{}", n + 1),
    (Some(t), Some(n)) => write!(f, "/{}/{}", t + 1, n + 1),
  }
}

impl fmt::Display for Summary<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let scene = self.scene;
    let options = self.options;

    writeln!(f, "Vertices: {}", scene.vertices.len())?;
    writeln!(f, "Texture vertices: {}", scene.tex_vertices.len())?;
    writeln!(f, "Normals: {}", scene.normals.len())?;
    writeln!(f, "Parameters: {}", scene.parameters.len())?;
    writeln!(f, "Materials: {}", scene.materials.len())?;
    writeln!(f, "Objects: {}", scene.objects.len())?;
    writeln!(f, "Faces: {}", scene.faces.len())?;
    writeln!(f, "Lines: {}", scene.lines.len())?;
    writeln!(f, "Diagnostics: {}", scene.diagnostics.len())?;

    section(f, "Vertices", "vertices", &scene.vertices, options.vertices, |f, _, v| {
      write!(f, "  v {:.3} {:.3} {:.3}", v.x, v.y, v.z)?;
      if v.w != 1.0 {
        write!(f, " {:.3}", v.w)?;
      }
      writeln!(f)
    })?;
    section(
      f,
      "Texture vertices",
      "texture vertices",
      &scene.tex_vertices,
      options.tex_vertices,
      |f, _, t| writeln!(f, "  vt {:.3} {:.3} {:.3}", t.u, t.v, t.w),
    )?;
    section(f, "Normals", "normals", &scene.normals, options.normals, |f, _, n| {
      writeln!(f, "  vn {:.3} {:.3} {:.3}", n.x, n.y, n.z)
    })?;
    section(
      f,
      "Parameters",
      "parameters",
      &scene.parameters,
      options.parameters,
      |f, _, p| writeln!(f, "  vp {:.3} {:.3} {:.3}", p.u, p.v, p.w),
    )?;

    let materials: Vec<&Material> = scene.materials.iter().collect();
    section(f, "Materials", "materials", &materials, options.materials, |f, i, m| {
      write_material(f, i, m)
    })?;

    section(f, "Objects", "objects", &scene.objects, None, |f, i, o| {
      writeln!(
        f,
        "  Object {}: {} (faces: {}, lines: {})",
        i,
        o.name,
        o.faces.len(),
        o.lines.len()
      )?;
      let faces = scene.object_faces(o);
      let shown = options.faces.map_or(faces.len(), |l| l.min(faces.len()));
      for (j, face) in faces[..shown].iter().enumerate() {
        write!(f, "    Face {}|{}: [", j, o.faces.start + j)?;
        for (k, corner) in face.vertices.iter().enumerate() {
          if k > 0 {
            write!(f, " ")?;
          }
          write_corner(f, corner)?;
        }
        write!(f, "]")?;
        match &face.material {
          Some(name) => writeln!(f, " {}", name)?,
          None => writeln!(f)?,
        }
      }
      if shown < faces.len() {
        writeln!(f, "    ... and {} more faces", faces.len() - shown)?;
      }
      Ok(())
    })
  }
}

#[cfg(test)]
fn scene(input: &str) -> Scene {
  crate::obj::parse(
    input.as_bytes(),
    &mut crate::resolve::NoResolver,
    &crate::options::ParseOptions::default(),
  )
  .unwrap()
}

#[test]
fn test_summary_counts() {
  let s = scene("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\no tri\nf 1//1 2//1 3//1\n");
  let text = s.to_string();

  assert!(text.starts_with("Vertices: 3\nTexture vertices: 0\nNormals: 1\n"));
  assert!(text.contains("Objects: 1\nFaces: 1\n"));
  assert!(text.contains("  v 1.000 0.000 0.000\n"));
  assert!(text.contains("  Object 0: tri (faces: 1, lines: 0)\n"));
  assert!(text.contains("    Face 0|0: [1//1 2//1 3//1]\n"));
  assert!(!text.contains("Texture vertices\n"));
  assert!(!text.contains("more"));
}

#[test]
fn test_summary_truncates() {
  let mut input = String::new();
  for i in 0..12 {
    input.push_str(&format!("v {} 0 0\n", i));
  }
  for i in 1..=8 {
    input.push_str(&format!("f {} {} {}\n", i, i + 1, i + 2));
  }
  let s = scene(&input);

  let text = s.summary(&SummaryOptions::default()).to_string();
  assert!(text.contains("  v 9.000 0.000 0.000\n  ... and 2 more vertices\n"));
  assert!(!text.contains("v 10.000"));
  assert!(text.contains("    Face 4|4: [5 6 7]\n    ... and 3 more faces\n"));

  let text = s.summary(&SummaryOptions::unlimited()).to_string();
  assert!(text.contains("  v 11.000 0.000 0.000\n"));
  assert!(text.contains("    Face 7|7: [8 9 10]\n"));
  assert!(!text.contains("more"));
}

#[test]
fn test_summary_materials() {
  let obj = "mtllib m.mtl\nv 0 0 0\nusemtl Red\nf 1 1 1\n";
  let mut resolver = |_: &str| -> std::io::Result<&'static [u8]> {
    Ok(&b"newmtl Red\nKd 1 0 0\nmap_Kd red.png\nnewmtl Blue\nKd 0 0 1\n"[..])
  };
  let s = crate::obj::parse(
    obj.as_bytes(),
    &mut resolver,
    &crate::options::ParseOptions::default(),
  )
  .unwrap();

  let options = SummaryOptions {
    materials: Some(1),
    ..SummaryOptions::default()
  };
  let text = s.summary(&options).to_string();
  assert!(text.contains("  Material 0: Red\n"));
  assert!(text.contains("    Kd 1.000 0.000 0.000\n"));
  assert!(text.contains("    map_Kd: red.png\n"));
  assert!(text.contains("  ... and 1 more materials\n"));
  assert!(text.contains("    Face 0|0: [1 1 1] Red\n"));
}
