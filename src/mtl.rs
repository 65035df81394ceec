//! A parser for Wavefront's `.mtl` material library format.
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::io::Read;

use crate::error::{Diagnostic, ErrorKind, Issue, ParseError, Reporter};
use crate::lex::{Line, LineReader};
use crate::options::ParseOptions;
use crate::util::{parse_float, parse_floats, parse_int};

/// An RGB color.
pub type Color = [f64; 3];

/// The channel a texture map is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureKind {
  /// `map_Ka`
  Ambient,
  /// `map_Kd`
  Diffuse,
  /// `map_Ks`
  Specular,
  /// `map_Ke`
  Emissive,
  /// `map_Ns`
  SpecularExponent,
  /// `map_d` and `map_Tr`
  Dissolve,
  /// `map_Bump`, `map_bump` and `bump`
  Bump,
  /// `disp` and `map_disp`
  Displacement,
  /// `decal`
  Decal,
  /// `refl`
  Reflection,
}

impl TextureKind {
  fn from_keyword(keyword: &str) -> Option<TextureKind> {
    Some(match keyword {
      "map_Ka" => TextureKind::Ambient,
      "map_Kd" => TextureKind::Diffuse,
      "map_Ks" => TextureKind::Specular,
      "map_Ke" => TextureKind::Emissive,
      "map_Ns" => TextureKind::SpecularExponent,
      "map_d" | "map_Tr" => TextureKind::Dissolve,
      "map_Bump" | "map_bump" | "bump" => TextureKind::Bump,
      "disp" | "map_disp" => TextureKind::Displacement,
      "decal" => TextureKind::Decal,
      "refl" => TextureKind::Reflection,
      _ => return None,
    })
  }

  /// The statement that binds this kind of texture.
  pub(crate) fn keyword(self) -> &'static str {
    match self {
      TextureKind::Ambient => "map_Ka",
      TextureKind::Diffuse => "map_Kd",
      TextureKind::Specular => "map_Ks",
      TextureKind::Emissive => "map_Ke",
      TextureKind::SpecularExponent => "map_Ns",
      TextureKind::Dissolve => "map_d",
      TextureKind::Bump => "map_Bump",
      TextureKind::Displacement => "disp",
      TextureKind::Decal => "decal",
      TextureKind::Reflection => "refl",
    }
  }
}

/// A single material from a `.mtl` file.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
  /// The name given by `newmtl`.
  pub name: String,
  /// `Ka`
  pub ambient: Color,
  /// `Kd`
  pub diffuse: Color,
  /// `Ks`
  pub specular: Color,
  /// `Ke`
  pub emissive: Color,
  /// `Tf`
  pub transmission_filter: Color,
  /// `Ns`, the specular exponent.
  pub shininess: f64,
  /// `Ni`, the index of refraction.
  pub optical_density: f64,
  /// `d`, or `1 - Tr`. 1.0 is fully opaque.
  pub opacity: f64,
  /// `illum`
  pub illumination_model: u32,
  /// Texture file paths, as written in the library. The files themselves are
  /// never opened.
  pub textures: BTreeMap<TextureKind, String>,
}

impl Material {
  /// A material with the format's default properties.
  pub fn new<S: Into<String>>(name: S) -> Material {
    Material {
      name: name.into(),
      ambient: [0.0; 3],
      diffuse: [0.6; 3],
      specular: [0.0; 3],
      emissive: [0.0; 3],
      transmission_filter: [1.0; 3],
      shininess: 0.0,
      optical_density: 1.0,
      opacity: 1.0,
      illumination_model: 2,
      textures: BTreeMap::new(),
    }
  }

  /// The texture bound to `kind`, if any.
  pub fn texture(&self, kind: TextureKind) -> Option<&str> {
    self.textures.get(&kind).map(String::as_str)
  }
}

/// Materials keyed by name, in the order they were first defined.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialSet {
  materials: Vec<Material>,
  by_name: HashMap<String, usize>,
}

impl MaterialSet {
  /// An empty set.
  pub fn new() -> MaterialSet {
    MaterialSet::default()
  }

  /// Adds `material`, replacing and returning any material of the same name.
  /// A replaced material keeps its position.
  pub fn insert(&mut self, material: Material) -> Option<Material> {
    match self.by_name.get(&material.name) {
      Some(&i) => Some(std::mem::replace(&mut self.materials[i], material)),
      None => {
        self.by_name.insert(material.name.clone(), self.materials.len());
        self.materials.push(material);
        None
      }
    }
  }

  /// Looks a material up by name.
  pub fn get(&self, name: &str) -> Option<&Material> {
    self.by_name.get(name).map(|&i| &self.materials[i])
  }

  /// Whether a material called `name` has been defined.
  pub fn contains(&self, name: &str) -> bool {
    self.by_name.contains_key(name)
  }

  /// Number of distinct materials.
  pub fn len(&self) -> usize {
    self.materials.len()
  }

  /// Whether no material has been defined.
  pub fn is_empty(&self) -> bool {
    self.materials.is_empty()
  }

  /// Iterates in definition order.
  pub fn iter(&self) -> std::slice::Iter<'_, Material> {
    self.materials.iter()
  }
}

impl<'a> IntoIterator for &'a MaterialSet {
  type Item = &'a Material;
  type IntoIter = std::slice::Iter<'a, Material>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

/// Number of arguments taken by each texture option, as `(min, max)`. Options
/// with a variable count take numeric arguments only.
fn texture_option_arity(option: &str) -> Option<(usize, usize)> {
  Some(match option {
    "-blendu" | "-blendv" | "-bm" | "-boost" | "-cc" | "-clamp" | "-imfchan" | "-texres"
    | "-type" => (1, 1),
    "-mm" => (2, 2),
    "-o" | "-s" | "-t" => (1, 3),
    _ => return None,
  })
}

/// Skips texture options and returns the path that follows them. Paths may
/// contain spaces.
fn parse_texture_path(args: &[String]) -> Result<String, Issue> {
  let mut i = 0;
  while i < args.len() && args[i].starts_with('-') {
    let (min, max) = match texture_option_arity(&args[i]) {
      Some(arity) => arity,
      None => {
        log::debug!("skipping unknown texture option `{}`", args[i]);
        i += 1;
        continue;
      }
    };
    i += 1;

    let mut taken = 0;
    while taken < max && i < args.len() {
      if taken >= min && parse_float(&args[i]).is_err() {
        break;
      }
      i += 1;
      taken += 1;
    }
    if taken < min {
      return Err(Issue::malformed(format!(
        "texture option `{}` is missing its argument",
        args[i - 1 - taken]
      )));
    }
  }

  if i >= args.len() {
    return Err(Issue::malformed("texture statement has no file name"));
  }
  Ok(args[i..].join(" "))
}

fn parse_color(keyword: &str, args: &[String]) -> Result<Color, Issue> {
  let values = parse_floats(args)?;
  match values.len() {
    1 => Ok([values[0]; 3]),
    3 => Ok([values[0], values[1], values[2]]),
    _ => Err(Issue::malformed(format!(
      "`{}` takes 1 or 3 numbers but got {}",
      keyword,
      values.len()
    ))),
  }
}

fn parse_scalar(keyword: &str, args: &[String]) -> Result<f64, Issue> {
  match args {
    [x] => parse_float(x),
    _ => Err(Issue::malformed(format!(
      "`{}` takes 1 number but got {}",
      keyword,
      args.len()
    ))),
  }
}

/// Applies one property statement to `material`.
fn apply_property(material: &mut Material, line: &Line) -> Result<(), Issue> {
  let keyword = line.keyword();
  let args = line.args();

  match keyword {
    "Ka" => material.ambient = parse_color(keyword, args)?,
    "Kd" => material.diffuse = parse_color(keyword, args)?,
    "Ks" => material.specular = parse_color(keyword, args)?,
    "Ke" => material.emissive = parse_color(keyword, args)?,
    "Tf" => material.transmission_filter = parse_color(keyword, args)?,
    "Ns" => material.shininess = parse_scalar(keyword, args)?,
    "Ni" => material.optical_density = parse_scalar(keyword, args)?,
    "d" => {
      let args = match args.first().map(String::as_str) {
        Some("-halo") => &args[1..],
        _ => args,
      };
      material.opacity = parse_scalar(keyword, args)?;
    }
    "Tr" => material.opacity = 1.0 - parse_scalar(keyword, args)?,
    "illum" => {
      let model = match args {
        [x] => parse_int(x)?,
        _ => return Err(Issue::malformed("`illum` takes 1 integer")),
      };
      material.illumination_model = u32::try_from(model).map_err(|_| {
        Issue::new(
          ErrorKind::InvalidNumber,
          format!("illumination model {} is negative", model),
        )
      })?;
    }
    _ => match TextureKind::from_keyword(keyword) {
      Some(kind) => {
        let path = parse_texture_path(args)?;
        material.textures.insert(kind, path);
      }
      None => {
        return Err(Issue::new(
          ErrorKind::UnknownKeyword,
          format!("unknown material statement `{}`", keyword),
        ))
      }
    },
  }
  Ok(())
}

fn duplicate(name: &str) -> Issue {
  Issue::new(
    ErrorKind::DuplicateMaterialName,
    format!("material `{}` is defined again and replaces the earlier definition", name),
  )
}

/// Reads one material library into `materials`. Shared by standalone `.mtl`
/// parsing and `mtllib` statements, so duplicate names are detected across
/// every library of an `.obj` file.
pub(crate) fn read_library<R: Read>(
  input: R,
  file: &str,
  options: &ParseOptions,
  materials: &mut MaterialSet,
  reporter: &mut Reporter,
) -> Result<(), ParseError> {
  log::info!("parsing material library {}", file);

  let mut lines = LineReader::new(input, options.max_line_length);
  let mut current: Option<Material> = None;
  let mut count = 0;

  loop {
    let line = match lines.next() {
      Some(Ok(line)) => line,
      Some(Err(e)) => return Err(reporter.io(file, lines.physical_line(), e)),
      None => break,
    };

    let result = if line.overlong {
      Err(Issue::malformed(format!(
        "line exceeds the maximum length of {} bytes",
        options.max_line_length
      )))
    } else if line.keyword() == "newmtl" {
      if let Some(done) = current.take() {
        count += 1;
        materials.insert(done);
      }
      if line.args().is_empty() {
        Err(Issue::malformed("`newmtl` needs a material name"))
      } else {
        let name = line.rest();
        let issue = materials.contains(&name).then(|| duplicate(&name));
        current = Some(Material::new(name));
        issue.map_or(Ok(()), Err)
      }
    } else {
      match current {
        Some(ref mut material) => apply_property(material, &line),
        None => Err(Issue::malformed(format!(
          "`{}` appears before any `newmtl` and is ignored",
          line.keyword()
        ))),
      }
    };

    if let Err(issue) = result {
      reporter.report(file, line.number, issue)?;
    }
  }

  if let Some(done) = current.take() {
    count += 1;
    materials.insert(done);
  }

  log::info!("parsed {} materials from {}", count, file);
  Ok(())
}

/// Parses a wavefront `.mtl` file on its own, returning the materials it
/// defines together with every recoverable problem found on the way.
pub fn parse<R: Read>(
  input: R,
  options: &ParseOptions,
) -> Result<(MaterialSet, Vec<Diagnostic>), ParseError> {
  let mut materials = MaterialSet::new();
  let mut reporter = Reporter::new(options.strict);
  read_library(input, "<mtl>", options, &mut materials, &mut reporter)?;
  Ok((materials, reporter.into_diagnostics()))
}

#[cfg(test)]
fn parse_str(input: &str) -> (MaterialSet, Vec<Diagnostic>) {
  parse(input.as_bytes(), &ParseOptions::default()).unwrap()
}

#[test]
fn test_parse() {
  let test_case = r#"
# Blender MTL File: 'None'
# Material Count: 2

newmtl Material
Ns 96.078431
Ka 0.000000 0.000000 0.000000
Kd 0.640000 0.640000 0.640000
Ks 0.500000 0.500000 0.500000
Ni 1.000000
d 1.000000
illum 2
map_Kd tex/diffuse.png

newmtl None
Ns 0
Ka 0.1
Kd 0.8 0.8 0.8
Tr 0.25
illum 1
"#;

  let (materials, diagnostics) = parse_str(test_case);
  assert!(diagnostics.is_empty(), "{:?}", diagnostics);
  assert_eq!(materials.len(), 2);

  let names: Vec<&str> = materials.iter().map(|m| m.name.as_str()).collect();
  assert_eq!(names, vec!["Material", "None"]);

  let m = materials.get("Material").unwrap();
  assert_eq!(m.shininess, 96.078431);
  assert_eq!(m.diffuse, [0.64, 0.64, 0.64]);
  assert_eq!(m.specular, [0.5, 0.5, 0.5]);
  assert_eq!(m.opacity, 1.0);
  assert_eq!(m.illumination_model, 2);
  assert_eq!(m.texture(TextureKind::Diffuse), Some("tex/diffuse.png"));

  let none = materials.get("None").unwrap();
  assert_eq!(none.ambient, [0.1, 0.1, 0.1]);
  assert_eq!(none.opacity, 0.75);
  assert_eq!(none.illumination_model, 1);
}

#[test]
fn test_defaults() {
  let (materials, _) = parse_str("newmtl plain\n");
  let m = materials.get("plain").unwrap();
  assert_eq!(*m, Material::new("plain"));
  assert_eq!(m.diffuse, [0.6; 3]);
  assert_eq!(m.illumination_model, 2);
  assert_eq!(m.opacity, 1.0);
}

#[test]
fn test_texture_options() {
  let test_case = r#"
newmtl skin
map_Kd -blendu off -o 0.5 0.5 -mm 0 1 my textures/skin albedo.png
map_Bump -bm 0.3 normal.png
bump -imfchan l height.png
map_d -s 2 mask.png
decal -clamp on decal.tga
"#;

  let (materials, diagnostics) = parse_str(test_case);
  assert!(diagnostics.is_empty(), "{:?}", diagnostics);

  let m = materials.get("skin").unwrap();
  assert_eq!(
    m.texture(TextureKind::Diffuse),
    Some("my textures/skin albedo.png")
  );
  // `bump` is a synonym for `map_Bump`; the later statement wins.
  assert_eq!(m.texture(TextureKind::Bump), Some("height.png"));
  assert_eq!(m.texture(TextureKind::Dissolve), Some("mask.png"));
  assert_eq!(m.texture(TextureKind::Decal), Some("decal.tga"));
}

#[test]
fn test_texture_without_file() {
  let (materials, diagnostics) = parse_str("newmtl a\nmap_Kd -clamp on\n");
  assert_eq!(diagnostics.len(), 1);
  assert_eq!(diagnostics[0].kind, ErrorKind::MalformedStatement);
  assert_eq!(diagnostics[0].line_number, 2);
  assert_eq!(materials.get("a").unwrap().texture(TextureKind::Diffuse), None);
}

#[test]
fn test_property_before_newmtl() {
  let (materials, diagnostics) = parse_str("Kd 1 0 0\nnewmtl a\n");
  assert_eq!(materials.len(), 1);
  assert_eq!(diagnostics.len(), 1);
  assert_eq!(diagnostics[0].kind, ErrorKind::MalformedStatement);
  assert_eq!(diagnostics[0].line_number, 1);
  assert_eq!(materials.get("a").unwrap().diffuse, [0.6; 3]);
}

#[test]
fn test_unknown_and_bad_values() {
  let test_case = "newmtl a\nPr 0.5\nKd 1 x 0\nNs\nd -halo 0.5\n";
  let (materials, diagnostics) = parse_str(test_case);

  let kinds: Vec<_> = diagnostics.iter().map(|d| (d.line_number, d.kind)).collect();
  assert_eq!(
    kinds,
    vec![
      (2, ErrorKind::UnknownKeyword),
      (3, ErrorKind::InvalidNumber),
      (4, ErrorKind::MalformedStatement),
    ]
  );

  let m = materials.get("a").unwrap();
  assert_eq!(m.diffuse, [0.6; 3]);
  assert_eq!(m.opacity, 0.5);
}

#[test]
fn test_duplicate_names() {
  let (materials, diagnostics) = parse_str("newmtl a\nKd 1 0 0\nnewmtl b\nnewmtl a\nKd 0 1 0\n");
  assert_eq!(materials.len(), 2);
  assert_eq!(materials.get("a").unwrap().diffuse, [0.0, 1.0, 0.0]);
  // The replaced record keeps its slot.
  assert_eq!(materials.iter().next().unwrap().name, "a");

  assert_eq!(diagnostics.len(), 1);
  assert_eq!(diagnostics[0].kind, ErrorKind::DuplicateMaterialName);
  assert_eq!(diagnostics[0].line_number, 4);
}

#[test]
fn test_duplicate_reported_before_its_properties() {
  let (_, diagnostics) = parse_str("newmtl a\nnewmtl a\nKd x 0 0\n");
  let found: Vec<_> = diagnostics.iter().map(|d| (d.line_number, d.kind)).collect();
  assert_eq!(
    found,
    vec![
      (2, ErrorKind::DuplicateMaterialName),
      (3, ErrorKind::InvalidNumber),
    ]
  );
}

#[test]
fn test_material_names_with_spaces() {
  let (materials, _) = parse_str("newmtl Brushed  Steel\nKd 0.5 0.5 0.5\n");
  assert!(materials.contains("Brushed Steel"));
}

#[test]
fn test_strict() {
  let options = ParseOptions::default().with_strict(true);
  let err = parse("newmtl a\nPr 0.5\nKd 1 0 0\n".as_bytes(), &options).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::UnknownKeyword);
  assert_eq!(err.diagnostics().len(), 1);
  assert_eq!(err.diagnostics()[0].line_number, 2);
}
