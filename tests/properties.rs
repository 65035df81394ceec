use proptest::prelude::*;

use wavefront_scene::{parse_obj, NoResolver, ParseOptions, Scene};

fn parse(input: &str, options: &ParseOptions) -> Scene {
  parse_obj(input.as_bytes(), &mut NoResolver, options).unwrap()
}

fn coordinate() -> impl Strategy<Value = f64> {
  (-1.0e6..1.0e6f64).prop_map(|x| (x * 1000.0).round() / 1000.0)
}

proptest! {
  #[test]
  fn every_vertex_is_kept_in_order(coords in prop::collection::vec((coordinate(), coordinate(), coordinate()), 0..64)) {
    let input: String = coords
      .iter()
      .map(|(x, y, z)| format!("v {} {} {}\n", x, y, z))
      .collect();

    let scene = parse(&input, &ParseOptions::default());
    prop_assert!(scene.diagnostics.is_empty());
    prop_assert_eq!(scene.vertices.len(), coords.len());
    for (v, &(x, y, z)) in scene.vertices.iter().zip(coords.iter()) {
      prop_assert_eq!((v.x, v.y, v.z, v.w), (x, y, z, 1.0));
    }
  }

  #[test]
  fn relative_and_absolute_indices_agree(count in 1usize..40, picks in prop::collection::vec(0usize..1000, 3..8)) {
    let mut input = String::new();
    for i in 0..count {
      input.push_str(&format!("v {} 0 0\n", i));
    }
    let picks: Vec<usize> = picks.iter().map(|p| p % count).collect();

    let absolute: Vec<String> = picks.iter().map(|p| (p + 1).to_string()).collect();
    let relative: Vec<String> = picks.iter().map(|p| format!("-{}", count - p)).collect();
    input.push_str(&format!("f {}\nf {}\n", absolute.join(" "), relative.join(" ")));

    let options = ParseOptions::default().with_triangulate(false);
    let scene = parse(&input, &options);
    prop_assert!(scene.diagnostics.is_empty());
    prop_assert_eq!(scene.faces.len(), 2);
    prop_assert_eq!(&scene.faces[0].vertices, &scene.faces[1].vertices);

    let resolved: Vec<usize> = scene.faces[0].vertices.iter().map(|c| c.0).collect();
    prop_assert_eq!(resolved, picks);
  }

  #[test]
  fn fan_covers_polygon(n in 3usize..20) {
    let mut input = String::new();
    for i in 0..n {
      input.push_str(&format!("v {} {} 0\n", i, i * i));
    }
    let corners: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
    input.push_str(&format!("f {}\n", corners.join(" ")));

    let scene = parse(&input, &ParseOptions::default());
    prop_assert_eq!(scene.faces.len(), n - 2);
    for (i, face) in scene.faces.iter().enumerate() {
      let c: Vec<usize> = face.vertices.iter().map(|c| c.0).collect();
      prop_assert_eq!(c, vec![0, i + 1, i + 2]);
    }
  }

  #[test]
  fn parsing_never_panics(input in "[vfgsotnl0-9 ./#\\-\n\\\\]{0,200}") {
    let first = parse_obj(input.as_bytes(), &mut NoResolver, &ParseOptions::default());
    let second = parse_obj(input.as_bytes(), &mut NoResolver, &ParseOptions::default());
    let first = first.unwrap();
    prop_assert!(first.validate());
    prop_assert_eq!(first, second.unwrap());
  }
}
