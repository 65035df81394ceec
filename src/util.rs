//! Number and index parsing shared by the `.obj` and `.mtl` dispatchers.
use crate::error::{ErrorKind, Issue};
use crate::obj::VTNIndex;

/// Parses a coordinate. Trailing garbage and non-finite values are rejected.
pub(crate) fn parse_float(token: &str) -> Result<f64, Issue> {
  match lexical::parse::<f64, _>(token) {
    Ok(x) if x.is_finite() => Ok(x),
    _ => Err(Issue::new(
      ErrorKind::InvalidNumber,
      format!("expected a number but got `{}`", token),
    )),
  }
}

/// Parses every token in `tokens` as a coordinate.
pub(crate) fn parse_floats(tokens: &[String]) -> Result<Vec<f64>, Issue> {
  tokens.iter().map(|t| parse_float(t)).collect()
}

pub(crate) fn parse_int(token: &str) -> Result<i64, Issue> {
  lexical::parse::<i64, _>(token).map_err(|_| {
    Issue::new(
      ErrorKind::InvalidNumber,
      format!("expected an integer but got `{}`", token),
    )
  })
}

/// Number of elements in each vertex pool when a statement is processed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PoolSizes {
  pub(crate) vertices: usize,
  pub(crate) tex_vertices: usize,
  pub(crate) normals: usize,
}

fn invalid_index<S: Into<String>>(message: S) -> Issue {
  Issue::new(ErrorKind::InvalidIndex, message)
}

/// Turns a 1-based (or negative, relative) index into a 0-based one, checked
/// against a pool of `len` elements.
pub(crate) fn resolve_index(what: &str, token: &str, len: usize) -> Result<usize, Issue> {
  let raw: i64 = lexical::parse(token)
    .map_err(|_| invalid_index(format!("expected a {} index but got `{}`", what, token)))?;

  let resolved = if raw > 0 {
    raw - 1
  } else if raw < 0 {
    len as i64 + raw
  } else {
    return Err(invalid_index(format!("{} index 0 is not allowed", what)));
  };

  if resolved < 0 || resolved >= len as i64 {
    return Err(invalid_index(format!(
      "{} index {} is out of range, {} {}s defined so far",
      what, raw, len, what
    )));
  }
  Ok(resolved as usize)
}

/// Parses a face or line corner: `v`, `v/t`, `v//n` or `v/t/n`.
pub(crate) fn parse_face_ref(token: &str, sizes: PoolSizes) -> Result<VTNIndex, Issue> {
  let parts: Vec<&str> = token.split('/').collect();
  if parts.len() > 3 {
    return Err(invalid_index(format!(
      "expected at most 3 indices in `{}`",
      token
    )));
  }

  let vertex = resolve_index("vertex", parts[0], sizes.vertices)?;

  let texture = match parts.get(1) {
    // `v//n` leaves the texture slot empty; `v/` does not.
    Some(t) if t.is_empty() && parts.len() == 3 => None,
    Some(t) => Some(resolve_index("texture vertex", t, sizes.tex_vertices)?),
    None => None,
  };

  let normal = match parts.get(2) {
    Some(n) => Some(resolve_index("normal", n, sizes.normals)?),
    None => None,
  };

  Ok((vertex, texture, normal))
}

#[cfg(test)]
fn sizes(vertices: usize, tex_vertices: usize, normals: usize) -> PoolSizes {
  PoolSizes {
    vertices,
    tex_vertices,
    normals,
  }
}

#[test]
fn test_parse_float() {
  assert_eq!(parse_float("1.5").unwrap(), 1.5);
  assert_eq!(parse_float("-2").unwrap(), -2.0);
  assert_eq!(parse_float("1e3").unwrap(), 1000.0);
  assert_eq!(parse_float("-0.25E-1").unwrap(), -0.025);

  for bad in &["", "1.0x", "abc", "1..2", "nan", "inf"] {
    let err = parse_float(bad).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidNumber, "{}", bad);
  }
}

#[test]
fn test_parse_int() {
  assert_eq!(parse_int("7").unwrap(), 7);
  assert_eq!(parse_int("-3").unwrap(), -3);
  assert_eq!(parse_int("2.0").unwrap_err().kind, ErrorKind::InvalidNumber);
}

#[test]
fn test_face_ref_forms() {
  let s = sizes(4, 4, 4);
  assert_eq!(parse_face_ref("1", s).unwrap(), (0, None, None));
  assert_eq!(parse_face_ref("2/3", s).unwrap(), (1, Some(2), None));
  assert_eq!(parse_face_ref("2//4", s).unwrap(), (1, None, Some(3)));
  assert_eq!(parse_face_ref("1/2/3", s).unwrap(), (0, Some(1), Some(2)));
}

#[test]
fn test_face_ref_negative() {
  let s = sizes(5, 2, 1);
  assert_eq!(parse_face_ref("-1", s).unwrap(), (4, None, None));
  assert_eq!(parse_face_ref("-5/-2/-1", s).unwrap(), (0, Some(0), Some(0)));
  assert!(parse_face_ref("-6", s).is_err());
}

#[test]
fn test_face_ref_invalid() {
  let s = sizes(3, 3, 3);
  for bad in &["0", "4", "1/0", "1//4", "1/", "1/2/", "/1", "1/2/3/4", "x", "1.5"] {
    let err = parse_face_ref(bad, s).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidIndex, "{}", bad);
  }
}

#[test]
fn test_face_ref_missing_pool() {
  // A texture index is meaningless before any `vt` statement.
  let err = parse_face_ref("1/1", sizes(3, 0, 0)).unwrap_err();
  assert_eq!(err.kind, ErrorKind::InvalidIndex);
  assert!(err.message.contains("texture vertex"));
}
