//! Built-in [`VariableKind`]s: the regex each matches and the value it
//! parses into. Ported from `cly.builder`'s `Word`/`String`/`Integer`/...
//! classes (see `examples/original_source/cly/builder.py`), expressed as
//! composition over a single `Variable` node rather than a subclass per
//! kind, per SPEC_FULL.md / Design Notes §9.

use crate::error::Error;
use crate::value::Value;

/// A file-matching variable's filter configuration. Split out from
/// [`VariableKind::File`] because it is also consulted by
/// [`crate::file_candidates`].
#[derive(Debug, Clone)]
pub struct FileSpec {
  pub includes: Vec<String>,
  pub excludes: Vec<String>,
  pub allow_dotfiles: bool,
  pub allow_directories: bool,
}

impl Default for FileSpec {
  fn default() -> Self {
    Self {
      includes: vec!["*".to_string()],
      excludes: Vec::new(),
      allow_dotfiles: false,
      allow_directories: false,
    }
  }
}

#[derive(Debug, Clone)]
pub enum VariableKind {
  Word,
  String,
  Integer,
  Float,
  Boolean,
  Ip,
  Hostname,
  Host,
  EMail,
  Uri,
  LdapDn,
  File(FileSpec),
}

impl VariableKind {
  /// The default match pattern for this kind, applied when the node has no
  /// explicit `pattern` override.
  pub fn default_pattern(&self) -> &'static str {
    match self {
      VariableKind::Word => r"(?i)[A-Za-z_]\w+",
      VariableKind::String => r#"(?:\w+)|(?:"(?:[^"\\]|\\.)*")|(?:'(?:[^'\\]|\\.)*')"#,
      VariableKind::Integer => r"\d+",
      VariableKind::Float => r"[-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?",
      VariableKind::Boolean => {
        r"(?i)(?:true|yes|aye|enable|enabled|on|1|false|no|disable|disabled|off|0)"
      }
      VariableKind::Ip => {
        r"(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)"
      }
      VariableKind::Hostname => r"(?i)[A-Z0-9][A-Z0-9_-]*(?:\.[A-Z0-9][A-Z0-9_-]*)*",
      VariableKind::Host => {
        r"(?i)(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?))|(?:[A-Z0-9][A-Z0-9_-]*(?:\.[A-Z0-9][A-Z0-9_-]*)*)"
      }
      VariableKind::EMail => r"(?i)[A-Z0-9._%-]+@[A-Z0-9.-]+\.[A-Z]{2,4}",
      VariableKind::Uri => {
        r"(?:[a-zA-Z][0-9a-zA-Z+.-]*:)?/{0,2}[0-9A-Za-z;/?:@&=+$.\-_!~*'()%]+(?:#[0-9A-Za-z;/?:@&=+$.\-_!~*'()%]+)?"
      }
      VariableKind::LdapDn => r"\w+=\w+(?:,\w+=\w+)*",
      VariableKind::File(_) => r"\S+",
    }
  }

  /// Parse a matched token into a [`Value`]. `token` is the text matched by
  /// `default_pattern` (or the node's override pattern for simple kinds).
  pub fn parse(&self, token: &str) -> Result<Value, Error> {
    match self {
      VariableKind::Word => Ok(Value::Text(token.to_string())),
      VariableKind::String => Ok(Value::Text(unquote(token))),
      VariableKind::Integer => token
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|e| validation("not an integer", &e.to_string())),
      VariableKind::Float => token
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| validation("not a float", &e.to_string())),
      VariableKind::Boolean => Ok(Value::Boolean(is_true(token))),
      VariableKind::Ip => parse_ip(token).map(Value::Octets),
      VariableKind::Hostname => Ok(Value::Labels(split_labels(token))),
      VariableKind::Host => match parse_ip(token) {
        Ok(octets) => Ok(Value::Octets(octets)),
        Err(_) => Ok(Value::Labels(split_labels(token))),
      },
      VariableKind::EMail => Ok(Value::Text(token.to_string())),
      VariableKind::Uri => Ok(Value::Text(token.to_string())),
      VariableKind::LdapDn => Ok(Value::Text(token.to_string())),
      VariableKind::File(_) => Ok(Value::Text(token.to_string())),
    }
  }
}

fn validation(reason: &str, detail: &str) -> Error {
  Error::ValidationError {
    cursor: 0,
    token: String::new(),
    reason: format!("{reason}: {detail}"),
  }
}

fn is_true(token: &str) -> bool {
  const TRUE: &[&str] = &["true", "yes", "aye", "enable", "enabled", "on", "1"];
  let lower = token.to_ascii_lowercase();
  TRUE.contains(&lower.as_str())
}

fn split_labels(token: &str) -> Vec<String> {
  token.split('.').map(str::to_string).collect()
}

fn parse_ip(token: &str) -> Result<[u8; 4], Error> {
  let parts: Vec<&str> = token.split('.').collect();
  if parts.len() != 4 {
    return Err(validation("not an IP address", token));
  }
  let mut octets = [0u8; 4];
  for (i, part) in parts.iter().enumerate() {
    octets[i] = part
      .parse::<u8>()
      .map_err(|_| validation("not an IP address", token))?;
  }
  Ok(octets)
}

/// Unquote a `String` variable token: bare words pass through untouched;
/// quoted tokens have their surrounding quote stripped and `\x` escapes
/// resolved to the literal character `x`.
fn unquote(token: &str) -> String {
  let bytes = token.as_bytes();
  if bytes.len() < 2 {
    return token.to_string();
  }
  let quote = bytes[0];
  if (quote != b'"' && quote != b'\'') || bytes[bytes.len() - 1] != quote {
    return token.to_string();
  }
  let inner = &token[1..token.len() - 1];
  let mut out = String::with_capacity(inner.len());
  let mut chars = inner.chars();
  while let Some(c) = chars.next() {
    if c == '\\' {
      if let Some(next) = chars.next() {
        out.push(next);
      }
    } else {
      out.push(c);
    }
  }
  out
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn integer_parses() {
    assert_eq!(VariableKind::Integer.parse("123").unwrap(), Value::Integer(123));
  }

  #[test]
  fn boolean_is_case_insensitive() {
    assert_eq!(VariableKind::Boolean.parse("YeS").unwrap(), Value::Boolean(true));
    assert_eq!(VariableKind::Boolean.parse("OFF").unwrap(), Value::Boolean(false));
  }

  #[test]
  fn ip_parses_octets() {
    assert_eq!(
      VariableKind::Ip.parse("123.34.67.89").unwrap(),
      Value::Octets([123, 34, 67, 89])
    );
  }

  #[test]
  fn host_prefers_ip_parse() {
    assert_eq!(
      VariableKind::Host.parse("123.34.67.89").unwrap(),
      Value::Octets([123, 34, 67, 89])
    );
    assert_eq!(
      VariableKind::Host.parse("www.example.com").unwrap(),
      Value::Labels(vec!["www".into(), "example".into(), "com".into()])
    );
  }

  #[test]
  fn word_pattern_requires_at_least_two_characters() {
    use crate::regexutil::match_at;
    use regex::Regex;
    let re = Regex::new(VariableKind::Word.default_pattern()).unwrap();
    assert!(match_at(&re, "ab", 0).is_some());
    assert!(match_at(&re, "a", 0).is_none());
  }

  #[test]
  fn string_unquotes_and_unescapes() {
    assert_eq!(VariableKind::String.parse("foo_bar").unwrap(), Value::Text("foo_bar".into()));
    assert_eq!(
      VariableKind::String.parse(r#""foo bar""#).unwrap(),
      Value::Text("foo bar".into())
    );
    assert_eq!(
      VariableKind::String.parse(r#""a\"b""#).unwrap(),
      Value::Text("a\"b".into())
    );
  }
}
