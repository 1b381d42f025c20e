//! Filesystem-backed candidates for the `File` variable kind.
//!
//! Split, per Design Notes §9, into three pieces that `cly.builder.File`
//! tangles together: a directory-listing primitive, a glob-filter
//! predicate, and a candidate renderer that handles `~` expansion and the
//! directory/file terminator convention.

use crate::variable::FileSpec;
use globset::Glob;
use std::path::{Path, PathBuf};

/// Does `path` pass this spec's include/exclude globs and dotfile policy?
/// Directories are always accepted when `allow_directories` is set,
/// regardless of include/exclude, matching `cly.builder.File.match_file`.
pub fn matches(spec: &FileSpec, path: &Path) -> bool {
  if spec.allow_directories && path.is_dir() {
    return true;
  }
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();
  if !spec.allow_dotfiles && name.starts_with('.') {
    return false;
  }
  let path_str = path.to_string_lossy();
  for exclude in &spec.excludes {
    if glob_matches(exclude, &path_str) {
      return false;
    }
  }
  for include in &spec.includes {
    if glob_matches(include, &path_str) {
      return true;
    }
  }
  false
}

/// Does `token` (as matched by a `File` node's pattern) pass this spec's
/// filters? `~` is expanded before the filesystem check, matching
/// `cly.builder.File.match_file`.
pub fn token_matches(spec: &FileSpec, token: &str) -> bool {
  let expanded = expand_home(token);
  matches(spec, Path::new(&expanded))
}

fn glob_matches(pattern: &str, text: &str) -> bool {
  Glob::new(pattern)
    .map(|g| g.compile_matcher().is_match(text))
    .unwrap_or(false)
}

/// List the directory implied by `dir`, filtered by `spec` and by the
/// dotfile policy, returning bare file/directory names (no directory
/// prefix) that start with `prefix`.
fn list_matching(dir: &Path, prefix: &str, spec: &FileSpec) -> Vec<String> {
  let Ok(entries) = std::fs::read_dir(dir) else {
    return Vec::new();
  };
  let mut names: Vec<String> = entries
    .filter_map(|e| e.ok())
    .filter_map(|e| {
      let name = e.file_name().to_string_lossy().to_string();
      if !name.starts_with(prefix) {
        return None;
      }
      if matches(spec, &e.path()) {
        Some(name)
      } else {
        None
      }
    })
    .collect();
  names.sort();
  names
}

/// Completion candidates for `text`, applying `~`/`~user` expansion for the
/// lookup and re-contracting the home prefix in the returned candidate so
/// the user sees their own `~` rather than the expanded path.
pub fn candidates(spec: &FileSpec, text: &str) -> Vec<String> {
  let short_home = if text.starts_with('~') {
    Some(match text.find('/') {
      Some(slash) => text[..slash].to_string(),
      None => text.to_string(),
    })
  } else {
    None
  };

  let expanded_text = expand_home(text);
  let expanded_home = short_home.as_deref().map(expand_home);

  let dir = Path::new(&expanded_text)
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("."));
  let file_prefix = Path::new(&expanded_text)
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();

  let clean = |name: &str| -> String {
    let full = dir.join(name);
    let full_str = full.to_string_lossy().to_string();
    if let (Some(short), Some(expanded)) = (&short_home, &expanded_home) {
      if let Some(rest) = full_str.strip_prefix(expanded.as_str()) {
        return format!("{short}{rest}");
      }
    }
    if let Some(rest) = full_str.strip_prefix("./") {
      return rest.to_string();
    }
    full_str
  };

  let matches = list_matching(&dir, &file_prefix, spec);
  if matches.len() == 1 {
    let only = &matches[0];
    let full = dir.join(only);
    if full.is_dir() {
      return vec![format!("{}/", clean(only))];
    }
    return vec![format!("{} ", clean(only))];
  }
  matches.iter().map(|m| clean(m)).collect()
}

fn expand_home(text: &str) -> String {
  if let Some(rest) = text.strip_prefix("~/") {
    if let Some(home) = dirs::home_dir() {
      return home.join(rest).to_string_lossy().to_string();
    }
  } else if text == "~" {
    if let Some(home) = dirs::home_dir() {
      return home.to_string_lossy().to_string();
    }
  } else if let Some(rest) = text.strip_prefix('~') {
    let (user, tail) = match rest.find('/') {
      Some(slash) => (&rest[..slash], &rest[slash + 1..]),
      None => (rest, ""),
    };
    if !user.is_empty() {
      if let Some(home) = user_home_dir(user) {
        return if tail.is_empty() {
          home.to_string_lossy().to_string()
        } else {
          home.join(tail).to_string_lossy().to_string()
        };
      }
    }
  }
  text.to_string()
}

/// Look up another user's home directory for `~user` expansion. `dirs`
/// only exposes the current user's home, so this reads `/etc/passwd`
/// directly (`name:passwd:uid:gid:gecos:home:shell`).
#[cfg(unix)]
fn user_home_dir(user: &str) -> Option<PathBuf> {
  let passwd = std::fs::read_to_string("/etc/passwd").ok()?;
  for line in passwd.lines() {
    let mut fields = line.split(':');
    if fields.next() != Some(user) {
      continue;
    }
    return fields.nth(4).map(PathBuf::from);
  }
  None
}

#[cfg(not(unix))]
fn user_home_dir(_user: &str) -> Option<PathBuf> {
  None
}

#[cfg(test)]
mod test {
  use super::*;
  use std::fs;

  #[test]
  fn single_file_candidate_gets_trailing_space() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("apple.txt"), b"").unwrap();
    let spec = FileSpec::default();
    let text = format!("{}/app", dir.path().display());
    let found = candidates(&spec, &text);
    assert_eq!(found.len(), 1);
    assert!(found[0].ends_with("apple.txt "));
  }

  #[test]
  fn single_directory_candidate_gets_trailing_slash_no_space() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let mut spec = FileSpec::default();
    spec.allow_directories = true;
    let text = format!("{}/su", dir.path().display());
    let found = candidates(&spec, &text);
    assert_eq!(found.len(), 1);
    assert!(found[0].ends_with("sub/"));
    assert!(!found[0].ends_with(' '));
  }

  #[test]
  #[cfg(unix)]
  fn tilde_user_expands_via_etc_passwd() {
    assert!(user_home_dir("this-user-should-not-exist").is_none());
    // root is present in /etc/passwd on essentially every Unix system,
    // containers included, so this is a reasonably portable positive case.
    if let Some(root_home) = user_home_dir("root") {
      assert_eq!(expand_home("~root"), root_home.to_string_lossy());
      assert_eq!(
        expand_home("~root/bin"),
        root_home.join("bin").to_string_lossy()
      );
    }
  }

  #[test]
  fn dotfiles_excluded_by_default() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".hidden"), b"").unwrap();
    fs::write(dir.path().join("visible"), b"").unwrap();
    let spec = FileSpec::default();
    let text = format!("{}/", dir.path().display());
    let found = candidates(&spec, &text);
    assert!(found.iter().all(|f| !f.contains(".hidden")));
  }
}
