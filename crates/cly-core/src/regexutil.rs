//! Anchored matching: Python's `re.match(string, pos)` requires the match to
//! *start* at `pos` but does not require the regex itself to contain `^`.
//! `regex::Regex::find_at` searches for the leftmost match at or after
//! `start`, so we additionally reject any match that starts later.

use regex::{Match, Regex};

pub fn match_at<'t>(re: &Regex, text: &'t str, start: usize) -> Option<Match<'t>> {
  let m = re.find_at(text, start)?;
  if m.start() == start {
    Some(m)
  } else {
    None
  }
}
