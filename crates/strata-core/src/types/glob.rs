//! Glob matching for ZSCAN MATCH patterns.
//!
//! Works on raw bytes since members are binary-safe. Supports `*`, `?`,
//! character classes (`[abc]`, `[a-z]`, `[^a]`) and `\` escapes.

/// A MATCH pattern, parsed once and tested against many members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    pattern: Vec<u8>,
}

impl GlobPattern {
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// `*` matches everything, so a scan can skip filtering.
    pub fn matches_all(&self) -> bool {
        self.pattern == b"*"
    }

    pub fn matches(&self, text: &[u8]) -> bool {
        glob_match(&self.pattern, text)
    }
}

/// Iterative matcher with single-star backtracking. O(n*m) worst case.
fn glob_match(pat: &[u8], txt: &[u8]) -> bool {
    let mut pi = 0;
    let mut ti = 0;

    // most recent '*' and the text position it was tried at
    let mut star_pi: Option<usize> = None;
    let mut star_ti = 0;

    while ti < txt.len() {
        if let Some(&p) = pat.get(pi) {
            match p {
                b'*' => {
                    star_pi = Some(pi);
                    star_ti = ti;
                    pi += 1;
                    continue;
                }
                b'?' => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                b'[' => {
                    if let Some(next) = match_class(pat, pi, txt[ti]) {
                        pi = next;
                        ti += 1;
                        continue;
                    }
                }
                b'\\' if pi + 1 < pat.len() => {
                    if pat[pi + 1] == txt[ti] {
                        pi += 2;
                        ti += 1;
                        continue;
                    }
                }
                c if c == txt[ti] => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                _ => {}
            }
        }

        // mismatch: retry the last star one byte further along
        match star_pi {
            Some(sp) => {
                pi = sp + 1;
                star_ti += 1;
                ti = star_ti;
            }
            None => return false,
        }
    }

    while pat.get(pi) == Some(&b'*') {
        pi += 1;
    }
    pi == pat.len()
}

/// Tests `ch` against the class opening at `pat[start]`. Returns the
/// index just past the closing `]` on a match. An unterminated class
/// never matches.
fn match_class(pat: &[u8], start: usize, ch: u8) -> Option<usize> {
    let mut i = start + 1;
    let negated = matches!(pat.get(i), Some(b'^' | b'!'));
    if negated {
        i += 1;
    }

    let mut matched = false;
    while i < pat.len() && pat[i] != b']' {
        let lo = if pat[i] == b'\\' && i + 1 < pat.len() {
            i += 1;
            pat[i]
        } else {
            pat[i]
        };
        if pat.get(i + 1) == Some(&b'-') && i + 2 < pat.len() && pat[i + 2] != b']' {
            let hi = pat[i + 2];
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            if (lo..=hi).contains(&ch) {
                matched = true;
            }
            i += 3;
        } else {
            if lo == ch {
                matched = true;
            }
            i += 1;
        }
    }

    if i >= pat.len() {
        return None;
    }
    (matched != negated).then_some(i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(pattern: &str, text: &str) -> bool {
        GlobPattern::new(pattern).matches(text.as_bytes())
    }

    #[test]
    fn star() {
        assert!(m("*", ""));
        assert!(m("*", "anything"));
        assert!(m("user:*", "user:42"));
        assert!(m("*:42", "user:42"));
        assert!(m("u*r*2", "user:42"));
        assert!(!m("user:*", "admin:1"));
        assert!(GlobPattern::new("*").matches_all());
        assert!(!GlobPattern::new("a*").matches_all());
    }

    #[test]
    fn question_mark() {
        assert!(m("h?llo", "hello"));
        assert!(!m("h?llo", "hllo"));
        assert!(!m("?", ""));
    }

    #[test]
    fn classes_and_ranges() {
        assert!(m("h[ae]llo", "hallo"));
        assert!(!m("h[ae]llo", "hillo"));
        assert!(m("h[^e]llo", "hallo"));
        assert!(!m("h[^e]llo", "hello"));
        assert!(m("m[0-9]", "m7"));
        assert!(!m("m[0-9]", "mx"));
        assert!(m("m[9-0]", "m3"));
        assert!(!m("h[ab", "ha"));
    }

    #[test]
    fn escapes() {
        assert!(m(r"a\*b", "a*b"));
        assert!(!m(r"a\*b", "axb"));
        assert!(m(r"[\]]", "]"));
    }

    #[test]
    fn binary_members() {
        assert!(GlobPattern::new(&b"\xff*"[..]).matches(&[0xff, 0x00, 0x01]));
        assert!(!GlobPattern::new(&b"\xff*"[..]).matches(&[0xfe]));
    }
}
