//! # Ignore Rules
//!
//! Decides which project paths are published. Rules follow a small subset of
//! gitignore syntax, one pattern per line:
//!
//! | Syntax        | Meaning                                              |
//! |---------------|------------------------------------------------------|
//! | `# comment`   | ignored line                                         |
//! | `*`, `?`      | any run of characters / one character, never `/`     |
//! | `**`          | any run of characters including `/`                  |
//! | `dir/`        | matches directories only                             |
//! | `/build`      | anchored at the project root                         |
//! | `!keep.ts`    | re-includes a path excluded by an earlier rule       |
//!
//! Patterns without a `/` match against the last path segment at any depth.
//! The last matching rule wins. A path inside an ignored directory stays
//! ignored even if a later rule re-includes it.

use std::path::Path;

use crate::error::WatchError;

/// Name of the ignore file at the project root.
pub const IGNORE_FILE: &str = ".dclignore";

const DEFAULT_RULES: &str = "\
.*
bin/*.map
node_modules
package.json
package-lock.json
yarn.lock
build.json
export
tsconfig.json
tslint.json
*.ts
*.tsx
Dockerfile
dist
README.md
*.blend
*.fbx
*.zip
*.rar
";

/// Decides whether a project-relative path is excluded from publication.
pub trait IgnorePredicate: Send + Sync {
    /// `path` is relative, `/`-separated, without a leading `/`.
    fn is_ignored(&self, path: &str, is_dir: bool) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    pattern: String,
    negated: bool,
    dir_only: bool,
    anchored: bool,
}

impl Rule {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();
        if line.trim().is_empty() || line.starts_with('#') {
            return None;
        }
        let (negated, rest) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let (dir_only, rest) = match rest.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let (leading_slash, rest) = match rest.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        if rest.is_empty() {
            return None;
        }
        Some(Self {
            pattern: rest.to_string(),
            negated,
            dir_only,
            anchored: leading_slash || rest.contains('/'),
        })
    }

    fn matches(&self, path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.anchored {
            glob_match(self.pattern.as_bytes(), path.as_bytes())
        } else {
            let name = path.rsplit('/').next().unwrap_or(path);
            glob_match(self.pattern.as_bytes(), name.as_bytes())
        }
    }
}

/// A parsed ignore file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRules {
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Parse ignore rules from file contents.
    pub fn parse(contents: &str) -> Self {
        Self {
            rules: contents.lines().filter_map(Rule::parse).collect(),
        }
    }

    /// The rules applied when a project has no ignore file.
    pub fn defaults() -> Self {
        Self::parse(DEFAULT_RULES)
    }

    /// Rules that ignore nothing.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Load `.dclignore` from the project root, or the defaults if absent.
    pub fn from_project(root: &Path) -> Result<Self, WatchError> {
        let path = root.join(IGNORE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let rules = Self::parse(&contents);
                tracing::debug!(path = %path.display(), rules = rules.len(), "loaded ignore rules");
                Ok(rules)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::defaults()),
            Err(source) => Err(WatchError::Scan { path, source }),
        }
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn evaluate(&self, path: &str, is_dir: bool) -> Option<bool> {
        self.rules
            .iter()
            .rev()
            .find(|r| r.matches(path, is_dir))
            .map(|r| !r.negated)
    }
}

impl IgnorePredicate for IgnoreRules {
    fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        let mut end = 0;
        while let Some(offset) = path[end..].find('/') {
            end += offset;
            if self.evaluate(&path[..end], true) == Some(true) {
                return true;
            }
            end += 1;
        }
        self.evaluate(path, is_dir).unwrap_or(false)
    }
}

/// Byte-level glob matching for `*`, `**` and `?`.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') if pattern.get(1) == Some(&b'*') => {
            let mut rest = &pattern[2..];
            if rest.first() == Some(&b'/') {
                // `**/x` also matches `x` at the top level.
                if glob_match(&rest[1..], text) {
                    return true;
                }
                rest = &rest[1..];
            }
            (0..=text.len()).any(|i| glob_match(rest, &text[i..]))
        }
        Some(b'*') => {
            let rest = &pattern[1..];
            for i in 0..=text.len() {
                if glob_match(rest, &text[i..]) {
                    return true;
                }
                if text.get(i) == Some(&b'/') {
                    break;
                }
            }
            false
        }
        Some(b'?') => match text.first() {
            Some(c) if *c != b'/' => glob_match(&pattern[1..], &text[1..]),
            _ => false,
        },
        Some(p) => text.first() == Some(p) && glob_match(&pattern[1..], &text[1..]),
    }
}
