//! Artifact pattern table and `.gitignore` line matching.
//!
//! Everything here is pure: no I/O besides [`GitignoreRules::load`], no
//! shared state, safe to call from any number of walker workers.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use glob::{MatchOptions, Pattern};

use crate::error::{Result, TidyError};

/// Built-in artifact patterns, `(pattern, category)`.
///
/// Patterns containing `*` are globs applied to the base name; everything
/// else must equal the directory name exactly.
pub const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("node_modules", "Node.js dependencies"),
    ("target", "Rust build artifacts"),
    ("build", "Build artifacts"),
    ("dist", "Distribution files"),
    ("__pycache__", "Python cache"),
    (".pytest_cache", "Pytest cache"),
    ("venv", "Python virtual environment"),
    ("env", "Python virtual environment"),
    (".venv", "Python virtual environment"),
    ("vendor", "Vendor dependencies"),
    ("deps", "Elixir dependencies"),
    ("_build", "Elixir build artifacts"),
    (".gradle", "Gradle cache"),
    ("cmake-build-debug", "CMake build artifacts"),
    ("cmake-build-release", "CMake build artifacts"),
    ("DerivedData", "Xcode derived data"),
    ("*.log", "Log files"),
    ("*.tmp", "Temporary files"),
];

/// `*` must not cross a path separator, mirroring shell globbing.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn builtin_globs() -> &'static [(Pattern, &'static str)] {
    static GLOBS: OnceLock<Vec<(Pattern, &'static str)>> = OnceLock::new();
    GLOBS.get_or_init(|| {
        BUILTIN_PATTERNS
            .iter()
            .filter(|(pattern, _)| pattern.contains('*'))
            .filter_map(|(pattern, category)| Pattern::new(pattern).ok().map(|p| (p, *category)))
            .collect()
    })
}

/// Classify a directory by its base name against [`BUILTIN_PATTERNS`].
pub fn classify_by_name(name: &str) -> Option<&'static str> {
    if let Some((_, category)) = BUILTIN_PATTERNS
        .iter()
        .find(|(pattern, _)| !pattern.contains('*') && *pattern == name)
    {
        return Some(category);
    }

    builtin_globs()
        .iter()
        .find(|(glob, _)| glob.matches_with(name, GLOB_OPTIONS))
        .map(|(_, category)| *category)
}

/// Returns true if a `.gitignore` line never takes part in matching:
/// blank lines, comments and negations.
pub fn is_excluded_line(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line.starts_with('!')
}

#[derive(Debug, Clone)]
enum RuleKind {
    /// `build/`: the path itself or anything below it.
    Directory(String),
    /// `*.log`: base name or full relative path.
    Glob(Pattern),
    /// `build`: equality, containment or `/build` suffix.
    Literal(String),
}

/// One usable `.gitignore` line.
#[derive(Debug, Clone)]
pub struct GitignoreRule {
    line: String,
    kind: RuleKind,
}

impl GitignoreRule {
    /// Parse a line, returning `None` for excluded lines.
    ///
    /// A malformed glob (e.g. an unclosed `[`) yields a rule that never
    /// matches rather than an error.
    pub fn parse(line: &str) -> Option<Self> {
        if is_excluded_line(line) {
            return None;
        }
        let line = line.trim();

        let kind = if let Some(dir) = line.strip_suffix('/') {
            RuleKind::Directory(dir.to_string())
        } else if line.contains('*') {
            match Pattern::new(&collapse_stars(line)) {
                Ok(pattern) => RuleKind::Glob(pattern),
                Err(err) => {
                    tracing::debug!(line, %err, "Ignoring malformed gitignore glob");
                    RuleKind::Directory(String::new())
                }
            }
        } else {
            RuleKind::Literal(line.to_string())
        };

        Some(Self {
            line: line.to_string(),
            kind,
        })
    }

    /// The trimmed source line.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Test a root-relative, `/`-separated path against this rule.
    ///
    /// Literal rules fall back to substring containment, so `env` matches
    /// `environment-data`. That over-matching is kept on purpose.
    pub fn matches(&self, relative_path: &str) -> bool {
        match &self.kind {
            RuleKind::Directory(dir) if dir.is_empty() => false,
            RuleKind::Directory(dir) => {
                relative_path == dir
                    || relative_path
                        .strip_prefix(dir.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            RuleKind::Glob(pattern) => {
                let base = relative_path.rsplit('/').next().unwrap_or(relative_path);
                pattern.matches_with(base, GLOB_OPTIONS)
                    || pattern.matches_with(relative_path, GLOB_OPTIONS)
            }
            RuleKind::Literal(literal) => {
                relative_path == literal
                    || relative_path.contains(literal.as_str())
                    || relative_path.ends_with(&format!("/{literal}"))
            }
        }
    }
}

/// Fold `**` and longer runs into `*`, so a star never crosses `/`.
fn collapse_stars(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if c != '*' || !out.ends_with('*') {
            out.push(c);
        }
    }
    out
}

/// Match a single raw `.gitignore` line against a root-relative path.
pub fn matches_gitignore_line(line: &str, relative_path: &str) -> bool {
    GitignoreRule::parse(line).is_some_and(|rule| rule.matches(relative_path))
}

/// The usable rules of a `.gitignore` file, in file order.
#[derive(Debug, Clone, Default)]
pub struct GitignoreRules {
    rules: Vec<GitignoreRule>,
}

impl GitignoreRules {
    /// Parse `.gitignore` text, dropping excluded lines.
    pub fn parse(content: &str) -> Self {
        Self {
            rules: content.lines().filter_map(GitignoreRule::parse).collect(),
        }
    }

    /// Read `<root>/.gitignore`.
    ///
    /// A missing file is a precondition failure of gitignore mode.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(".gitignore");
        if !path.is_file() {
            return Err(TidyError::GitignoreMissing(root.to_path_buf()));
        }
        let content = fs::read_to_string(&path).map_err(|source| TidyError::Io {
            path: path.clone(),
            source,
        })?;
        let rules = Self::parse(&content);
        tracing::debug!(path = %path.display(), rules = rules.len(), "Loaded gitignore rules");
        Ok(rules)
    }

    /// First rule matching `relative_path`.
    pub fn first_match(&self, relative_path: &str) -> Option<&GitignoreRule> {
        self.rules.iter().find(|rule| rule.matches(relative_path))
    }

    pub fn rules(&self) -> &[GitignoreRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
