//! Scope matching
//!
//! Decides whether an intent's owned scope authorizes a file path. The policy
//! is default-deny and exclude-first:
//!
//! 1. A path matching any exclude pattern is denied ("excluded by pattern P")
//! 2. A path matching any include pattern is allowed
//! 3. Everything else is denied ("outside scope")
//!
//! Patterns use `glob` semantics with a literal separator: `*` stays within
//! one path segment, `**` crosses segments. Matching is case-sensitive and
//! runs against POSIX-style paths relative to the workspace root.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use super::intent::IntentScope;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Result of a scope check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    Allow,
    Deny(String),
}

impl ScopeDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ScopeDecision::Allow)
    }
}

/// Authorize an already-normalized relative path against a scope
///
/// Paths that leave the workspace are denied before any pattern is tried.
pub fn authorize(path: &str, scope: &IntentScope) -> ScopeDecision {
    if escapes_root(path) {
        return ScopeDecision::Deny("outside scope".to_string());
    }

    for raw in &scope.exclude {
        match Pattern::new(raw) {
            Ok(pattern) if pattern.matches_with(path, MATCH_OPTIONS) => {
                return ScopeDecision::Deny(format!("excluded by pattern {}", raw));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Invalid exclude pattern '{}': {}", raw, e);
                return ScopeDecision::Deny(format!("invalid pattern {}", raw));
            }
        }
    }

    for raw in &scope.include {
        match Pattern::new(raw) {
            Ok(pattern) if pattern.matches_with(path, MATCH_OPTIONS) => {
                return ScopeDecision::Allow;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Invalid include pattern '{}': {}", raw, e);
                return ScopeDecision::Deny(format!("invalid pattern {}", raw));
            }
        }
    }

    ScopeDecision::Deny("outside scope".to_string())
}

fn escapes_root(path: &str) -> bool {
    path.starts_with('/') || path == ".." || path.starts_with("../")
}

/// Normalize a raw tool path into a POSIX-style workspace-relative path
///
/// Backslashes become `/`, `.` segments are dropped and `..` segments are
/// resolved lexically. Absolute paths under `root` are made relative; paths
/// that leave the root keep their leading `/` or `..` and will not match a
/// relative pattern.
pub fn normalize_path(raw: &str, root: Option<&Path>) -> String {
    let unified = raw.trim().replace('\\', "/");
    let path = Path::new(&unified);

    let relative = match root {
        Some(root) if path.is_absolute() => path.strip_prefix(root).ok(),
        _ => None,
    };
    let (path, absolute) = match relative {
        Some(rel) => (rel, false),
        None => (path, path.is_absolute()),
    };

    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::ParentDir => {
                if matches!(parts.last(), Some(last) if last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..".to_string());
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Canonicalize the longest existing ancestor of an absolute path and
/// re-append the rest, resolving symlinks for files not yet created
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut rest = Vec::new();
    let mut current = path;
    loop {
        if let Ok(resolved) = std::fs::canonicalize(current) {
            return Some(rest.iter().rev().fold(resolved, |acc, part| acc.join(part)));
        }
        rest.push(current.file_name()?.to_os_string());
        current = current.parent()?;
    }
}

/// Scope matcher bound to a workspace root
#[derive(Debug, Clone, Default)]
pub struct ScopeMatcher {
    root: Option<PathBuf>,
}

impl ScopeMatcher {
    /// Matcher that treats every path as already workspace-relative
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Matcher that relativizes absolute paths under `root`
    ///
    /// The root is canonicalized when it exists, so `.` and symlinked
    /// workspaces compare against the same absolute form as tool paths.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            root: Some(std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())),
        }
    }

    /// Normalize a raw path the way `authorize` sees it
    pub fn normalize(&self, raw: &str) -> String {
        let root = self.root.as_deref();
        let normalized = normalize_path(raw, root);
        if !normalized.starts_with('/') {
            return normalized;
        }
        match resolve_existing_prefix(Path::new(&normalized)) {
            Some(resolved) => normalize_path(&resolved.to_string_lossy(), root),
            None => normalized,
        }
    }

    /// Normalize `raw` and authorize it against `scope`
    pub fn authorize(&self, raw: &str, scope: &IntentScope) -> ScopeDecision {
        let path = self.normalize(raw);
        let decision = authorize(&path, scope);
        tracing::debug!("Scope check for '{}' (raw '{}'): {:?}", path, raw, decision);
        decision
    }
}
