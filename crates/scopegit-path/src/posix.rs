//! Canonical POSIX path helpers.
//!
//! Canonical paths are `/`-separated strings. A leading `/` marks a path
//! absolute within the logical filesystem; relative paths may keep leading
//! `..` segments that walk above their root.

use scopegit_types::{VcsError, VcsResult};

/// Collapse `.` and empty segments and resolve `..`.
///
/// A `..` pops the previous segment unless there is none or the previous
/// one is itself `..`, in which case it is kept. Absolute-ness is preserved
/// and empty input yields `"."`. Idempotent.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let mut stack: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if stack.is_empty() || stack.last() == Some(&"..") {
                    stack.push("..");
                } else {
                    stack.pop();
                }
            }
            segment => stack.push(segment),
        }
    }

    let joined = stack.join("/");
    if path.starts_with('/') {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Parent of `path`.
///
/// Fails with [`VcsError::InvalidPath`] when the path has no separator.
/// Returns `/` when the parent is the root.
pub fn dirname(path: &str) -> VcsResult<String> {
    match path.rfind('/') {
        None => Err(VcsError::InvalidPath(path.to_string())),
        Some(0) => Ok("/".to_string()),
        Some(idx) => Ok(path[..idx].to_string()),
    }
}

/// Last segment of `path`.
///
/// Fails with [`VcsError::InvalidPath`] for the root, which has no name.
pub fn basename(path: &str) -> VcsResult<String> {
    if path == "/" {
        return Err(VcsError::InvalidPath(path.to_string()));
    }
    match path.rfind('/') {
        None => Ok(path.to_string()),
        Some(idx) => Ok(path[idx + 1..].to_string()),
    }
}

/// Join segments with `/`, collapsing runs of separators.
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(part.as_ref());
    }

    let mut collapsed = String::with_capacity(out.len());
    let mut prev_slash = false;
    for ch in out.chars() {
        if ch == '/' {
            if !prev_slash {
                collapsed.push(ch);
            }
            prev_slash = true;
        } else {
            collapsed.push(ch);
            prev_slash = false;
        }
    }
    collapsed
}

/// Split a path into its segments.
///
/// An absolute path yields `"/"` as its first segment; a leading `.` of a
/// relative path is dropped, as is a trailing empty segment.
pub fn split(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }

    let mut parts: Vec<String> = path.split('/').map(str::to_string).collect();
    if parts.last().is_some_and(|last| last.is_empty()) {
        parts.pop();
    }
    if path.starts_with('/') {
        if let Some(first) = parts.first_mut() {
            *first = "/".to_string();
        }
    } else if parts.first().is_some_and(|first| first == ".") {
        parts.remove(0);
    }
    parts
}

/// Fold paths left to right.
///
/// Empty arguments are skipped, the first non-empty one seeds the result, a
/// later absolute argument replaces everything accumulated so far, and every
/// relative join is renormalized.
pub fn resolve<S: AsRef<str>>(paths: &[S]) -> String {
    let mut resolved = String::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_empty() {
            continue;
        }
        if resolved.is_empty() || path.starts_with('/') {
            resolved = path.to_string();
        } else {
            resolved = normalize(&join(&[resolved.as_str(), path]));
        }
    }
    resolved
}
