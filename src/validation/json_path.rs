//! Dotted paths with optional `key[index]` segments, e.g. `data.items[0].id`.
use super::value::Comparable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parses a path. A leading `$` or `$.` is accepted and ignored.
///
/// # Errors
///
/// Returns a message when the path is empty or a segment is malformed
/// (empty key, unclosed bracket, non-numeric index).
pub(crate) fn parse_path(path: &str) -> Result<Vec<PathSegment>, String> {
    let trimmed = path.trim();
    let body = trimmed
        .strip_prefix("$.")
        .or_else(|| trimmed.strip_prefix('$'))
        .unwrap_or(trimmed);
    if body.is_empty() {
        if trimmed.starts_with('$') {
            return Ok(Vec::new());
        }
        return Err("path is empty".to_owned());
    }

    let mut segments = Vec::new();
    for part in body.split('.') {
        if part.is_empty() {
            return Err(format!("empty segment in '{}'", path));
        }
        parse_part(part, path, &mut segments)?;
    }
    Ok(segments)
}

fn parse_part(part: &str, path: &str, segments: &mut Vec<PathSegment>) -> Result<(), String> {
    let (key, mut rest) = match part.find('[') {
        Some(open) => part.split_at(open),
        None => (part, ""),
    };
    if key.contains(']') {
        return Err(format!("unexpected ']' in '{}'", path));
    }
    if !key.is_empty() {
        segments.push(PathSegment::Key(key.to_owned()));
    }
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .ok_or_else(|| format!("expected '[' in '{}'", path))?;
        let close = inner
            .find(']')
            .ok_or_else(|| format!("unclosed '[' in '{}'", path))?;
        let (index_text, after) = inner.split_at(close);
        let index: usize = index_text
            .trim()
            .parse()
            .map_err(|_err: std::num::ParseIntError| {
                format!("invalid index '{}' in '{}'", index_text, path)
            })?;
        segments.push(PathSegment::Index(index));
        rest = after.strip_prefix(']').unwrap_or(after);
    }
    Ok(())
}

/// Walks `segments` from `root`. Missing keys, out-of-range indexes, and
/// steps into primitives all resolve to `Undefined`.
#[must_use]
pub(crate) fn resolve(root: &Comparable, segments: &[PathSegment]) -> Comparable {
    let mut current = root;
    for segment in segments {
        let next = match (segment, current) {
            (PathSegment::Key(key), Comparable::Map(fields)) => fields.get(key),
            (PathSegment::Index(index), Comparable::List(items)) => items.get(*index),
            (PathSegment::Key(key), Comparable::List(items)) => {
                key.parse::<usize>().ok().and_then(|index| items.get(index))
            }
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Comparable::Undefined,
        }
    }
    current.clone()
}

/// Parses and resolves in one step.
///
/// # Errors
///
/// Returns a message when the path syntax is malformed.
pub(crate) fn resolve_path(root: &Comparable, path: &str) -> Result<Comparable, String> {
    let segments = parse_path(path)?;
    Ok(resolve(root, &segments))
}
