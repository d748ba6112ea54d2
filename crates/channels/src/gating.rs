//! Allowlist matching for groups and senders.

/// Check whether `id` is covered by `allowlist`.
///
/// An empty allowlist allows everyone. Entries match case-insensitively,
/// either exactly or as glob patterns where `*` stands for any run of
/// characters.
pub fn is_allowed(id: &str, allowlist: &[String]) -> bool {
    if allowlist.is_empty() {
        return true;
    }
    let id = id.to_lowercase();
    allowlist
        .iter()
        .map(|pattern| pattern.to_lowercase())
        .any(|pattern| glob_match(&pattern, &id))
}

fn glob_match(pattern: &str, text: &str) -> bool {
    let mut segments = pattern.split('*');
    // `split` always yields at least one segment.
    let first = segments.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let middle: Vec<&str> = segments.collect();
    let Some((last, inner)) = middle.split_last() else {
        // No wildcard at all.
        return rest.is_empty();
    };

    for segment in inner.iter().filter(|s| !s.is_empty()) {
        match rest.find(segment) {
            Some(idx) => rest = &rest[idx + segment.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}
