//! Tool names derived from paths.
//!
//! Naming is two-pass: base names are computed and counted for the whole filtered set first,
//! then every base name that occurs more than once gets `_<method>` appended.

use apibridge_http_tools::method::HttpMethod;
use std::collections::{HashMap, HashSet};

/// Segment used when a path yields nothing (e.g. `/` or `/{id}`).
pub const ROOT_SEGMENT: &str = "root";

/// `/chats/{chatId}/messages` → `chats_messages`.
#[must_use]
pub fn path_segment(normalized_path: &str) -> String {
    let mut stripped = String::with_capacity(normalized_path.len());
    let mut depth = 0usize;
    for c in normalized_path.trim_start_matches('/').chars() {
        match c {
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            _ if depth > 0 => {}
            '/' => stripped.push('_'),
            c => stripped.push(c),
        }
    }

    let mut segment = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        if c == '_' && segment.ends_with('_') {
            continue;
        }
        segment.push(c);
    }
    let segment = segment.trim_end_matches('_');

    if segment.is_empty() {
        ROOT_SEGMENT.to_string()
    } else {
        segment.to_string()
    }
}

/// Prefix plus segment. The prefix may carry its own trailing underscore (`tg_` or `tg`).
#[must_use]
pub fn base_name(prefix: &str, normalized_path: &str) -> String {
    let segment = path_segment(normalized_path);
    let prefix = prefix.trim().trim_end_matches('_');
    if prefix.is_empty() {
        segment
    } else {
        format!("{prefix}_{segment}")
    }
}

/// Final, unique names for `endpoints`, returned in the same order.
#[must_use]
pub fn assign_names(prefix: &str, endpoints: &[(HttpMethod, &str)]) -> Vec<String> {
    let bases: Vec<String> = endpoints
        .iter()
        .map(|(_, path)| base_name(prefix, path))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for base in &bases {
        *counts.entry(base.as_str()).or_default() += 1;
    }

    let candidates: Vec<String> = bases
        .iter()
        .zip(endpoints)
        .map(|(base, (method, _))| {
            if counts.get(base.as_str()).copied().unwrap_or(0) > 1 {
                format!("{base}_{method}")
            } else {
                base.clone()
            }
        })
        .collect();

    // A method suffix can land on a name some other path already produced (`/pet_get`).
    let mut taken: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .map(|candidate| {
            if taken.insert(candidate.clone()) {
                return candidate;
            }
            let mut n = 2usize;
            loop {
                let next = format!("{candidate}_{n}");
                if taken.insert(next.clone()) {
                    return next;
                }
                n += 1;
            }
        })
        .collect()
}
