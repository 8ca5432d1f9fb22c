//! Filename pattern matching for top-level file hints

/// Match a top-level entry name against a hint pattern (case-insensitive).
///
/// Supported forms:
/// - `Dockerfile` exact name
/// - `*.tf`, `next.config.*`, `docker-compose*.yml` with any number of `*`
/// - `notebooks/` a directory entry, matched by name
pub fn file_pattern_match(pattern: &str, name: &str) -> bool {
    let pattern = pattern.trim().trim_end_matches('/').to_ascii_lowercase();
    let name = name.trim().trim_end_matches('/').to_ascii_lowercase();

    if pattern.is_empty() || name.is_empty() {
        return false;
    }

    // No wildcard: exact match only
    if !pattern.contains('*') {
        return pattern == name;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return false,
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return false,
    };

    if !name.starts_with(first) {
        return false;
    }
    let mut remaining = &name[first.len()..];
    if remaining.len() < last.len() {
        return false;
    }
    let tail_start = remaining.len() - last.len();
    if !remaining.is_char_boundary(tail_start) || &remaining[tail_start..] != *last {
        return false;
    }
    remaining = &remaining[..tail_start];

    // Middle segments must appear in order between prefix and suffix
    for segment in middle {
        match remaining.find(segment) {
            Some(idx) => remaining = &remaining[idx + segment.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_case_insensitive() {
        assert!(file_pattern_match("Dockerfile", "dockerfile"));
        assert!(file_pattern_match("Cargo.toml", "Cargo.toml"));
        assert!(!file_pattern_match("Cargo.toml", "Cargo.lock"));
    }

    #[test]
    fn test_extension_wildcard() {
        assert!(file_pattern_match("*.tf", "main.tf"));
        assert!(!file_pattern_match("*.tf", "main.tfvars"));
        assert!(file_pattern_match("*.ipynb", "Analysis.ipynb"));
    }

    #[test]
    fn test_prefix_wildcard() {
        assert!(file_pattern_match("next.config.*", "next.config.mjs"));
        assert!(!file_pattern_match("next.config.*", "vite.config.ts"));
    }

    #[test]
    fn test_middle_wildcard() {
        assert!(file_pattern_match("docker-compose*.yml", "docker-compose.yml"));
        assert!(file_pattern_match("docker-compose*.yml", "docker-compose.prod.yml"));
        assert!(!file_pattern_match("docker-compose*.yml", "docker-compose.yaml"));
    }

    #[test]
    fn test_multiple_wildcards() {
        assert!(file_pattern_match("*test*.py", "my_test_utils.py"));
        assert!(!file_pattern_match("*test*.py", "main.py"));
    }

    #[test]
    fn test_directory_pattern() {
        assert!(file_pattern_match("notebooks/", "notebooks"));
        assert!(file_pattern_match("src-tauri/", "src-tauri/"));
        assert!(!file_pattern_match("lib/", "library"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(!file_pattern_match("", "x"));
        assert!(!file_pattern_match("*", ""));
    }
}
