//! Small helpers shared by the registries and reply targets

/// Discord's limit on message content, in characters
pub const MESSAGE_LIMIT: usize = 2000;

/// Find an entry in a `(code name, value)` cache
pub fn cache_lookup<'a, T>(code_name: &str, cache: &'a [(String, T)]) -> Option<&'a T> {
    cache
        .iter()
        .find(|(name, _)| name == code_name)
        .map(|(_, value)| value)
}

/// Break `content` into pieces of at most `limit` characters, preferring line breaks
pub fn chunk_message(content: &str, limit: usize) -> Vec<String> {
    if limit == 0 || content.chars().count() <= limit {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // Blank lines count as lines, so an empty `current` may still hold one
    let mut has_lines = false;

    for line in content.lines() {
        let line_len = line.chars().count();
        let needed = if has_lines { line_len + 1 } else { line_len };

        if current_len + needed <= limit {
            if has_lines {
                current.push('\n');
            }
            current.push_str(line);
            current_len += needed;
            has_lines = true;
            continue;
        }

        if has_lines {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
            has_lines = false;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
            has_lines = true;
        } else {
            let chars: Vec<char> = line.chars().collect();
            chunks.extend(chars.chunks(limit).map(|piece| piece.iter().collect::<String>()));
        }
    }

    if has_lines {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cache_lookup() {
        let cache = vec![("fun".to_string(), 1), ("admin".to_string(), 2)];
        assert_eq!(cache_lookup("admin", &cache), Some(&2));
        assert_eq!(cache_lookup("Admin", &cache), None);
        assert_eq!(cache_lookup("missing", &cache), None);
    }

    #[test]
    fn test_short_messages_stay_whole() {
        assert_eq!(chunk_message("hello", MESSAGE_LIMIT), vec!["hello".to_string()]);
        assert_eq!(chunk_message("", MESSAGE_LIMIT), vec![String::new()]);
    }

    #[test]
    fn test_chunks_on_line_breaks() {
        let chunks = chunk_message("aaaa\nbbbb\ncc", 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb".to_string(), "cc".to_string()]);
    }

    #[test]
    fn test_blank_lines_survive_chunking() {
        let content = "aaaa\n\nbb\n\ncc";
        let chunks = chunk_message(content, 4);
        assert_eq!(
            chunks,
            vec!["aaaa".to_string(), "\nbb\n".to_string(), "cc".to_string()]
        );
        assert_eq!(chunks.join("\n"), content);
    }

    #[test]
    fn test_long_lines_are_cut() {
        let chunks = chunk_message("abcdefgh", 3);
        assert_eq!(
            chunks,
            vec!["abc".to_string(), "def".to_string(), "gh".to_string()]
        );
    }
}
