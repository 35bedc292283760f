/// Chunk size for outbound text. Telegram rejects messages above 4096
/// characters; HTML entities and emoji push real lengths past the visible
/// count, so chunks stay well under it.
pub const MAX_MESSAGE_CHARS: usize = 3800;

/// Caption limit for `sendPhoto`/`sendVideo`.
pub const MAX_CAPTION_CHARS: usize = 900;

/// Splits `text` into ordered chunks of at most `max_len` characters.
///
/// Cuts land on the last newline at or before `max_len`, unless that newline
/// sits in the first half of the window, in which case the cut is forced at
/// `max_len`. The newline is kept at the start of the next chunk, so the
/// chunks concatenate back to the input. A trailing remainder that is only
/// whitespace is dropped.
pub fn split_for_telegram(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 || text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut remaining = text;

    while remaining.chars().count() > max_len {
        // Byte end of the window [0, max_len] inclusive, so a newline at
        // exactly max_len is still a candidate.
        let window_end = remaining
            .char_indices()
            .nth(max_len + 1)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());

        let newline_char_idx = remaining[..window_end]
            .rfind('\n')
            .map(|byte_idx| remaining[..byte_idx].chars().count());

        let cut_chars = match newline_char_idx {
            Some(idx) if idx * 2 >= max_len => idx,
            _ => max_len,
        };
        let cut = byte_offset(remaining, cut_chars);

        parts.push(remaining[..cut].to_string());
        remaining = &remaining[cut..];
    }

    if !remaining.trim().is_empty() {
        parts.push(remaining.to_string());
    }
    parts
}

/// Escapes user-supplied text for `parse_mode=HTML`.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
