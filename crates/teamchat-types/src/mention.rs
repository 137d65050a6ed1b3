use crate::MENTION_TOKEN;

/// True when the text addresses the assistant.
pub fn mentions_assistant(text: &str) -> bool {
    text.to_lowercase().contains(MENTION_TOKEN)
}

/// A run of message content, either plain text or an `@word` mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Mention(&'a str),
}

/// Split content into plain and `@word` segments for highlighting.
/// A word is a run of ASCII alphanumerics or underscores; a bare `@` stays text.
pub fn segments(content: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = content.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'@' {
            let word_end = bytes[i + 1..]
                .iter()
                .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
                .map_or(bytes.len(), |p| i + 1 + p);
            if word_end > i + 1 {
                if start < i {
                    out.push(Segment::Text(&content[start..i]));
                }
                out.push(Segment::Mention(&content[i..word_end]));
                start = word_end;
                i = word_end;
                continue;
            }
        }
        i += 1;
    }

    if start < content.len() {
        out.push(Segment::Text(&content[start..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_is_case_insensitive() {
        assert!(mentions_assistant("hey @Claude can you help"));
        assert!(mentions_assistant("@CLAUDE"));
        assert!(!mentions_assistant("claude without the at"));
        assert!(!mentions_assistant("@clau de"));
    }

    #[test]
    fn splits_mentions_from_text() {
        assert_eq!(
            segments("hi @Claude, ping @bob_2!"),
            vec![
                Segment::Text("hi "),
                Segment::Mention("@Claude"),
                Segment::Text(", ping "),
                Segment::Mention("@bob_2"),
                Segment::Text("!"),
            ]
        );
    }

    #[test]
    fn bare_at_sign_is_text() {
        assert_eq!(segments("a @ b"), vec![Segment::Text("a @ b")]);
        assert_eq!(segments(""), Vec::<Segment>::new());
    }
}
