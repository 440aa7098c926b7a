/// Marker the server puts around words matching the text query.
const MARKER: &str = "**";

/// A run of preview text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub highlighted: bool,
}

/// Split a preview on `**`; every odd-numbered run is a match.
///
/// An unbalanced trailing marker highlights the rest of the preview, the
/// same as a plain split would.
pub fn highlight_segments(preview: &str) -> Vec<Segment<'_>> {
    preview
        .split(MARKER)
        .enumerate()
        .filter(|(_, text)| !text.is_empty())
        .map(|(idx, text)| Segment {
            text,
            highlighted: idx % 2 == 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Segment<'_> {
        Segment {
            text,
            highlighted: false,
        }
    }

    fn marked(text: &str) -> Segment<'_> {
        Segment {
            text,
            highlighted: true,
        }
    }

    #[test]
    fn test_preview_without_markers_is_one_plain_segment() {
        assert_eq!(highlight_segments("just text"), vec![plain("just text")]);
    }

    #[test]
    fn test_markers_alternate_highlighting() {
        assert_eq!(
            highlight_segments("an **lru** cache and a **cache** miss"),
            vec![
                plain("an "),
                marked("lru"),
                plain(" cache and a "),
                marked("cache"),
                plain(" miss"),
            ]
        );
    }

    #[test]
    fn test_leading_match_keeps_parity() {
        assert_eq!(
            highlight_segments("**cache** first"),
            vec![marked("cache"), plain(" first")]
        );
    }

    #[test]
    fn test_empty_preview_has_no_segments() {
        assert!(highlight_segments("").is_empty());
    }
}
