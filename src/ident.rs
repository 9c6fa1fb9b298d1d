/// Normalizes a free-text box or item name into the canonical slug alphabet.
///
/// Lowercases and trims, then maps every run of characters outside
/// `[a-z0-9_-]` (whitespace included) to a single hyphen. Hyphen runs
/// collapse and leading/trailing hyphens are dropped, so `"  My Box!! "`
/// becomes `"my-box"`. An empty result means the input had no usable
/// characters; callers must treat that as an invalid identifier.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut gap = false;
    for ch in raw.trim().chars() {
        let ch = ch.to_ascii_lowercase();
        match ch {
            'a'..='z' | '0'..='9' | '_' => {
                if gap && !out.is_empty() {
                    out.push('-');
                }
                gap = false;
                out.push(ch);
            }
            // anything else, '-' included, widens the current gap
            _ => gap = true,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(sanitize("  My Box!! "), "my-box");
        assert_eq!(sanitize("Grand Prize"), "grand-prize");
    }

    #[test]
    fn keeps_slug_alphabet() {
        assert_eq!(sanitize("loot_box_2"), "loot_box_2");
        assert_eq!(sanitize("already-a-slug"), "already-a-slug");
    }

    #[test]
    fn collapses_runs() {
        assert_eq!(sanitize("a -- b"), "a-b");
        assert_eq!(sanitize("a!!!b"), "a-b");
    }

    #[test]
    fn trims_edge_hyphens() {
        assert_eq!(sanitize("--edge--"), "edge");
        assert_eq!(sanitize("***"), "");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   "), "");
    }
}
