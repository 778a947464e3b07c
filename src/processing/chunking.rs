//! Word-budget chunking for extracted document text.
//!
//! Text is split on whitespace and packed greedily into chunks whose cost stays within a
//! character budget. Each word costs its character count plus one separator. A word that is
//! larger than the whole budget still gets a chunk of its own, so no input is ever dropped.

/// Split `text` into chunks of at most `chunk_size` characters (counting one separator per word).
///
/// Chunking is a single greedy pass with no overlap. Returns an empty vector when the text has
/// no words.
pub fn split_text(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for word in text.split_whitespace() {
        let cost = word_cost(word);
        if !current.is_empty() && current_size + cost > chunk_size {
            chunks.push(current.join(" "));
            current.clear();
            current_size = 0;
        }
        current.push(word);
        current_size += cost;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

fn word_cost(word: &str) -> usize {
    word.chars().count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk_cost(chunk: &str) -> usize {
        chunk.split_whitespace().map(word_cost).sum()
    }

    #[test]
    fn split_text_packs_words_greedily() {
        let chunks = split_text("one two three four five", 10);
        assert_eq!(chunks, vec!["one two", "three four", "five"]);
    }

    #[test]
    fn split_text_handles_empty_input() {
        assert!(split_text("", 100).is_empty());
        assert!(split_text("   \n\t ", 100).is_empty());
    }

    #[test]
    fn oversized_word_gets_its_own_chunk() {
        let chunks = split_text("a supercalifragilistic b", 5);
        assert_eq!(chunks, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn split_text_normalizes_whitespace() {
        let chunks = split_text("Section  12.\n\nThe   plaint", 1000);
        assert_eq!(chunks, vec!["Section 12. The plaint"]);
    }

    #[test]
    fn multibyte_words_are_counted_by_character() {
        // "न्याय" is 5 chars but 15 bytes.
        let chunks = split_text("न्याय न्याय", 12);
        assert_eq!(chunks, vec!["न्याय न्याय"]);
    }

    proptest! {
        #[test]
        fn chunks_reproduce_word_sequence(text in "[a-zA-Z0-9 \n\t.,]{0,400}", budget in 1usize..64) {
            let chunks = split_text(&text, budget);
            let rejoined = chunks.join(" ");
            let original: Vec<&str> = text.split_whitespace().collect();
            let produced: Vec<&str> = rejoined.split_whitespace().collect();
            prop_assert_eq!(produced, original);
        }

        #[test]
        fn chunks_respect_budget_unless_single_word(text in "[a-z ]{0,400}", budget in 1usize..64) {
            for chunk in split_text(&text, budget) {
                prop_assert!(!chunk.is_empty());
                let words = chunk.split_whitespace().count();
                prop_assert!(words == 1 || chunk_cost(&chunk) <= budget);
            }
        }

        #[test]
        fn chunk_count_grows_with_input(words in proptest::collection::vec("[a-z]{1,12}", 0..80), budget in 1usize..64, cut in 0usize..80) {
            let cut = cut.min(words.len());
            let shorter = split_text(&words[..cut].join(" "), budget);
            let longer = split_text(&words.join(" "), budget);
            prop_assert!(shorter.len() <= longer.len());
        }
    }
}
