use serde::{Deserialize, Serialize};

/// Characters and spaces credited to the typist for one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCredit {
    pub correct_word_chars: usize,
    pub correct_spaces: usize,
}

impl WordCredit {
    /// Characters that count towards net wpm.
    pub fn wpm_chars(&self) -> usize {
        self.correct_word_chars + self.correct_spaces
    }
}

/// Walks `text` word by word and credits the words `typed` got right.
///
/// A word only counts once the space after it has been typed correctly,
/// except for the final word which has no space. When `test_ended` is set
/// the word under the cursor gets partial credit if what was typed of it so
/// far matches. Positions are counted in chars.
pub fn evaluate(typed: &str, text: &str, test_ended: bool) -> WordCredit {
    let text: Vec<char> = text.chars().collect();
    let typed: Vec<char> = typed.chars().collect();
    let mut credit = WordCredit::default();

    let mut index = 0;
    while index < text.len() {
        let word_end = text[index..]
            .iter()
            .position(|&c| c == ' ')
            .map_or(text.len(), |offset| index + offset);

        if typed.len() < word_end {
            if test_ended && typed.len() > index && typed[index..] == text[index..typed.len()] {
                credit.correct_word_chars += typed.len() - index;
            }
            break;
        }

        let word_correct = typed[index..word_end] == text[index..word_end];

        if word_end == text.len() {
            if word_correct {
                credit.correct_word_chars += word_end - index;
            }
            break;
        }

        let has_typed_space = typed.len() > word_end;
        let space_correct = has_typed_space && typed[word_end] == ' ';
        if word_correct && space_correct {
            credit.correct_word_chars += word_end - index;
            credit.correct_spaces += 1;
        }

        if !has_typed_space {
            break;
        }
        index = word_end + 1;
    }

    credit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credit(correct_word_chars: usize, correct_spaces: usize) -> WordCredit {
        WordCredit {
            correct_word_chars,
            correct_spaces,
        }
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(evaluate("", "", false), credit(0, 0));
        assert_eq!(evaluate("abc", "", true), credit(0, 0));
    }

    #[test]
    fn test_nothing_typed() {
        assert_eq!(evaluate("", "hello world", false), credit(0, 0));
        assert_eq!(evaluate("", "hello world", true), credit(0, 0));
    }

    #[test]
    fn test_fully_typed() {
        assert_eq!(evaluate("the quick fox", "the quick fox", false), credit(11, 2));
    }

    #[test]
    fn test_single_word_text() {
        assert_eq!(evaluate("hello", "hello", false), credit(5, 0));
        assert_eq!(evaluate("hellp", "hello", false), credit(0, 0));
    }

    #[test]
    fn test_word_waits_for_space() {
        // the boundary is reached but the space is not typed yet
        assert_eq!(evaluate("cat", "cat dog", false), credit(0, 0));
        assert_eq!(evaluate("cat ", "cat dog", false), credit(3, 1));
    }

    #[test]
    fn test_wrong_space_drops_word() {
        assert_eq!(evaluate("catX", "cat dog", false), credit(0, 0));
        assert_eq!(evaluate("catXdox", "cat dog", true), credit(0, 0));
        // "cat" is dropped, the final "dog" still counts on its own
        assert_eq!(evaluate("catXdog", "cat dog", false), credit(3, 0));
    }

    #[test]
    fn test_wrong_word_keeps_going() {
        // "cax" is wrong, but "dog" after it still counts
        assert_eq!(evaluate("cax dog", "cat dog", false), credit(3, 0));
        assert_eq!(evaluate("cax dog ", "cat dog fish", false), credit(3, 1));
    }

    #[test]
    fn test_partial_credit_only_when_ended() {
        assert_eq!(evaluate("hel", "hello world", true), credit(3, 0));
        assert_eq!(evaluate("hel", "hello world", false), credit(0, 0));
    }

    #[test]
    fn test_partial_credit_requires_exact_prefix() {
        assert_eq!(evaluate("hex", "hello world", true), credit(0, 0));
        assert_eq!(evaluate("hello wo", "hello world", true), credit(7, 1));
    }

    #[test]
    fn test_partial_credit_on_last_word() {
        assert_eq!(evaluate("hello wor", "hello world", true), credit(8, 1));
    }

    #[test]
    fn test_partial_credit_needs_a_typed_char() {
        // cursor sits right after a space with nothing of the next word typed
        assert_eq!(evaluate("hello ", "hello world", true), credit(5, 1));
    }

    #[test]
    fn test_multibyte_chars() {
        assert_eq!(evaluate("héllo wörld", "héllo wörld", false), credit(10, 1));
        assert_eq!(evaluate("wö", "wörld", true), credit(2, 0));
    }

    #[test]
    fn test_wpm_chars() {
        assert_eq!(credit(9, 2).wpm_chars(), 11);
    }

    #[test]
    fn test_monotonic_over_prefixes() {
        let text = "pack my box with five dozen jugs";
        let typed = "pack my bix with five dozen jugs";
        let mut last = 0;
        for end in 0..=typed.len() {
            let current = evaluate(&typed[..end], text, false).correct_word_chars;
            assert!(current >= last, "credit dropped at prefix {}", end);
            last = current;
        }
    }
}
