//! Response parsing into question/answer pairs

pub const QUESTION_MARKER: &str = "Q:";
pub const ANSWER_MARKER: &str = "A:";

/// Question and answer extracted from one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPair {
    pub question: String,
    pub answer: String,
}

/// Extract a question/answer pair from raw response text.
///
/// The question is the text between the first `Q:` and the first `A:` that
/// follows it; the answer is everything after that `A:`. Both are trimmed.
/// Returns `None` when a marker is missing or either part is empty.
pub fn parse_response(content: &str) -> Option<ParsedPair> {
    let question_start = content.find(QUESTION_MARKER)? + QUESTION_MARKER.len();
    let after_question = &content[question_start..];

    let answer_offset = after_question.find(ANSWER_MARKER)?;
    let question = after_question[..answer_offset].trim();
    let answer = after_question[answer_offset + ANSWER_MARKER.len()..].trim();

    if question.is_empty() || answer.is_empty() {
        return None;
    }

    Some(ParsedPair {
        question: question.to_string(),
        answer: answer.to_string(),
    })
}
