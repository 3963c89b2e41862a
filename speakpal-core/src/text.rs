// Reply text helpers.

pub const FEEDBACK_START: &str = "FEEDBACK_START";
pub const FEEDBACK_END: &str = "FEEDBACK_END";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReply {
    pub main_text: String,
    pub feedback: Option<String>,
}

/// Split an AI reply into the conversational part and the embedded feedback block.
///
/// Everything before the first `FEEDBACK_START` is the reply. The feedback is the text after
/// it (up to a repeated opening marker, if any) with the first `FEEDBACK_END` removed.
/// Without an opening marker the input is returned untouched.
pub fn split_feedback(text: &str) -> SplitReply {
    let Some((head, rest)) = text.split_once(FEEDBACK_START) else {
        return SplitReply {
            main_text: text.to_string(),
            feedback: None,
        };
    };

    let segment = rest.split(FEEDBACK_START).next().unwrap_or_default();
    let feedback = segment.replacen(FEEDBACK_END, "", 1);
    let feedback = feedback.trim();

    SplitReply {
        main_text: head.trim().to_string(),
        feedback: (!feedback.is_empty()).then(|| feedback.to_string()),
    }
}
