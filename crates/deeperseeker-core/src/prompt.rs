/// Prompt templates applied to a video transcript before it is sent as a user
/// message.
///
/// Which template applies is a caller decision (for example a choice dialog);
/// the rendered string is ordinary history content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptPrompt {
    /// Comprehensive summary of main points and takeaways.
    Summarize,
    /// List of the most important points.
    KeyPoints,
    /// Free-form question answered against the transcript.
    Question(String),
}

impl TranscriptPrompt {
    /// Renders the prompt for `transcript`.
    pub fn render(&self, transcript: &str) -> String {
        match self {
            Self::Summarize => format!(
                "Please analyze this YouTube video transcript and provide a comprehensive summary of the main points and key takeaways:\n\n{transcript}"
            ),
            Self::KeyPoints => format!(
                "Please analyze this YouTube video transcript and list the most important key points discussed:\n\n{transcript}"
            ),
            Self::Question(question) => format!(
                "Based on this YouTube video transcript:\n\n{transcript}\n\nPlease answer the following: {question}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_follows_the_instruction() {
        let rendered = TranscriptPrompt::Summarize.render("TRANSCRIPT");
        assert!(rendered.starts_with("Please analyze"));
        assert!(rendered.ends_with(":\n\nTRANSCRIPT"));
        assert!(TranscriptPrompt::KeyPoints.render("T").contains("key points"));
    }

    #[test]
    fn question_is_appended_after_transcript() {
        let rendered = TranscriptPrompt::Question("who speaks?".into()).render("T");
        assert_eq!(
            rendered,
            "Based on this YouTube video transcript:\n\nT\n\nPlease answer the following: who speaks?"
        );
    }
}
