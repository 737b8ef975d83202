//! Prompt templates for video summaries and questions

/// Prompt for one section of a chunked transcript
#[must_use]
pub fn chunk(title: &str, index: usize, total: usize, text: &str) -> String {
    format!(
        "Summarize this part ({index}/{total}) of the YouTube video \"{title}\".

Focus on:
- Key points and main ideas
- Important details and facts
- Actionable insights
- Notable quotes or examples

Keep it concise but informative:

{text}"
    )
}

/// Prompt merging section summaries into one
#[must_use]
pub fn merge(title: &str, summaries: &str) -> String {
    format!(
        "Create a comprehensive summary of the YouTube video \"{title}\" based on these section summaries:

{summaries}

Create a well-structured summary that:
- Captures the main theme and purpose
- Highlights key points and insights in detail
- Maintains logical flow and structure
- Includes important examples, quotes, and actionable insights
- Is thorough but well-organized

Format with clear sections and bullet points where appropriate."
    )
}

/// Prompt summarizing a whole transcript at once
#[must_use]
pub fn single_pass(title: &str, transcript: &str) -> String {
    format!(
        "Create a comprehensive summary of the YouTube video \"{title}\" based on its complete transcript:

{transcript}

Create a well-structured summary that:
- Captures the main theme and purpose
- Highlights all key points and insights in detail
- Maintains logical flow and structure
- Includes important examples, quotes, and actionable insights
- Is thorough but well-organized

Format with clear sections and bullet points where appropriate. Be comprehensive since this is the only chance to capture all important information."
    )
}

/// Prompt answering a question from a (possibly truncated) transcript
#[must_use]
pub fn question(title: &str, question: &str, transcript: &str) -> String {
    format!(
        "Answer the following question about the YouTube video \"{title}\" based on its transcript:

Question: {question}

Video transcript:
{transcript}

Provide a helpful, accurate answer based on the content. If the information isn't in the transcript, say so."
    )
}
