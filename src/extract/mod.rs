use crate::errors::GenerationError;

const FENCE: &str = "```";
const HTML_FENCE: &str = "```html";

/// Pulls the HTML document out of the model's text.
///
/// A fence labelled `html` wins over a bare fence. Text without any fence is
/// returned unmodified. An opening fence with no closing fence is an error
/// rather than "everything to the end of the text".
pub fn extract_html(raw: &str) -> Result<String, GenerationError> {
    if let Some(start) = raw.find(HTML_FENCE) {
        return fenced_body(&raw[start + HTML_FENCE.len()..]);
    }
    if let Some(start) = raw.find(FENCE) {
        return fenced_body(&raw[start + FENCE.len()..]);
    }
    Ok(raw.to_string())
}

fn fenced_body(after_open: &str) -> Result<String, GenerationError> {
    match after_open.find(FENCE) {
        Some(end) => Ok(after_open[..end].trim().to_string()),
        None => Err(GenerationError::UnterminatedFence),
    }
}
