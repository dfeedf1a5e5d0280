//! Input sanitization for caller-supplied text.

use tracing::warn;

use reel_models::PipelineInput;

/// Maximum prompt length.
pub const MAX_PROMPT_LENGTH: usize = 5000;

/// Maximum length of the short optional hints (tone, audience...).
pub const MAX_HINT_LENGTH: usize = 200;

/// Maximum length of a caller-chosen job id.
pub const MAX_JOB_ID_LENGTH: usize = 128;

/// Strip control characters (newlines and tabs survive) and cap the length.
pub fn sanitize_string(input: &str, max_chars: usize) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_chars)
        .collect()
}

fn sanitize_hint(hint: Option<String>) -> Option<String> {
    hint.map(|h| sanitize_string(h.trim(), MAX_HINT_LENGTH))
        .filter(|h| !h.is_empty())
}

/// Clean every free-text field of a generation input.
pub fn sanitize_input(mut input: PipelineInput) -> PipelineInput {
    let chars = input.prompt.chars().count();
    if chars > MAX_PROMPT_LENGTH {
        warn!("Prompt truncated from {} to {} chars", chars, MAX_PROMPT_LENGTH);
    }
    input.prompt = sanitize_string(&input.prompt, MAX_PROMPT_LENGTH);
    input.product_type = sanitize_hint(input.product_type);
    input.audience = sanitize_hint(input.audience);
    input.tone = sanitize_hint(input.tone);
    input.language = sanitize_hint(input.language);
    for image in &mut input.images {
        image.description = sanitize_hint(image.description.take());
    }
    input
}

/// Validate job id format.
///
/// Alphanumeric characters, hyphens and underscores only, 1-128 chars.
pub fn is_valid_job_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_JOB_ID_LENGTH
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
