/*!
 * Prompt templates for vocabulary generation.
 */

/// Line that precedes the serialized request in the enhancement prompt
pub const PAYLOAD_MARKER: &str = "[INPUT DATA]";

/// System prompt for batch enhancement
pub const ENHANCEMENT_SYSTEM: &str = r#"You are a Japanese language education agent. Build learning content from the provided `data` and `groups`.

## Tasks
1. Subtitle translation: translate each `data[].text` into {target_language}, following its context.
2. Word definition: analyse each word in `data[].words`.
   - `m` (meaning) must reflect the context of the parent `text` first.
   - `r` is the reading in hiragana.
   - `lv` is the JLPT level, one of N1, N2, N3, N4, N5.
3. Group examples: for each entry of `groups`, write one new Japanese sentence that uses every word listed in `wids`, and translate it.
   - `wids` refers to `data[].words[].id`. Never use a subtitle line verbatim as an example.

## Rules
- Every `id` and `gid` from the input must be returned unchanged. Do not invent ids.
- Answer with the JSON object only, without preamble or explanation.
- Keep example translations short."#;

/// Output contract appended to the enhancement prompt
pub const ENHANCEMENT_FORMAT: &str = r#"Return a JSON object with exactly these keys:
{"trans": [{"s_id": <data id>, "tr_ko": <translation>}],
 "words": [{"w_id": <word id>, "m": <meaning>, "r": <reading>, "lv": "N1".."N5"}],
 "exs": [{"gid": <group id>, "ex_ja": <example>, "ex_ko": <translation>, "wids": [<word id>]}]}"#;

/// System prompt for the word extraction step of the agent
pub const EXTRACT_SYSTEM: &str =
    "You create language-learning material. Pick the words from a subtitle that are most worth studying.";

/// System prompt for the content generation step of the agent
pub const GENERATE_SYSTEM: &str = r#"You write vocabulary cards for language learners.
Return a JSON object {"entries": [{"word": <word>, "meaning": <meaning>, "example": <example sentence>}]}
with exactly one entry per requested word and no other text."#;

/// Render the system prompt for a target language
pub fn enhancement_system(target_language: &str) -> String {
    ENHANCEMENT_SYSTEM.replace("{target_language}", target_language)
}

/// Render the user prompt around a serialized request
pub fn enhancement_prompt(payload_json: &str) -> String {
    format!("{}\n\n{}\n{}", ENHANCEMENT_FORMAT, PAYLOAD_MARKER, payload_json)
}

/// Recover the serialized request from a rendered enhancement prompt
pub fn payload_from_prompt(prompt: &str) -> Option<&str> {
    prompt
        .find(PAYLOAD_MARKER)
        .map(|index| prompt[index + PAYLOAD_MARKER.len()..].trim())
}

/// Prompt for the agent's extraction step
pub fn extract_prompt(subtitle_raw: &str, word_count: usize) -> String {
    format!(
        "Select the {} most important words from the following subtitle and answer with the words only, separated by commas:\n{}",
        word_count, subtitle_raw
    )
}

/// Prompt for the agent's generation step
pub fn generate_prompt(subtitle_raw: &str, words: &[String]) -> String {
    format!(
        "Subtitle:\n{}\n\nWords:\n{}",
        subtitle_raw,
        words.join(", ")
    )
}
