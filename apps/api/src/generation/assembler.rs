//! Post assembler: parses sectioned model output into a `GeneratedPost`.
//!
//! Grammar (markers from `generation::prompts`, each at the start of its own line):
//!
//! ```text
//! [POST]      body text, required and non-empty
//! [HASHTAGS]  whitespace/comma separated tags, optional
//! [CTA]       one sentence, optional
//! [END]       optional terminator; anything after it is ignored
//! ```
//!
//! Text before `[POST]` is discarded. A repeated section is ambiguous and fails
//! closed with `MalformedOutput`. Word counts outside the tolerance band are flagged,
//! never truncated or padded.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::generation::invoker::ModelResponse;
use crate::generation::prompt_builder::PromptSpec;
use crate::generation::prompts::{CTA_MARKER, END_MARKER, HASHTAGS_MARKER, POST_MARKER};
use crate::generation::validator::GenerationRequest;

pub const MAX_HASHTAGS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("malformed model output: {0}")]
    MalformedOutput(String),
}

/// Where the body's word count landed relative to the requested bucket's band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthCheck {
    WithinBand,
    TooShort,
    TooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engagement {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPost {
    pub variant_index: usize,
    pub approach: String,
    pub body: String,
    pub hashtags: Vec<String>,
    pub call_to_action: String,
    pub word_count: u32,
    pub length_check: LengthCheck,
    pub estimated_engagement: Engagement,
    pub tone_used: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    Post,
    Hashtags,
    Cta,
}

#[derive(Debug, Default)]
struct Sections {
    post: Option<String>,
    hashtags: Option<String>,
    cta: Option<String>,
}

pub fn assemble(
    response: &ModelResponse,
    request: &GenerationRequest,
    spec: &PromptSpec,
) -> Result<GeneratedPost, AssemblyError> {
    let sections = split_sections(strip_code_fences(&response.text))?;

    let body = sections
        .post
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AssemblyError::MalformedOutput("missing post body".to_string()))?;

    let hashtags = if request.include_hashtags {
        sections
            .hashtags
            .as_deref()
            .map(extract_hashtags)
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    if request.require_hashtags && hashtags.is_empty() {
        return Err(AssemblyError::MalformedOutput(
            "hashtags were required but none were usable".to_string(),
        ));
    }

    let call_to_action = if request.include_cta {
        sections.cta.unwrap_or_default()
    } else {
        String::new()
    };

    let word_count = body.split_whitespace().count() as u32;
    let length_check = check_length(request, word_count);
    if length_check != LengthCheck::WithinBand {
        let (low, high) = request.length.tolerance_band();
        warn!(
            variant = spec.variant_index,
            "post has {} words, outside the {} band [{}, {}]",
            word_count,
            request.length,
            low,
            high
        );
    }

    Ok(GeneratedPost {
        variant_index: spec.variant_index,
        approach: spec.approach.name.to_string(),
        estimated_engagement: estimate_engagement(request, spec, word_count),
        body,
        hashtags,
        call_to_action,
        word_count,
        length_check,
        tone_used: request.tone.label.clone(),
    })
}

/// Strips a surrounding ```...``` fence (with or without a language tag).
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line, if any.
    let rest = match rest.find('\n') {
        Some(newline) if !rest[..newline].contains('[') => &rest[newline + 1..],
        _ => rest,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn split_sections(text: &str) -> Result<Sections, AssemblyError> {
    let mut sections = Sections::default();
    let mut seen = HashSet::new();
    let mut current: Option<(Section, Vec<&str>)> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if starts_with_marker(trimmed, END_MARKER) {
            break;
        }
        let opened = [
            (POST_MARKER, Section::Post),
            (HASHTAGS_MARKER, Section::Hashtags),
            (CTA_MARKER, Section::Cta),
        ]
        .into_iter()
        .find(|(marker, _)| starts_with_marker(trimmed, marker));

        match opened {
            Some((marker, section)) => {
                if !seen.insert(section) {
                    return Err(AssemblyError::MalformedOutput(format!(
                        "section {marker} appears more than once"
                    )));
                }
                if let Some((done, lines)) = current.take() {
                    store(&mut sections, done, &lines);
                }
                let inline = trimmed[marker.len()..].trim();
                let lines = if inline.is_empty() { vec![] } else { vec![inline] };
                current = Some((section, lines));
            }
            None => {
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line);
                }
            }
        }
    }
    if let Some((done, lines)) = current {
        store(&mut sections, done, &lines);
    }
    Ok(sections)
}

fn starts_with_marker(line: &str, marker: &str) -> bool {
    line.get(..marker.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(marker))
}

fn store(sections: &mut Sections, section: Section, lines: &[&str]) {
    let text = lines.join("\n").trim().to_string();
    match section {
        Section::Post => sections.post = Some(text),
        Section::Hashtags => sections.hashtags = Some(text),
        Section::Cta => sections.cta = Some(text),
    }
}

/// Normalizes, validates and de-duplicates hashtags, keeping first-seen order.
pub fn extract_hashtags(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter_map(normalize_hashtag)
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .take(MAX_HASHTAGS)
        .collect()
}

fn normalize_hashtag(token: &str) -> Option<String> {
    let word = token
        .trim_start_matches('#')
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ':' | ')' | '"' | '\''));
    let valid = !word.is_empty() && word.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| format!("#{word}"))
}

fn check_length(request: &GenerationRequest, word_count: u32) -> LengthCheck {
    let (low, high) = request.length.tolerance_band();
    if word_count < low {
        LengthCheck::TooShort
    } else if word_count > high {
        LengthCheck::TooLong
    } else {
        LengthCheck::WithinBand
    }
}

fn estimate_engagement(request: &GenerationRequest, spec: &PromptSpec, word_count: u32) -> Engagement {
    let (min, max) = request.length.target_words();
    if spec.approach.invites_discussion {
        Engagement::High
    } else if word_count < min {
        Engagement::Low
    } else if word_count >= (min + max) / 2 {
        Engagement::High
    } else {
        Engagement::Medium
    }
}
