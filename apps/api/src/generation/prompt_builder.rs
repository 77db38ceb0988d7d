//! Prompt builder: renders the model prompt for one variant of a validated request.
//!
//! Deterministic: the same request and variant index always produce the same prompt.
//! Each variant gets its own content approach and an explicit "distinct angle"
//! instruction so that variants of one request do not converge on the same text.

use crate::generation::prompts::{
    CTA_MARKER, CTA_REQUESTED, CTA_SKIPPED, END_MARKER, HASHTAGS_MARKER, HASHTAGS_REQUESTED,
    HASHTAGS_REQUIRED, HASHTAGS_SKIPPED, POST_MARKER, POST_PROMPT_TEMPLATE, POST_SYSTEM,
};
use crate::generation::validator::GenerationRequest;
use crate::llm_client::prompts::{NO_FABRICATION_INSTRUCTION, NO_PREAMBLE_SYSTEM};

/// A content angle a variant is written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Approach {
    pub name: &'static str,
    pub instruction: &'static str,
    /// Question-led posts drive replies; used by the engagement estimate.
    pub invites_discussion: bool,
}

/// Rotated by variant index.
pub const APPROACHES: [Approach; 5] = [
    Approach {
        name: "Story/Personal Experience",
        instruction: "Tell a personal story or anecdote related to the topic. Make it relatable and authentic.",
        invites_discussion: false,
    },
    Approach {
        name: "Data/Insights",
        instruction: "Share interesting data, statistics, or insights about the topic. Make it informative and valuable.",
        invites_discussion: false,
    },
    Approach {
        name: "Question/Engagement",
        instruction: "Ask thoughtful questions to spark discussion and engagement about the topic.",
        invites_discussion: true,
    },
    Approach {
        name: "How-to/Educational",
        instruction: "Provide actionable tips or educational content about the topic.",
        invites_discussion: false,
    },
    Approach {
        name: "Industry Trends",
        instruction: "Discuss current trends and future predictions related to the topic.",
        invites_discussion: false,
    },
];

/// The rendered prompt for one variant attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    /// Zero-based.
    pub variant_index: usize,
    pub approach: Approach,
    pub system: String,
    pub prompt: String,
}

pub fn approach_for(variant_index: usize) -> Approach {
    APPROACHES[variant_index % APPROACHES.len()]
}

pub fn build(request: &GenerationRequest, variant_index: usize) -> PromptSpec {
    let approach = approach_for(variant_index);
    let (min_words, max_words) = request.length.target_words();

    let hashtag_instruction = if request.require_hashtags {
        HASHTAGS_REQUIRED
    } else if request.include_hashtags {
        HASHTAGS_REQUESTED
    } else {
        HASHTAGS_SKIPPED
    };
    let cta_instruction = if request.include_cta {
        CTA_REQUESTED
    } else {
        CTA_SKIPPED
    };

    let prompt = POST_PROMPT_TEMPLATE
        .replace("{variant_number}", &(variant_index + 1).to_string())
        .replace("{variant_total}", &request.variant_count.to_string())
        .replace("{approach}", approach.name)
        .replace("{instruction}", approach.instruction)
        .replace("{tone}", &request.tone.label)
        .replace("{audience}", &request.audience.label)
        .replace("{min_words}", &min_words.to_string())
        .replace("{max_words}", &max_words.to_string())
        .replace("{language}", &request.language)
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{hashtag_instruction}", hashtag_instruction)
        .replace("{cta_instruction}", cta_instruction)
        .replace("{format}", &output_format(request))
        // Topic last: user text must not be scanned for placeholders.
        .replace("{topic}", &request.topic);

    PromptSpec {
        variant_index,
        approach,
        system: format!("{POST_SYSTEM} {NO_PREAMBLE_SYSTEM}"),
        prompt,
    }
}

fn output_format(request: &GenerationRequest) -> String {
    let mut lines = vec![POST_MARKER.to_string(), "<post body>".to_string()];
    if request.include_hashtags {
        lines.push(HASHTAGS_MARKER.to_string());
        lines.push("<hashtags separated by spaces>".to_string());
    }
    if request.include_cta {
        lines.push(CTA_MARKER.to_string());
        lines.push("<one-sentence call to action>".to_string());
    }
    lines.push(END_MARKER.to_string());
    lines.join("\n")
}
