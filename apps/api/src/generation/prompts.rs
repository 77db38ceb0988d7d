// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Section markers. The prompt asks for them and the assembler parses against them,
/// so both sides must use these constants.
pub const POST_MARKER: &str = "[POST]";
pub const HASHTAGS_MARKER: &str = "[HASHTAGS]";
pub const CTA_MARKER: &str = "[CTA]";
pub const END_MARKER: &str = "[END]";

/// System prompt for post generation.
pub const POST_SYSTEM: &str = "You are an expert LinkedIn content creator who writes \
    engaging, professional posts for a specific audience and tone. \
    Every answer follows the exact section format requested by the user.";

/// Post generation prompt template.
/// Replace: {variant_number}, {variant_total}, {topic}, {approach}, {instruction},
///          {tone}, {audience}, {min_words}, {max_words}, {language},
///          {hashtag_instruction}, {cta_instruction}, {format}, {no_fabrication}
pub const POST_PROMPT_TEMPLATE: &str = r#"Create a single, high-quality LinkedIn post.

VARIANT: {variant_number} of {variant_total}
This variant MUST take a distinct angle from the other variants. Do not reuse their hook, structure or examples.

TOPIC: {topic}
APPROACH: {approach}
INSTRUCTION: {instruction}

REQUIREMENTS:
- Tone: {tone}
- Target Audience: {audience}
- Length: between {min_words} and {max_words} words in the post body
- Language: {language}

Write an engaging post that:
1. Hooks readers in the first line
2. Provides value to the target audience
3. Uses the specified tone consistently
4. Follows the {approach} approach
5. Includes line breaks for readability

{no_fabrication}

{hashtag_instruction}
{cta_instruction}

OUTPUT FORMAT (follow exactly, each marker on its own line):
{format}"#;

pub const HASHTAGS_REQUESTED: &str =
    "HASHTAGS: Suggest 3 to 5 relevant hashtags. Each is a single word or CamelCase phrase prefixed with '#', no spaces.";
pub const HASHTAGS_REQUIRED: &str =
    "HASHTAGS: You MUST suggest 3 to 5 relevant hashtags. Each is a single word or CamelCase phrase prefixed with '#', no spaces.";
pub const HASHTAGS_SKIPPED: &str = "HASHTAGS: Do not write any hashtags.";

pub const CTA_REQUESTED: &str =
    "CALL TO ACTION: End with one short sentence inviting readers to comment or share their experience.";
pub const CTA_SKIPPED: &str = "CALL TO ACTION: Do not write a call to action.";
