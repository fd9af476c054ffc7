use crate::types::ItemMetadata;
use crate::utils::truncate_to_char_boundary;

const MAX_DESCRIPTION_BYTES: usize = 300;

/// Title keywords that mark premium material shared for free.
pub const PREMIUM_KEYWORDS: &[&str] = &[
    "full course",
    "complete",
    "masterclass",
    "free course",
    "bootcamp",
    "certification",
    "tutorial series",
];

const RUBRIC: &str = "\
Rate this content from 1-10 for educational and professional value.

SCORING RUBRIC (apply the first tier that matches):
- 9-10 ELITE: verifiable expert or credentialed source; premium course, masterclass or \
paid training shared free; advanced, non-beginner material.
- 7-8 PROFESSIONAL: practitioner with a track record; certification-grade material; \
evidence-based advanced tutorials.
- 5-6 MODERATE: general education, basic structured tutorials, informative analysis, \
news or reviews with some learning value.
- 1-4 LOW: entertainment, clickbait, drama, reactions, music, low-effort content.

OVERRIDE: music videos, songs, lyric videos and music mixes are always 1-4, whatever \
else the title suggests.

Premium signals: \"full course\", \"masterclass\", \"complete tutorial\", \"paid course \
free\", \"bootcamp\", \"certification\".";

const ANSWER_FORMAT: &str = "\
Answer with exactly one line in the form SCORE|REASON, for example:
8|Structured advanced tutorial from an experienced practitioner
If you cannot give a reason, answer with the number alone.";

/// Render the scoring prompt for one item. Pure: the same item always yields
/// the same text, and only the item block varies between items.
pub fn build_scoring_prompt(item: &ItemMetadata) -> String {
    let mut prompt = String::with_capacity(RUBRIC.len() + ANSWER_FORMAT.len() + 256);
    prompt.push_str(RUBRIC);
    prompt.push_str("\n\nCONTENT:\n");
    prompt.push_str(&format!("Title: {}\n", item.title.trim()));
    prompt.push_str(&format!("Channel: {}\n", item.author));

    if let Some(duration) = &item.duration {
        prompt.push_str(&format!("Duration: {}\n", duration));
    }
    if let Some(views) = &item.view_count {
        prompt.push_str(&format!("Views: {}\n", views));
    }
    if let Some(description) = &item.description {
        let snippet = truncate_to_char_boundary(description.trim(), MAX_DESCRIPTION_BYTES);
        prompt.push_str(&format!("Description: {}\n", snippet));
    }

    prompt.push('\n');
    prompt.push_str(ANSWER_FORMAT);
    prompt
}

/// Instruction asking the model for `count` search phrases, one per line.
pub fn build_discovery_prompt(count: usize) -> String {
    format!(
        "Suggest exactly {count} short search phrases (2-6 words each) that surface free, \
high-value educational videos: full courses, university lectures, masterclasses and \
certification prep in programming, engineering, science or professional skills.\n\
Reply with the {count} phrases only, one per line, with no numbering, quotes or explanation."
    )
}

/// Whether a title carries one of the premium keywords.
pub fn has_premium_keyword(title: &str) -> bool {
    let lower = title.to_lowercase();
    PREMIUM_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
