//! Prompts for the prerequisite classifier

use crate::concepts::ConceptCorpus;

/// Generic prompt for concepts seen more than once
pub const SYSTEM_PROMPT_PREREQUISITES: &str = "You are an expert curriculum mapper.\n\
You will receive ONE target concept.\n\
Return ONLY a single JSON object:\n  \
{\"concept\":\"...\", \"noisy\": false, \"prerequisites\": [\"...\", \"...\"]}\n\
- 'prerequisites' are 0+ foundational, language-agnostic ideas.\n\
- Use concise canonical names; deduplicate.\n\
- No people, brands, tools, or languages; prefer underlying ideas.\n\
- If none, return an empty list.\n\
No prose; only the JSON object.";

/// Stricter prompt for single-occurrence concepts, allowed to call them noisy
pub fn noise_filter_prompt(book_title: &str, chapter: &str) -> String {
    format!(
        "You are an expert curriculum mapper for '{book_title}', chapter '{chapter}'. \
You will receive ONE candidate concept.\n\
Decide if it is a legitimate learnable concept for this context.\n\
Return ONLY a single JSON object:\n  \
{{\"concept\":\"...\", \"noisy\": true|false, \"prerequisites\": [\"...\", \"...\"]}}\n\
- 'prerequisites' are 0+ foundational ideas. Deduplicate.\n\
- Prefer underlying ideas over tools/languages/brands/people.\n\
- If uncertain, use noisy=false with empty list.\n\
No prose; only the JSON object."
    )
}

/// Recheck prompt that treats the supplied book text as primary evidence
pub fn context_noise_filter_prompt(book_title: &str, chapter: &str) -> String {
    format!(
        "You are a curriculum-mapping assistant for '{book_title}', chapter '{chapter}'. \
You will receive ONE candidate concept PLUS CONTEXT from the book. \
Treat CONTEXT as primary evidence.\n\
Return ONLY a single JSON object:\n  \
{{\"concept\":\"...\", \"noisy\": true|false, \"prerequisites\": [\"...\", \"...\"]}}\n\
- If unrelated to CONTEXT or not teachable, set noisy:true.\n\
- Otherwise, set noisy:false and list prerequisites.\n\
- Deduplicate; do not repeat the target concept.\n\
No prose; only the JSON object."
    )
}

/// Prompt for the first pass, chosen by how often the concept occurs
pub fn select_system_prompt(concept: &str, count: usize, corpus: &ConceptCorpus) -> String {
    if count > 1 {
        return SYSTEM_PROMPT_PREREQUISITES.to_string();
    }
    match corpus.get_concept_occurrences(concept).first() {
        Some(key) => noise_filter_prompt(&key.book_title, &key.chapter),
        None => noise_filter_prompt("", ""),
    }
}

/// User message for the first pass
pub fn concept_text(concept: &str) -> String {
    format!("CONCEPT: {}", concept)
}

/// User message for the recheck
pub fn concept_with_context_text(concept: &str, context: &str) -> String {
    format!("CONCEPT: {}\n\nCONTEXT:\n{}", concept, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_mention_book_and_chapter() {
        let prompt = noise_filter_prompt("SICP", "Streams");
        assert!(prompt.contains("'SICP'"));
        assert!(prompt.contains("chapter 'Streams'"));
        assert!(prompt.contains("\"noisy\": true|false"));

        let prompt = context_noise_filter_prompt("SICP", "Streams");
        assert!(prompt.contains("PLUS CONTEXT"));
    }

    #[test]
    fn test_frequent_concepts_use_generic_prompt() {
        let corpus = ConceptCorpus::default();
        assert_eq!(
            select_system_prompt("Streams", 2, &corpus),
            SYSTEM_PROMPT_PREREQUISITES
        );
        assert!(select_system_prompt("Streams", 1, &corpus).contains("for '', chapter ''"));
    }

    #[test]
    fn test_user_texts() {
        assert_eq!(concept_text("Closures"), "CONCEPT: Closures");
        assert_eq!(
            concept_with_context_text("Closures", "A closure captures..."),
            "CONCEPT: Closures\n\nCONTEXT:\nA closure captures..."
        );
    }
}
