//! Prompts for the independent cross-check.
//!
//! The reply format is line-oriented on purpose: the parser in
//! [`crate::crosscheck`] reads it with plain line scans.

/// System instruction for the fact-check call.
pub const FACT_CHECK_SYSTEM_PROMPT: &str = r#"
You are a fact-checking assistant. You judge whether a news statement is
likely to be fabricated or genuine.

Consider:
- Factual accuracy
- Whether the claim is verifiable from reputable sources
- Logical consistency
- Common misinformation patterns
- Context and plausibility

If you cannot tell, say UNCERTAIN. Do not guess.
"#;

/// User message template. `{statement}` is replaced with the text.
pub const FACT_CHECK_USER_TEMPLATE: &str = r#"Analyze the following statement and decide whether it is likely fake news or real news.

Statement: "{statement}"

Answer in exactly this format:
1. Classification: FAKE, REAL or UNCERTAIN
2. Confidence: a percentage, e.g. 85%
3. Reasoning: one or two sentences
4. Key Points: two or three short points

Your response:"#;

/// Build the user message for `statement`.
pub fn fact_check_message(statement: &str) -> String {
    FACT_CHECK_USER_TEMPLATE.replace("{statement}", statement.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_check_message_embeds_statement() {
        let message = fact_check_message("  The moon is made of cheese.  ");
        assert!(message.contains("Statement: \"The moon is made of cheese.\""));
        assert!(message.contains("Classification:"));
        assert!(!message.contains("{statement}"));
    }
}
