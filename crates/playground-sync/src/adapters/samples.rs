//! Starter prompts for a fresh local library

use playground::Prompt;

pub fn sample_prompts() -> Vec<Prompt> {
    vec![
        Prompt::new(
            "Code Review Assistant",
            "You are an experienced software engineer who provides constructive code reviews. Focus on code quality, best practices, potential bugs, and suggestions for improvement.",
            "Please review this code and provide feedback:",
        )
        .with_temperature(0.3)
        .with_max_tokens(1500),
        Prompt::new(
            "Creative Writing Helper",
            "You are a creative writing assistant who helps with storytelling, character development, and narrative structure. You provide imaginative and engaging suggestions.",
            "Help me develop this story idea:",
        )
        .with_temperature(0.8)
        .with_max_tokens(2000),
        Prompt::new(
            "Technical Explanation",
            "You are a technical educator who explains complex concepts in simple, understandable terms. Use analogies and examples when helpful.",
            "Explain this technical concept:",
        )
        .with_temperature(0.4)
        .with_max_tokens(1200),
        Prompt::new(
            "Data Analysis Assistant",
            "You are a data analyst who helps interpret data, identify trends, and suggest actionable insights. Be precise and data-driven in your responses.",
            "Analyze this data and provide insights:",
        )
        .with_temperature(0.2)
        .with_max_tokens(1800),
    ]
}
