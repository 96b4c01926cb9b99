//! Instruction and message text sent to the judgment model

use super::JudgmentRequest;
use crate::config::ResearchInterests;

const BASE_INSTRUCTION: &str = concat!(
    "You are a research paper evaluator. Rate this paper's novelty and ",
    "potential impact. Respond with JSON only: {\"score\": <1-10>, \"summary\": ",
    "\"<2-3 sentence assessment>\"}\n",
    "Score guide: 1-3=incremental, 4-6=solid contribution, 7-8=significant, ",
    "9-10=potentially groundbreaking",
);

/// System instruction, with research preferences appended when configured
pub fn system_instruction(interests: Option<&ResearchInterests>) -> String {
    let interests = match interests.filter(|i| !i.is_empty()) {
        Some(interests) => interests,
        None => return BASE_INSTRUCTION.to_string(),
    };

    let mut parts = vec![
        BASE_INSTRUCTION.to_string(),
        "\nYour evaluation should reflect these research preferences:".to_string(),
    ];
    if !interests.boost.is_empty() {
        parts.push(format!(
            "BOOST (score higher) papers about: {}",
            interests.boost.join("; ")
        ));
    }
    if !interests.penalize.is_empty() {
        parts.push(format!(
            "PENALIZE (score lower) papers about: {}",
            interests.penalize.join("; ")
        ));
    }
    parts.join("\n")
}

pub fn user_message(request: &JudgmentRequest<'_>) -> String {
    format!(
        "Title: {}\nCategories: {}\nAbstract: {}",
        request.title, request.categories, request.abstract_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_states_scale() {
        let text = system_instruction(None);
        assert!(text.contains("1-3=incremental"));
        assert!(text.contains("9-10=potentially groundbreaking"));
        assert!(!text.contains("BOOST"));
    }

    #[test]
    fn test_instruction_with_interests() {
        let interests = ResearchInterests {
            boost: vec!["quantum error correction".into(), "lattice QCD".into()],
            penalize: vec!["survey papers".into()],
        };
        let text = system_instruction(Some(&interests));
        assert!(text.ends_with(
            "groundbreaking\n\nYour evaluation should reflect these research preferences:\n\
             BOOST (score higher) papers about: quantum error correction; lattice QCD\n\
             PENALIZE (score lower) papers about: survey papers"
        ));
    }

    #[test]
    fn test_instruction_with_boost_only() {
        let interests = ResearchInterests {
            boost: vec!["neutrinos".into()],
            penalize: vec![],
        };
        let text = system_instruction(Some(&interests));
        assert!(text.contains("BOOST (score higher) papers about: neutrinos"));
        assert!(!text.contains("PENALIZE"));
    }

    #[test]
    fn test_user_message_layout() {
        let request = JudgmentRequest {
            title: "On Things",
            abstract_text: "We study things.",
            categories: "hep-ph, hep-th",
        };
        assert_eq!(
            user_message(&request),
            "Title: On Things\nCategories: hep-ph, hep-th\nAbstract: We study things."
        );
    }
}
