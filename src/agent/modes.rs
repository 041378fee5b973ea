use serde::Serialize;

/// How much depth the knowledge-base answer should go into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Concise,
    Detailed,
}

impl AnswerMode {
    pub fn from_detailed(detailed: bool) -> Self {
        if detailed {
            AnswerMode::Detailed
        } else {
            AnswerMode::Concise
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerMode::Concise => "concise",
            AnswerMode::Detailed => "detailed",
        }
    }

    /// Prepends `prefix` to the user's text in detailed mode.
    pub fn compose_prompt(self, prefix: &str, input: &str) -> String {
        match self {
            AnswerMode::Concise => input.to_string(),
            AnswerMode::Detailed => format!("{}{}", prefix, input),
        }
    }

    pub fn status_message(self) -> &'static str {
        match self {
            AnswerMode::Concise => "Consulting Knowledge Base...",
            AnswerMode::Detailed => "Consulting Knowledge Base (Detailed Mode)...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concise_mode_leaves_prompt_unmodified() {
        let prompt = AnswerMode::from_detailed(false).compose_prompt("PREFIX: ", "What is consent?");
        assert_eq!(prompt, "What is consent?");
    }

    #[test]
    fn detailed_mode_prepends_prefix() {
        let prompt = AnswerMode::from_detailed(true).compose_prompt("PREFIX: ", "What is consent?");
        assert_eq!(prompt, "PREFIX: What is consent?");
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_value(AnswerMode::Detailed).unwrap(), "detailed");
        assert_eq!(AnswerMode::Concise.as_str(), "concise");
    }
}
