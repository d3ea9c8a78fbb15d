use std::fmt;

/// Heading placed between the base instructions and the recalled facts.
pub const FACTS_LEAD_IN: &str = "Relevant facts about the user and prior conversation";

/// Instructions handed to inference for one turn: the base instructions plus
/// the facts fetched for that turn, and nothing from earlier turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveInstructions(String);

impl ActiveInstructions {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ActiveInstructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ActiveInstructions {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Combine base instructions with the latest fact context.
///
/// Always built from `original`, so calling this every turn replaces the
/// previous facts instead of stacking them.
pub fn update_instructions(original: &str, fact_context: &str) -> ActiveInstructions {
    ActiveInstructions(format!("{original}\n\n{FACTS_LEAD_IN}:\n{fact_context}"))
}
