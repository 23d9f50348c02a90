//! Stage personas.

use serde::{Deserialize, Serialize};

/// Who the model acts as for a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Short role title.
    pub role: String,
    /// What the persona is trying to achieve.
    pub goal: String,
    /// Experience the persona draws on.
    pub backstory: String,
}

impl Persona {
    /// Creates a persona.
    #[must_use]
    pub fn new(role: impl Into<String>, goal: impl Into<String>, backstory: impl Into<String>) -> Self {
        Self { role: role.into(), goal: goal.into(), backstory: backstory.into() }
    }

    /// Renders the persona as a system instruction.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}
