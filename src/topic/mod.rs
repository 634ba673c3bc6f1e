//! Topic group member value type.

use serde::{Deserialize, Serialize};

/// One member of a sharded topic group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    number: u32,
    arn: String,
    name: String,
}

impl Topic {
    pub fn new(number: u32, arn: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number,
            arn: arn.into(),
            name: name.into(),
        }
    }

    /// Position of this topic within its group
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Relay-assigned resource id
    pub fn arn(&self) -> &str {
        &self.arn
    }

    /// Base name of the group
    pub fn name(&self) -> &str {
        &self.name
    }
}
