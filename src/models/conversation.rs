use serde::{Deserialize, Serialize};

use super::enums::ConversationType;

/// Instruction-tuning pair as found in the raw conversation sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub instruction: String,
    #[serde(default)]
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub instruction: String,
    pub input: String,
    pub output: String,
    pub conversation_type: ConversationType,
}

impl Conversation {
    pub fn tagged(record: ConversationRecord, conversation_type: ConversationType) -> Self {
        Self {
            instruction: record.instruction,
            input: record.input,
            output: record.output,
            conversation_type,
        }
    }
}
