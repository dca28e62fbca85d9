//! Test-only model doubles shared by scorer and pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GenerativeModel, LlmError};

/// Mock model that replays a scripted sequence of outcomes. Once the script
/// is exhausted every further call reports empty content.
pub(crate) struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
}

impl ScriptedModel {
    pub(crate) fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        ScriptedModel {
            responses: Mutex::new(responses.into()),
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}
