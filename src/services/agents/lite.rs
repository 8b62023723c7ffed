//! Single-call analyst and strategist for the lite pipeline.
//!
//! Both share the normalization of their full counterparts so lite and full
//! runs persist the same shapes.

use super::analyst::{self, AnalystInput};
use super::strategist::{self, StrategistInput};
use super::{AgentRuntime, AgentTuning};
use crate::domain::errors::DomainResult;
use crate::domain::models::{AnalystOutput, StrategistOutput};
use crate::domain::ports::PromptKind;

const ANALYST_TUNING: AgentTuning = AgentTuning::new(0.2, 3072);
const STRATEGIST_TUNING: AgentTuning = AgentTuning::new(0.6, 3072);

pub struct LiteAnalystAgent {
    runtime: AgentRuntime,
}

impl LiteAnalystAgent {
    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub async fn run(&self, input: &AnalystInput<'_>) -> DomainResult<AnalystOutput> {
        let extracted = self
            .runtime
            .call(PromptKind::LiteAnalyst, input, ANALYST_TUNING)
            .await?;
        Ok(analyst::normalize(extracted))
    }
}

pub struct LiteStrategistAgent {
    runtime: AgentRuntime,
}

impl LiteStrategistAgent {
    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub async fn run(
        &self,
        input: &StrategistInput<'_>,
        temperature_override: Option<f32>,
    ) -> DomainResult<StrategistOutput> {
        let tuning = STRATEGIST_TUNING.with_temperature(temperature_override);
        let extracted = self
            .runtime
            .call(PromptKind::LiteStrategist, input, tuning)
            .await?;
        Ok(strategist::normalize(extracted, input.max_suggestions))
    }
}
