use super::engine::{StepContext, StepOutcome, Waterfall};
use super::state::{DialogId, StepValue};
use crate::error::BotResult;
use async_trait::async_trait;
use rust_i18n::t;

/// Drops whatever was in progress and returns to baseline
pub struct CancelDialog;

#[async_trait]
impl Waterfall for CancelDialog {
    fn id(&self) -> DialogId {
        DialogId::Cancel
    }

    fn step_count(&self) -> usize {
        1
    }

    async fn run_step(
        &self,
        _step: usize,
        sc: &mut StepContext<'_>,
        _value: StepValue,
    ) -> BotResult<StepOutcome> {
        sc.say(t!("cancelled"));
        sc.session.clear();
        Ok(StepOutcome::CancelAll)
    }
}
