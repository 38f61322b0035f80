//! The item transition engine.
//!
//! A pure function from `(item, action, role)` to the next item, or a refusal.
//! It performs no I/O; persistence and retries belong to the lifecycle service.

use super::action::{Action, ActorRole};
use super::item::{Item, ItemState};
use crate::error::{LedgerError, Result};

/// Number of stages in the processing pipeline, indexed `0..N-1`.
///
/// Stage 0 is `TRANSACTING`; reaching stage `N-1` completes the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    stages: u32,
}

impl Pipeline {
    pub const MIN_STAGES: u32 = 2;
    pub const DEFAULT_STAGES: u32 = 3;

    pub fn new(stages: u32) -> Result<Self> {
        if stages < Self::MIN_STAGES {
            return Err(LedgerError::ValidationError(format!(
                "Pipeline needs at least {} stages, got {}",
                Self::MIN_STAGES,
                stages
            )));
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> u32 {
        self.stages
    }

    pub fn terminal_stage(&self) -> u32 {
        self.stages - 1
    }
}

impl Default for Pipeline {
    /// Three stages: 0, 1, 2.
    fn default() -> Self {
        Self {
            stages: Self::DEFAULT_STAGES,
        }
    }
}

/// Side effect the service must commit together with the state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    BindTransaction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Item,
    pub effect: Effect,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionEngine {
    pipeline: Pipeline,
}

impl TransitionEngine {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    /// Refuses items whose open stage lies outside this pipeline, e.g. items
    /// persisted under a longer pipeline and replayed under a shorter one.
    fn check_stage(&self, item: &Item) -> Result<()> {
        let open_stage = match item.state {
            ItemState::Transacting | ItemState::InProgress => Some(item.current_stage),
            ItemState::Error => item.error_stage,
            _ => None,
        };
        match open_stage {
            Some(stage) if stage >= self.pipeline.terminal_stage() => {
                Err(LedgerError::ValidationError(format!(
                    "item {} is at stage {} which a {}-stage pipeline cannot continue",
                    item.id,
                    stage,
                    self.pipeline.stages()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Computes the transition for `action` applied to `item` by an actor holding `role`.
    ///
    /// The returned item carries `version + 1`; timestamps are left to the caller.
    pub fn apply(&self, item: &Item, action: Action, role: ActorRole) -> Result<Transition> {
        if action.requires_admin() && !role.is_admin() {
            return Err(LedgerError::Unauthorized { action, role });
        }
        self.check_stage(item)?;

        let mut next = item.clone();
        let mut effect = Effect::None;

        match (item.state, action) {
            (ItemState::Created, Action::CreateTransaction) => {
                next.state = ItemState::Transacting;
                next.current_stage = 0;
                effect = Effect::BindTransaction;
            }
            (ItemState::Transacting | ItemState::InProgress, Action::Move) => {
                let terminal = self.pipeline.terminal_stage();
                next.current_stage = item.current_stage + 1;
                next.state = if next.current_stage == terminal {
                    ItemState::Completed
                } else {
                    ItemState::InProgress
                };
            }
            (ItemState::RefundPending, Action::Move) => {
                next.state = ItemState::Refunded;
            }
            (ItemState::Completed | ItemState::Refunded, Action::Move) => {
                return Err(LedgerError::PipelineExhausted { state: item.state });
            }
            (state, Action::Error) if state.is_pipeline() => {
                next.state = ItemState::Error;
                next.error_stage = Some(item.current_stage);
                next.has_errored = true;
            }
            (ItemState::Error, Action::Fix) => {
                let stage = item.error_stage.ok_or_else(|| {
                    LedgerError::internal(format!("item {} is in ERROR without an error stage", item.id))
                })?;
                next.current_stage = stage;
                next.error_stage = None;
                next.state = if stage == 0 {
                    ItemState::Transacting
                } else {
                    ItemState::InProgress
                };
            }
            (ItemState::Error, Action::Refund) => {
                next.state = ItemState::RefundPending;
                next.error_stage = None;
            }
            (state, action) => {
                return Err(LedgerError::IllegalTransition { state, action });
            }
        }

        next.version = item.version + 1;
        Ok(Transition { next, effect })
    }
}
