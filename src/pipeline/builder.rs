use std::fmt;

use crate::pipeline::engine::CompiledPipeline;
use crate::pipeline::stage::{StageCtx, StageKind};

/// Maximum number of stages a [`Pipeline`] can hold.
pub const MAX_STAGES: usize = 32;

/// One pipeline entry: what to do and the context it reads.
#[derive(Clone, Debug)]
pub struct Stage {
    /// Stage kind.
    pub kind: StageKind,
    /// Context matching `kind.context_kind()`.
    pub ctx: StageCtx,
}

/// Ordered, bounded list of stages, assembled once and compiled with [`Pipeline::compile`].
///
/// Storage is inline; appending never allocates. Exceeding [`MAX_STAGES`] or pairing a stage
/// with the wrong context kind is a configuration bug and panics before the pipeline changes.
#[derive(Clone)]
pub struct Pipeline {
    stages: [Stage; MAX_STAGES],
    len: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// An empty pipeline.
    pub fn new() -> Self {
        Self {
            stages: std::array::from_fn(|_| Stage {
                kind: StageKind::Trace,
                ctx: StageCtx::None,
            }),
            len: 0,
        }
    }

    /// Append one stage.
    ///
    /// # Panics
    ///
    /// When the pipeline is full or `ctx` is not the kind `kind` reads.
    #[track_caller]
    pub fn append(&mut self, kind: StageKind, ctx: impl Into<StageCtx>) {
        let ctx = ctx.into();
        assert!(
            self.len < MAX_STAGES,
            "pipeline already holds {MAX_STAGES} stages, cannot append {kind}"
        );
        assert_eq!(
            ctx.kind(),
            kind.context_kind(),
            "stage {kind} was given the wrong context"
        );
        self.stages[self.len] = Stage { kind, ctx };
        self.len += 1;
    }

    /// Append a stage that takes no context.
    #[track_caller]
    pub fn push(&mut self, kind: StageKind) {
        self.append(kind, StageCtx::None);
    }

    /// Append every stage of `other`, in order.
    ///
    /// # Panics
    ///
    /// When the combined length exceeds [`MAX_STAGES`]; `self` is left untouched.
    #[track_caller]
    pub fn extend(&mut self, other: &Pipeline) {
        assert!(
            self.len + other.len <= MAX_STAGES,
            "pipeline of {} stages cannot take {} more",
            self.len,
            other.len
        );
        for stage in other.stages() {
            self.stages[self.len] = stage.clone();
            self.len += 1;
        }
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no stage was appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stages that can still be appended.
    pub fn remaining(&self) -> usize {
        MAX_STAGES - self.len
    }

    /// The appended stages, in order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages[..self.len]
    }

    /// Emit the stage list as a debug event.
    pub fn dump(&self) {
        tracing::debug!(stages = self.len, "pipeline:\n{self}");
    }

    /// Bind every stage to its kernel.
    pub fn compile(&self) -> CompiledPipeline {
        CompiledPipeline::new(self.stages())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stage in self.stages() {
            writeln!(f, "{}", stage.kind)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages().iter().map(|s| s.kind))
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/builder.rs"]
mod tests;
