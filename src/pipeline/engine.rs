use std::fmt;

use wide::f32x4;

use crate::pipeline::builder::Stage;
use crate::pipeline::kernels;
use crate::pipeline::stage::{StageCtx, StageKind};

/// Pixels processed together by one pass through the stages.
pub const STAGE_WIDTH: usize = 4;

/// Per-block pixel state threaded through the stages.
///
/// `r`..`a` are the working channels, `dr`..`da` the destination (scratch) channels. `tail` is
/// zero for a full block and the count of valid lanes for the final partial block.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Registers {
    pub r: f32x4,
    pub g: f32x4,
    pub b: f32x4,
    pub a: f32x4,
    pub dr: f32x4,
    pub dg: f32x4,
    pub db: f32x4,
    pub da: f32x4,
    pub x: usize,
    pub y: usize,
    pub tail: usize,
}

impl Registers {
    /// Zeroed working channels; `dr`/`dg` hold the pixel centers of the block.
    pub(crate) fn seeded(x: usize, y: usize, tail: usize) -> Self {
        let zero = f32x4::splat(0.0);
        Self {
            r: zero,
            g: zero,
            b: zero,
            a: zero,
            dr: f32x4::splat(x as f32) + f32x4::from([0.5, 1.5, 2.5, 3.5]),
            dg: f32x4::splat(y as f32 + 0.5),
            db: zero,
            da: zero,
            x,
            y,
            tail,
        }
    }

    /// Number of valid lanes.
    pub fn lanes(&self) -> usize {
        if self.tail == 0 { STAGE_WIDTH } else { self.tail }
    }
}

/// What a stage tells the engine after running.
///
/// `Stop` is only for a stage that knows nothing after it can change memory for the block;
/// the catalog stages all continue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    #[allow(dead_code)]
    Stop,
}

pub(crate) type StageFn = fn(&mut Registers, &StageCtx) -> Flow;

#[derive(Clone)]
struct Step {
    kind: StageKind,
    run: StageFn,
    ctx: StageCtx,
}

/// A pipeline bound to its kernels, ready to run over pixel spans.
///
/// Holds clones of the stage contexts; cells rebound by the consumer are observed on the next
/// [`run`](CompiledPipeline::run).
#[derive(Clone)]
pub struct CompiledPipeline {
    steps: Box<[Step]>,
}

impl CompiledPipeline {
    pub(crate) fn new(stages: &[Stage]) -> Self {
        let steps = stages
            .iter()
            .map(|stage| Step {
                kind: stage.kind,
                run: kernels::kernel(stage.kind),
                ctx: stage.ctx.clone(),
            })
            .collect();
        Self { steps }
    }

    /// Process pixels `x..x + n` of row `y`.
    pub fn run(&self, x: usize, y: usize, n: usize) {
        let mut x = x;
        let mut n = n;
        while n >= STAGE_WIDTH {
            self.run_block(x, y, 0);
            x += STAGE_WIDTH;
            n -= STAGE_WIDTH;
        }
        if n > 0 {
            self.run_block(x, y, n);
        }
    }

    fn run_block(&self, x: usize, y: usize, tail: usize) {
        let mut regs = Registers::seeded(x, y, tail);
        for step in self.steps.iter() {
            if (step.run)(&mut regs, &step.ctx) == Flow::Stop {
                break;
            }
        }
    }

    /// Number of compiled stages.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Stage kinds, in execution order.
    pub fn kinds(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.steps.iter().map(|s| s.kind)
    }
}

impl fmt::Debug for CompiledPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/engine.rs"]
mod tests;
