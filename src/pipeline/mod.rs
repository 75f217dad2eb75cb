pub(crate) mod builder;
pub(crate) mod engine;
pub(crate) mod kernels;
pub(crate) mod stage;
