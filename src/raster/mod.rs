pub(crate) mod blend;
pub(crate) mod blitter;
pub(crate) mod paint;
pub(crate) mod pixmap;
