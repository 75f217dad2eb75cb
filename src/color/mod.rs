pub(crate) mod lut;
pub(crate) mod matrix;
pub(crate) mod space;
pub(crate) mod transfer;
pub(crate) mod xform;
