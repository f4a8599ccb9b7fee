//! Individual output checks, run in order by [`crate::validate`].

pub mod artifact;
pub mod labels;
pub mod shape;
pub mod status;
