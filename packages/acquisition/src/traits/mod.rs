//! Core trait abstractions for the acquisition library.
//!
//! These traits are the seams between the pipeline and its external
//! dependencies: the text-generation capability, the listings API, and the
//! out-of-scope collaborators (interview, scoring).

pub mod generator;
pub mod interview;
pub mod scorer;
pub mod source;
