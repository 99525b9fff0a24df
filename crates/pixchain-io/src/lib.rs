//! pixchain-io: Filesystem I/O for the pixchain pipeline.
//!
//! Handles PNG decoding and encoding, discovery of input images,
//! loading pipeline files, the on-disk layout of outputs, and writing
//! intermediate stage images. All pixel work is delegated to
//! `pixchain-pipeline`.

pub mod codec;
mod error;
pub mod inputs;
pub mod layout;
pub mod save;
pub mod spec_file;

pub use error::IoError;
pub use inputs::{Inputs, collect_inputs};
pub use layout::OutputLayout;
pub use save::IntermediateWriter;
pub use spec_file::load_pipeline;
