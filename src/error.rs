use std::io;

use thiserror::Error;


///
/// Errors which may occur while classifying a listing and building the
/// call graph.
///
#[derive(Error, Debug)]
pub enum Error
{
        #[error("Unsupported target `{0}`; supported are arm, aarch64, x86 and x86_64.")]
        UnsupportedTarget(String),

        #[error("Line {line_no}: `{line}` operates on the stack outside of any function.")]
        NoCurrentFunction { line_no: usize, line: String },

        #[error("Invalid instruction pattern: {0}")]
        Pattern(#[from] regex::Error),

        #[error("Reading the listing raised this error: {0:?}")]
        Io(#[from] io::Error),
}
