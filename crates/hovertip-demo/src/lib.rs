#![forbid(unsafe_code)]

//! hovertip demo: a toolbar of tooltip triggers driven by a scripted
//! walkthrough or on wall time.

pub mod cli;
pub mod walkthrough;
