//! Output formatting for calculator and exercise results.
//!
//! This module handles rendering results for the command line:
//! - [`json`] - JSON response envelopes
//! - [`terminal`] - Terminal output with colors

mod json;
mod terminal;

pub use json::{
    classful_envelope, error_envelope, exercise_envelope, network_envelope, summary_envelope,
    to_pretty, vlsm_envelope,
};
pub use terminal::{
    format_field, prompt, render_classful, render_details, render_error, render_exercise,
    render_report, render_summary, render_vlsm,
};
