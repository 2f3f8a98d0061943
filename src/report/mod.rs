//! Summary export and report rendering.

pub mod generator;
pub mod writer;

pub use generator::{
    generate_json_report, generate_markdown_report, render_group_table, render_summary_table,
};
pub use writer::write_summary;
