pub mod formatter;

pub use formatter::{
    format_cursor, format_delta, format_round, format_session_list, format_summary,
    should_use_colors,
};
