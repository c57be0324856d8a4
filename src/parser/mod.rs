// Plot selection parser module

pub mod lexer;
pub mod selection;

// Public API re-exports
pub use selection::{parse_plot_selection, parse_selection};
