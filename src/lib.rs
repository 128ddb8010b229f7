#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod process;
pub mod render;
pub mod source;
pub mod tmpfile;
pub mod viewer;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, DEFAULT_FORMAT, RenderOptions, SourceOptions, load_config};
pub use error::{Error, Result};
pub use graph::{AttrMap, Graph, Statement, attr_map};
pub use render::{
    render, render_from_string, render_from_string_to_memory, render_to_memory, render_to_temp,
    view_string,
};
pub use source::Source;
