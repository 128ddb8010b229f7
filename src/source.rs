use crate::config::{RenderOptions, SourceOptions};
use crate::error::{Error, Result};
use crate::render;
use std::path::{Path, PathBuf};

/// Verbatim DOT text, for graphs built elsewhere.
#[derive(Debug, Clone)]
pub struct Source {
    dot: String,
    options: SourceOptions,
}

impl Source {
    pub fn new(dot: impl Into<String>, options: SourceOptions) -> Self {
        Self {
            dot: dot.into(),
            options,
        }
    }

    pub fn dot(&self) -> &str {
        &self.dot
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    pub fn source_filepath(&self) -> Result<PathBuf> {
        if self.options.filename.is_empty() {
            return Err(Error::RequiredArgument("filename (needed by save)".to_string()));
        }
        Ok(self.options.filepath())
    }

    /// Write the DOT text to `directory/filename`, returning that path.
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.source_filepath()?;
        std::fs::write(&path, &self.dot)?;
        log::debug!("saved DOT source to {}", path.display());
        Ok(path)
    }

    pub fn render(&self, output: impl AsRef<Path>, options: &RenderOptions) -> Result<()> {
        render::render_from_string(&self.dot, output, options)
    }

    pub fn render_to_memory(&self, options: &RenderOptions) -> Result<Vec<u8>> {
        render::render_from_string_to_memory(&self.dot, options)
    }

    pub fn view(&self, options: &RenderOptions) -> Result<PathBuf> {
        render::view_string(&self.dot, options)
    }
}

impl From<&crate::graph::Graph> for Source {
    fn from(graph: &crate::graph::Graph) -> Self {
        Self::new(graph.to_string(), SourceOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn save_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let options = SourceOptions::default()
            .with_directory(dir.path().to_string_lossy())
            .with_filename("deps.gv");
        let source = Source::new("digraph { a -> b }", options);

        let path = source.save().unwrap();
        assert_eq!(path, dir.path().join("deps.gv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "digraph { a -> b }");
    }

    #[test]
    fn save_without_filename_is_required_argument() {
        let source = Source::new("graph {}", SourceOptions::default().with_filename(""));
        assert!(matches!(source.save(), Err(Error::RequiredArgument(_))));
    }

    #[test]
    fn from_graph_captures_serialized_text() {
        let mut g = Graph::digraph("G");
        g.edge("a", "b");
        let source = Source::from(&g);
        assert_eq!(source.dot(), g.to_string());
        assert_eq!(source.options().filename, "default.gv");
    }
}
