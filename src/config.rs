use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Format used by `view` when the caller did not pick one.
pub const DEFAULT_FORMAT: &str = "svg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Layout engine executable (`dot`, `neato`, `fdp`, ...).
    pub engine: String,
    /// Output format. When empty it is inferred from the output file extension.
    pub format: String,
    /// Backend renderer, e.g. `cairo`. Empty means engine default.
    pub renderer: String,
    /// Backend formatter, e.g. `gd`. Only valid together with `renderer`.
    pub formatter: String,
    pub neato_no_op: bool,
    pub quiet: bool,
    pub raise_if_result_exists: bool,
    pub overwrite_filepath: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            engine: "dot".to_string(),
            format: String::new(),
            renderer: String::new(),
            formatter: String::new(),
            neato_no_op: false,
            quiet: false,
            raise_if_result_exists: false,
            overwrite_filepath: false,
        }
    }
}

impl RenderOptions {
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_renderer(mut self, renderer: impl Into<String>) -> Self {
        self.renderer = renderer.into();
        self
    }

    pub fn with_formatter(mut self, formatter: impl Into<String>) -> Self {
        self.formatter = formatter.into();
        self
    }

    pub fn with_neato_no_op(mut self, flag: bool) -> Self {
        self.neato_no_op = flag;
        self
    }

    pub fn with_quiet(mut self, flag: bool) -> Self {
        self.quiet = flag;
        self
    }

    pub fn with_raise_if_result_exists(mut self, flag: bool) -> Self {
        self.raise_if_result_exists = flag;
        self
    }

    pub fn with_overwrite_filepath(mut self, flag: bool) -> Self {
        self.overwrite_filepath = flag;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    pub filename: String,
    /// Empty means the current directory.
    pub directory: String,
    /// Reserved; DOT text is always written as UTF-8.
    pub encoding: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            filename: "default.gv".to_string(),
            directory: String::new(),
            encoding: "utf-8".to_string(),
        }
    }
}

impl SourceOptions {
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Where `Source::save` writes: `directory/filename`, or just `filename`.
    pub fn filepath(&self) -> PathBuf {
        if self.directory.is_empty() {
            PathBuf::from(&self.filename)
        } else {
            Path::new(&self.directory).join(&self.filename)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub render: RenderOptions,
    pub source: SourceOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderOptionsFile {
    engine: Option<String>,
    format: Option<String>,
    renderer: Option<String>,
    formatter: Option<String>,
    neato_no_op: Option<bool>,
    quiet: Option<bool>,
    raise_if_result_exists: Option<bool>,
    overwrite_filepath: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceOptionsFile {
    filename: Option<String>,
    directory: Option<String>,
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    render: Option<RenderOptionsFile>,
    source: Option<SourceOptionsFile>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    log::debug!("loaded config from {}", path.display());

    if let Some(render) = parsed.render {
        let opts = &mut config.render;
        if let Some(v) = render.engine {
            opts.engine = v;
        }
        if let Some(v) = render.format {
            opts.format = v;
        }
        if let Some(v) = render.renderer {
            opts.renderer = v;
        }
        if let Some(v) = render.formatter {
            opts.formatter = v;
        }
        if let Some(v) = render.neato_no_op {
            opts.neato_no_op = v;
        }
        if let Some(v) = render.quiet {
            opts.quiet = v;
        }
        if let Some(v) = render.raise_if_result_exists {
            opts.raise_if_result_exists = v;
        }
        if let Some(v) = render.overwrite_filepath {
            opts.overwrite_filepath = v;
        }
    }

    if let Some(source) = parsed.source {
        if let Some(v) = source.filename {
            config.source.filename = v;
        }
        if let Some(v) = source.directory {
            config.source.directory = v;
        }
        if let Some(v) = source.encoding {
            config.source.encoding = v;
        }
    }

    Ok(config)
}
