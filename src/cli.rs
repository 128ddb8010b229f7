use crate::config::{RenderOptions, SourceOptions, load_config};
use crate::render::{
    render, render_from_string, render_from_string_to_memory, render_to_memory, view_string,
};
use crate::source::Source;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "dotr", version, about = "Render Graphviz DOT files with the Graphviz engines")]
pub struct Args {
    /// Input file (.gv/.dot) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Rendered bytes go to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout engine executable
    #[arg(short = 'K', long = "engine")]
    pub engine: Option<String>,

    /// Output format (svg, png, pdf, ...). Inferred from --output if omitted.
    #[arg(short = 'T', long = "format")]
    pub format: Option<String>,

    /// Backend renderer, e.g. cairo
    #[arg(long = "renderer")]
    pub renderer: Option<String>,

    /// Backend formatter, e.g. gd (requires --renderer)
    #[arg(long = "formatter")]
    pub formatter: Option<String>,

    /// Skip layout; use the positions already in the input (neato -n)
    #[arg(short = 'n', long = "no-op")]
    pub neato_no_op: bool,

    /// Leave engine diagnostics out of error messages
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Fail if the output file already exists
    #[arg(long = "no-clobber")]
    pub no_clobber: bool,

    /// Allow the output file to be the input file
    #[arg(long = "overwrite")]
    pub overwrite: bool,

    /// Config JSON file ({"render": {...}, "source": {...}}). "source" sets
    /// where --save writes the DOT input.
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Render to a temp file and open it in the default viewer
    #[arg(long = "view")]
    pub view: bool,

    /// Also write the DOT input to the source directory/filename from the config file
    #[arg(long = "save")]
    pub save: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let options = apply_args(config.render, &args);

    let input = args.input.as_deref().filter(|p| *p != Path::new("-"));

    if args.save {
        let source = prepare_source(input, config.source)?;
        if args.view {
            let path = source.view(&options)?;
            log::info!("opened {}", path.display());
            return Ok(());
        }
        return match args.output.as_deref() {
            Some(output) => Ok(source.render(output, &options)?),
            None => write_stdout(&source.render_to_memory(&options)?),
        };
    }

    if args.view {
        let dot = read_input(input)?;
        let path = view_string(&dot, &options)?;
        log::info!("opened {}", path.display());
        return Ok(());
    }

    match (input, args.output.as_deref()) {
        (Some(input), Some(output)) => render(input, output, &options)?,
        (Some(input), None) => write_stdout(&render_to_memory(input, &options)?)?,
        (None, Some(output)) => render_from_string(&read_input(None)?, output, &options)?,
        (None, None) => {
            write_stdout(&render_from_string_to_memory(&read_input(None)?, &options)?)?
        }
    }
    Ok(())
}

fn apply_args(mut options: RenderOptions, args: &Args) -> RenderOptions {
    if let Some(engine) = &args.engine {
        options.engine = engine.clone();
    }
    if let Some(format) = &args.format {
        options.format = format.clone();
    }
    if let Some(renderer) = &args.renderer {
        options.renderer = renderer.clone();
    }
    if let Some(formatter) = &args.formatter {
        options.formatter = formatter.clone();
    }
    options.neato_no_op |= args.neato_no_op;
    options.quiet |= args.quiet;
    options.raise_if_result_exists |= args.no_clobber;
    options.overwrite_filepath |= args.overwrite;
    options
}

/// Read the DOT input once and save it per `options`.
fn prepare_source(input: Option<&Path>, options: SourceOptions) -> Result<Source> {
    let source = Source::new(read_input(input)?, options);
    let path = source.save()?;
    log::info!("saved {}", path.display());
    Ok(source)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()?;
    Ok(())
}
