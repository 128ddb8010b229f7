use crate::config::{DEFAULT_FORMAT, RenderOptions};
use crate::error::{Error, Result};
use crate::process::{run_command, run_command_with_stdin};
use crate::{tmpfile, viewer};
use std::path::{Path, PathBuf};

/// Render the DOT file `input` into `output`. The format comes from
/// `options.format` or, failing that, from the extension of `output`.
pub fn render(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<()> {
    let (input, output) = (input.as_ref(), output.as_ref());
    validate_options(options, input, output)?;
    let format = deduce_format(output, options)?;
    let cmd = build_command(Some(input), Some(output), &format, options);

    let mut stdout = String::new();
    let mut stderr = String::new();
    let code = run_command(&cmd, &mut stdout, &mut stderr);
    check_exit(code, cmd, stdout, stderr, options)
}

/// Render the DOT file `input` and return the engine's stdout. The format
/// must be set in `options`; there is no file name to infer it from.
pub fn render_to_memory(input: impl AsRef<Path>, options: &RenderOptions) -> Result<Vec<u8>> {
    let input = input.as_ref();
    validate_options(options, input, Path::new(""))?;
    let format = required_format(options)?;
    let cmd = build_command(Some(input), None, format, options);

    let mut bytes = Vec::new();
    let mut stderr = String::new();
    let code = run_command(&cmd, &mut bytes, &mut stderr);
    check_exit(code, cmd, String::new(), stderr, options)?;
    Ok(bytes)
}

/// Render DOT text into `output`, feeding the engine through stdin so no
/// intermediate `.gv` file is written.
pub fn render_from_string(
    dot: &str,
    output: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<()> {
    let output = output.as_ref();
    validate_options(options, Path::new(""), output)?;
    if output.as_os_str().is_empty() {
        return Err(Error::RequiredArgument("output_file".to_string()));
    }
    let format = deduce_format(output, options)?;
    let cmd = build_command(None, Some(output), &format, options);

    let mut ignored = Vec::new();
    let mut stderr = String::new();
    let code = run_command_with_stdin(dot, &cmd, &mut ignored, &mut stderr);
    check_exit(code, cmd, String::new(), stderr, options)
}

pub fn render_from_string_to_memory(dot: &str, options: &RenderOptions) -> Result<Vec<u8>> {
    validate_options(options, Path::new(""), Path::new(""))?;
    let format = required_format(options)?;
    let cmd = build_command(None, None, format, options);

    let mut bytes = Vec::new();
    let mut stderr = String::new();
    let code = run_command_with_stdin(dot, &cmd, &mut bytes, &mut stderr);
    check_exit(code, cmd, String::new(), stderr, options)?;
    Ok(bytes)
}

/// Render DOT text into a fresh temp file and open it in the viewer.
/// Returns the path of the rendered file.
pub fn view_string(dot: &str, options: &RenderOptions) -> Result<PathBuf> {
    let path = render_to_temp(dot, options)?;
    viewer::view(&path, options.quiet)?;
    Ok(path)
}

/// Render DOT text into a fresh temp file whose suffix matches the format
/// (`options.format`, else [`DEFAULT_FORMAT`]) and return its path.
pub fn render_to_temp(dot: &str, options: &RenderOptions) -> Result<PathBuf> {
    let mut options = options.clone();
    if options.format.is_empty() {
        options.format = DEFAULT_FORMAT.to_string();
    }
    // The temp file is created up front, so the exists-check would always trip.
    options.raise_if_result_exists = false;

    let path = tmpfile::generate_path(&options.format)?;
    render_from_string(dot, &path, &options)?;
    Ok(path)
}

/// `<engine> -T<format>[:<renderer>[:<formatter>]] [-n] ["<input>"] [-o "<output>"]`
///
/// A missing `input` means DOT arrives on stdin; a missing `output` means the
/// result is written to stdout.
pub fn build_command(
    input: Option<&Path>,
    output: Option<&Path>,
    format: &str,
    options: &RenderOptions,
) -> String {
    let mut cmd = format!("{} -T{format}", options.engine);
    if !options.renderer.is_empty() {
        cmd.push(':');
        cmd.push_str(&options.renderer);
        if !options.formatter.is_empty() {
            cmd.push(':');
            cmd.push_str(&options.formatter);
        }
    }
    if options.neato_no_op {
        cmd.push_str(" -n");
    }
    if let Some(input) = input {
        cmd.push_str(&format!(" \"{}\"", input.display()));
    }
    if let Some(output) = output.filter(|p| !p.as_os_str().is_empty()) {
        cmd.push_str(&format!(" -o \"{}\"", output.display()));
    }
    cmd
}

fn validate_options(options: &RenderOptions, input: &Path, output: &Path) -> Result<()> {
    if !options.formatter.is_empty() && options.renderer.is_empty() {
        return Err(Error::RequiredArgument(
            "renderer (required by formatter)".to_string(),
        ));
    }
    if which::which(&options.engine).is_err() {
        return Err(Error::ExecutableNotFound(options.engine.clone()));
    }
    if !input.as_os_str().is_empty() && input == output && !options.overwrite_filepath {
        return Err(Error::RequiredArgument(
            "overwrite_filepath=true required when input_file == output_file".to_string(),
        ));
    }
    if options.raise_if_result_exists && !output.as_os_str().is_empty() && output.exists() {
        return Err(Error::FileExists(output.to_path_buf()));
    }
    Ok(())
}

fn deduce_format(output: &Path, options: &RenderOptions) -> Result<String> {
    if !options.format.is_empty() {
        return Ok(options.format.clone());
    }
    output
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::RequiredArgument(
                "format must be set either via options or output filename".to_string(),
            )
        })
}

fn required_format(options: &RenderOptions) -> Result<&str> {
    if options.format.is_empty() {
        return Err(Error::RequiredArgument("format".to_string()));
    }
    Ok(&options.format)
}

fn check_exit(
    code: i32,
    command: String,
    stdout: String,
    stderr: String,
    options: &RenderOptions,
) -> Result<()> {
    if code == 0 {
        log::debug!("`{command}` succeeded");
        return Ok(());
    }
    Err(Error::CalledProcess {
        code,
        command,
        stdout,
        stderr: if options.quiet { String::new() } else { stderr },
    })
}
