use std::path::{Path, PathBuf};
use std::str::FromStr;
use timeclad::render::OutputFormat;
use timeclad::render::raster::{self, RasterError, RasterOptions};
use timeclad::{Config, HeadlessError};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, reload};

#[derive(Debug)]
enum CliError {
    /// Help or version text: printed to stdout, exit code 0.
    Info(String),
    Usage(String),
    Io { path: PathBuf, source: std::io::Error },
    Headless(HeadlessError),
    Raster(RasterError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Info(msg) | CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            CliError::Headless(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "{err}"),
        }
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Headless(value)
    }
}

impl From<RasterError> for CliError {
    fn from(value: RasterError) -> Self {
        match value {
            RasterError::Headless(err) => Self::Headless(err),
            other => Self::Raster(other),
        }
    }
}

impl From<timeclad::Error> for CliError {
    fn from(value: timeclad::Error) -> Self {
        Self::Headless(value.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text(OutputFormat),
    Png,
    Jpeg,
    Pdf,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Self::Text(format) => format.extension(),
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }
}

impl FromStr for Format {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            other => other.parse::<OutputFormat>().map(Self::Text).map_err(|_| ()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    input: PathBuf,
    output: String,
    config: Option<PathBuf>,
    verbose: bool,
    scale: Option<f32>,
    background: Option<String>,
}

fn usage() -> String {
    "timeclad-cli\n\
\n\
USAGE:\n\
  timeclad-cli [--verbose] [--scale <n>] [--background <css-color>] <INPUT> <OUTPUT> [<CONFIGFILE>]\n\
\n\
ARGS:\n\
  INPUT       a .csv file, or a directory to chart as a file tree\n\
  OUTPUT      a file name whose extension selects the format, or a bare format\n\
              name (svg|csv|conf|json|png|jpg|pdf) to write next to the input\n\
  CONFIGFILE  a conf file with `option = value` lines\n\
\n\
NOTES:\n\
  - RUST_LOG overrides the log filter; --verbose (or `debug` in the conf) logs at debug level.\n\
  - --scale and --background only apply to png/jpg output.\n\
"
    .to_string()
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();
    let mut positional = Vec::new();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Info(usage())),
            "--version" | "-V" => {
                return Err(CliError::Info(format!(
                    "timeclad-cli {}",
                    env!("CARGO_PKG_VERSION")
                )));
            }
            "--verbose" | "-v" => args.verbose = true,
            "--scale" => {
                let Some(scale) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let scale = scale.parse::<f32>().map_err(|_| CliError::Usage(usage()))?;
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.scale = Some(scale);
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(CliError::Usage(format!(
                    "unknown option `{other}`\n\n{}",
                    usage()
                )));
            }
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    let (Some(input), Some(output)) = (positional.next(), positional.next()) else {
        return Err(CliError::Usage(usage()));
    };
    args.input = PathBuf::from(input);
    args.output = output;
    args.config = positional.next().map(PathBuf::from);
    if positional.next().is_some() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

/// Resolves `OUTPUT` into a path and a format.
///
/// A bare format name writes beside the input: `tree.csv` -> `tree.svg`, `src/` -> `src.svg`.
fn output_target(input: &Path, output: &str) -> Result<(PathBuf, Format), CliError> {
    let is_bare = !output.contains(['.', '/', '\\']);
    if is_bare {
        let format = output.parse::<Format>().map_err(|_| {
            CliError::Usage(format!("unknown output format `{output}`\n\n{}", usage()))
        })?;
        let path = if input.is_dir() {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "out".to_string());
            let parent = input.parent().unwrap_or_else(|| Path::new(""));
            parent.join(format!("{name}.{}", format.extension()))
        } else {
            input.with_extension(format.extension())
        };
        return Ok((path, format));
    }

    let path = PathBuf::from(output);
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse::<Format>().ok())
        .ok_or_else(|| {
            CliError::Usage(format!(
                "cannot tell the output format of `{output}`\n\n{}",
                usage()
            ))
        })?;
    Ok((path, format))
}

fn same_format_as_input(input: &Path, format: Format) -> bool {
    !input.is_dir() && format == Format::Text(OutputFormat::Csv)
}

fn write_output(input: &Path, path: &Path, format: Format, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| {
        // A csv-to-csv run may be writing over its own input.
        if !same_format_as_input(input, format) {
            let _ = std::fs::remove_file(path);
        }
        CliError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn run(args: Args, log: &LogHandle) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if config.debug > 0 {
        log.raise_to_debug();
    }

    let (path, format) = output_target(&args.input, &args.output)?;
    tracing::info!(
        input = %args.input.display(),
        output = %path.display(),
        format = format.extension(),
        "rendering"
    );

    let cladogram = timeclad::read_input(&args.input, &mut config)?;
    let layout = timeclad::layout_with_config(&cladogram, &config)?;

    let raster_options = RasterOptions {
        scale: args.scale.unwrap_or(1.0),
        background: args.background.clone(),
        ..RasterOptions::default()
    };
    let bytes = match format {
        Format::Text(text) => timeclad::render::render(text, &layout, &config)
            .map_err(HeadlessError::from)?
            .into_bytes(),
        Format::Png => raster::render_png(&layout, &config, &raster_options)?,
        Format::Jpeg => raster::render_jpeg(&layout, &config, &raster_options)?,
        Format::Pdf => raster::render_pdf(&layout, &config)?,
    };

    write_output(&args.input, &path, format, &bytes)?;
    tracing::info!(output = %path.display(), bytes = bytes.len(), "done");
    Ok(())
}

struct LogHandle {
    handle: reload::Handle<EnvFilter, tracing_subscriber::Registry>,
    from_env: bool,
}

impl LogHandle {
    /// `RUST_LOG` wins over anything the command line or conf file asks for.
    fn raise_to_debug(&self) {
        if !self.from_env {
            let _ = self.handle.modify(|filter| *filter = EnvFilter::new("debug"));
        }
    }
}

fn init_logging(verbose: bool) -> LogHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(if verbose { "debug" } else { "info" }), false),
    };
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    LogHandle { handle, from_env }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Info(msg)) => {
            println!("{msg}");
            return;
        }
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let log = init_logging(args.verbose);
    match run(args, &log) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("timeclad-cli")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn positional_arguments_are_input_output_config() {
        let args = parse_args(&argv(&["tree.csv", "svg", "tree.conf", "--verbose"])).unwrap();
        assert_eq!(args.input, PathBuf::from("tree.csv"));
        assert_eq!(args.output, "svg");
        assert_eq!(args.config, Some(PathBuf::from("tree.conf")));
        assert!(args.verbose);

        assert!(matches!(parse_args(&argv(&["--help"])), Err(CliError::Info(_))));
        assert!(matches!(parse_args(&argv(&["-V"])), Err(CliError::Info(v)) if v.starts_with("timeclad-cli ")));
    }

    #[test]
    fn missing_or_extra_arguments_are_usage_errors() {
        assert!(matches!(parse_args(&argv(&["tree.csv"])), Err(CliError::Usage(_))));
        assert!(matches!(
            parse_args(&argv(&["a", "b", "c", "d"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&argv(&["a", "b", "--scale", "0"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&argv(&["--frobnicate", "a", "b"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn bare_formats_write_beside_the_input() {
        let (path, format) = output_target(Path::new("data/tree.csv"), "svg").unwrap();
        assert_eq!(path, PathBuf::from("data/tree.svg"));
        assert_eq!(format, Format::Text(OutputFormat::Svg));

        let (path, format) = output_target(Path::new("data/tree.csv"), "JPEG").unwrap();
        assert_eq!(path, PathBuf::from("data/tree.jpg"));
        assert_eq!(format, Format::Jpeg);
    }

    #[test]
    fn file_names_pick_the_format_from_the_extension() {
        let (path, format) = output_target(Path::new("tree.csv"), "out/tree.pdf").unwrap();
        assert_eq!(path, PathBuf::from("out/tree.pdf"));
        assert_eq!(format, Format::Pdf);

        assert!(matches!(
            output_target(Path::new("tree.csv"), "tree.gif"),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            output_target(Path::new("tree.csv"), "gif"),
            Err(CliError::Usage(_))
        ));
    }
}
