// main.rs
//
// Command line host for the cutter: STL in, one STL per octant out.

use octacut::config::{CutConfig, DEFAULT_SCALE_FACTOR};
use octacut::cutter::{Cutter, SourceModel};
use octacut::float_types::Real;
use octacut::io::IoError;
use octacut::mesh::Mesh;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

const USAGE: &str = r#"octacut

USAGE:
  octacut <input.stl> [options]

OPTIONS:
  --scale <f>      Cutting volume inflation in [1.0, 2.0] (default 1.1)
  --out <dir>      Directory for <stem>_<octant>.stl (default: next to the input)
  -v, --verbose    Also print debug output
  -h, --help       Show this help
"#;

/// Prints log records to stderr.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

struct Options {
    input: PathBuf,
    scale: Real,
    out_dir: Option<PathBuf>,
    verbose: bool,
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next().ok_or_else(|| format!("missing value for {flag}"))
    }
}

fn main() {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Info);

    match parse_args() {
        Ok(Some(options)) => {
            if options.verbose {
                log::set_max_level(log::LevelFilter::Debug);
            }
            if let Err(err) = run(&options) {
                eprintln!("octacut error: {err}");
                std::process::exit(1);
            }
        },
        Ok(None) => println!("{USAGE}"),
        Err(err) => {
            eprintln!("octacut error: {err}\n\n{USAGE}");
            std::process::exit(2);
        },
    }
}

fn parse_args() -> Result<Option<Options>, Box<dyn Error>> {
    let mut args = Args::new(std::env::args().skip(1).collect());
    let mut input = None;
    let mut scale = DEFAULT_SCALE_FACTOR;
    let mut out_dir = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--scale" => scale = args.value("--scale")?.parse::<Real>().map_err(IoError::from)?,
            "--out" => out_dir = Some(PathBuf::from(args.value("--out")?)),
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => return Ok(None),
            other if other.starts_with('-') => {
                return Err(format!("unknown option `{other}`").into());
            },
            other => {
                if input.replace(PathBuf::from(other)).is_some() {
                    return Err("only one input file is accepted".into());
                }
            },
        }
    }

    let input = input.ok_or("missing input file")?;
    Ok(Some(Options {
        input,
        scale,
        out_dir,
        verbose,
    }))
}

fn run(options: &Options) -> Result<(), Box<dyn Error>> {
    let config = CutConfig::new(options.scale)?;
    let stem = options
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IoError::MalformedPath(options.input.display().to_string()))?;

    let data = fs::read(&options.input).map_err(IoError::from)?;
    let mesh = Mesh::<()>::from_stl(&data, None)?;
    log::info!(
        "{stem}: {} vertices, {} polygons",
        mesh.vertices.len(),
        mesh.polygons.len()
    );

    let outcome = Cutter::new(config).cut(&SourceModel::new(stem, mesh))?;

    let out_dir = match &options.out_dir {
        Some(dir) => dir.clone(),
        None => options
            .input
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    };
    fs::create_dir_all(&out_dir).map_err(IoError::from)?;

    for part in &outcome.parts {
        let path = out_dir.join(format!("{}.stl", part.name));
        let bytes = part.mesh.to_stl_binary(&part.name)?;
        fs::write(&path, bytes).map_err(IoError::from)?;
        println!(
            "{} (origin {:.4} {:.4} {:.4})",
            path.display(),
            part.origin.x,
            part.origin.y,
            part.origin.z
        );
    }
    Ok(())
}
