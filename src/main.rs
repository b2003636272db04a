//! CLI for vr180-sbs: convert VR180 photos (a file or a directory) to side-by-side JPEGs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use vr180_sbs::{
    inspect, ConversionReport, ConvertError, Converter, ConverterOptions, LocatorConfig,
    XmpInspection,
};

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Parser)]
#[command(name = "vr180-sbs")]
#[command(about = "Convert VR180 photos to side-by-side stereo JPEGs", long_about = None)]
struct Args {
    /// VR180 JPEG to convert
    input: Option<PathBuf>,

    /// Output path (default: <input-stem>-converted.<ext> next to the input)
    output: Option<PathBuf>,

    /// Convert every .jpg/.jpeg in a directory (optionally with -r)
    #[arg(short = 'd', long = "directory", value_name = "DIR", conflicts_with_all = ["input", "output"])]
    directory: Option<PathBuf>,

    /// When converting a directory, recurse into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Report the XMP structure and payload location instead of converting
    #[arg(long)]
    inspect: bool,

    /// JPEG quality of the composite (1-100)
    #[arg(long, default_value_t = vr180_sbs::composite::DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// XMP attribute/element holding the right-eye image
    #[arg(long, default_value = vr180_sbs::stereo::DEFAULT_PAYLOAD_KEY)]
    key: String,

    /// Minimum base64 length accepted as a payload
    #[arg(long, default_value_t = vr180_sbs::stereo::DEFAULT_MIN_PAYLOAD_LEN)]
    min_payload_len: usize,

    /// Output JSON per file (one line per file unless --pretty)
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON (use with --json)
    #[arg(long)]
    pretty: bool,

    /// Quiet: only print failures
    #[arg(short, long)]
    quiet: bool,

    /// Log pipeline stages (same as RUST_LOG=debug)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> ConverterOptions {
        let locator = LocatorConfig::default()
            .with_key(self.key.clone())
            .with_min_payload_len(self.min_payload_len);
        ConverterOptions::default()
            .with_locator(locator)
            .with_quality(self.quality)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let converter = Converter::new(args.options());

    if let Some(dir) = &args.directory {
        if !dir.is_dir() {
            eprintln!("Error: not a directory: {}", dir.display());
            return ExitCode::FAILURE;
        }
        return match scan_dir(dir, &args, &converter) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let Some(input) = &args.input else {
        eprintln!("Error: missing input: give a VR180 JPEG or use -d/--directory <DIR>");
        eprintln!("Usage: vr180-sbs <INPUT> [OUTPUT]");
        return ExitCode::FAILURE;
    };

    match process_file(input, args.output.as_deref(), &args, &converter) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Convert or inspect one file. Returns whether it succeeded.
fn process_file(
    input: &Path,
    output: Option<&Path>,
    args: &Args,
    converter: &Converter,
) -> Result<bool, Box<dyn std::error::Error>> {
    if args.inspect {
        let bytes = match fs::read(input) {
            Ok(b) => b,
            Err(_) if !input.exists() => {
                print_failure(input, &ConvertError::FileNotFound(input.to_path_buf()), None, args)?;
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        let inspection = inspect(&bytes, &converter.options().locator);
        print_inspection(input, &inspection, &bytes, args)?;
        return Ok(inspection.has_payload());
    }

    let result = converter.convert(input, output);
    let digest = if args.json {
        fs::read(input).ok().map(|b| sha256_hex(&b))
    } else {
        None
    };
    match result {
        Ok(report) => {
            print_report(&report, digest, args)?;
            Ok(true)
        }
        Err(e) => {
            print_failure(input, &e, digest, args)?;
            Ok(false)
        }
    }
}

fn is_candidate(path: &Path, suffix: &str) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext != "jpg" && ext != "jpeg" {
        return false;
    }
    // Skip our own output.
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    !stem.ends_with(suffix)
}

/// Returns whether every file succeeded.
fn scan_dir(dir: &Path, args: &Args, converter: &Converter) -> Result<bool, Box<dyn std::error::Error>> {
    let walker = if args.recursive {
        WalkDir::new(dir).into_iter()
    } else {
        WalkDir::new(dir).max_depth(1).into_iter()
    };
    if !args.quiet {
        eprintln!("Scanning directory: {} {}", dir.display(), if args.recursive { "(recursive)" } else { "" });
    }

    let mut total = 0u64;
    let mut failed = 0u64;
    for entry in walker.filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_candidate(path, &converter.options().suffix) {
            continue;
        }
        total += 1;
        if !process_file(path, None, args, converter)? {
            failed += 1;
        }
    }

    if !args.quiet {
        eprintln!("Processed {} files, {} succeeded, {} failed", total, total - failed, failed);
    }
    Ok(failed == 0)
}

fn emit_json(out: &IndexMap<String, serde_json::Value>, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let json_str = if args.pretty {
        serde_json::to_string_pretty(out)?
    } else {
        serde_json::to_string(out)?
    };
    println!("{}", json_str);
    Ok(())
}

fn print_report(report: &ConversionReport, sha256: Option<String>, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.json {
        let mut out = IndexMap::<String, serde_json::Value>::new();
        out.insert("sha256".to_string(), serde_json::to_value(&sha256)?);
        out.insert("path".to_string(), serde_json::Value::String(report.input.display().to_string()));
        out.insert("status".to_string(), serde_json::Value::String("converted".to_string()));
        out.insert("report".to_string(), serde_json::to_value(report)?);
        return emit_json(&out, args);
    }
    if args.quiet {
        return Ok(());
    }
    println!(
        "Converted {} -> {} ({})",
        report.input.display(),
        report.output.display(),
        report.composite
    );
    println!("  left: {}, right: {}", report.left, report.right);
    println!(
        "  payload: {} base64 chars in {:?} XMP ({})",
        report.payload_len,
        report.source,
        report.strategy.label()
    );
    Ok(())
}

fn print_failure(
    input: &Path,
    err: &ConvertError,
    sha256: Option<String>,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.json {
        let mut out = IndexMap::<String, serde_json::Value>::new();
        out.insert("sha256".to_string(), serde_json::to_value(&sha256)?);
        out.insert("path".to_string(), serde_json::Value::String(input.display().to_string()));
        out.insert("status".to_string(), serde_json::Value::String("failed".to_string()));
        out.insert("error".to_string(), serde_json::Value::String(err.kind().to_string()));
        out.insert("message".to_string(), serde_json::Value::String(err.to_string()));
        return emit_json(&out, args);
    }
    eprintln!("Error: {} ({})", err, input.display());
    Ok(())
}

fn print_inspection(
    input: &Path,
    inspection: &XmpInspection,
    bytes: &[u8],
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.json {
        let mut out = IndexMap::<String, serde_json::Value>::new();
        out.insert("sha256".to_string(), serde_json::Value::String(sha256_hex(bytes)));
        out.insert("path".to_string(), serde_json::Value::String(input.display().to_string()));
        out.insert("size_bytes".to_string(), serde_json::to_value(bytes.len())?);
        out.insert("inspection".to_string(), serde_json::to_value(inspection)?);
        return emit_json(&out, args);
    }
    let status = if inspection.has_payload() { "VR180" } else { "NO PAYLOAD" };
    println!("{} {} ({} bytes)", status, input.display(), bytes.len());
    if args.quiet {
        return Ok(());
    }
    println!("  sha256: {}", sha256_hex(bytes));
    println!("  jpeg: {}", inspection.is_jpeg);
    println!("  APP1 segments: {}", inspection.app1_segments);
    match inspection.standard_xmp_len {
        Some(n) => println!("  standard XMP: {} bytes", n),
        None => println!("  standard XMP: -"),
    }
    match inspection.extended_xmp_len {
        Some(n) => println!(
            "  extended XMP: {} bytes in {} chunk(s), declared {}",
            n,
            inspection.extended_chunks,
            inspection
                .extended_declared_len
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into())
        ),
        None => println!("  extended XMP: -"),
    }
    if let (Some(source), Some(strategy), Some(len)) =
        (inspection.payload_source, inspection.payload_strategy, inspection.payload_len)
    {
        println!("  payload: {} base64 chars in {:?} XMP ({})", len, source, strategy.label());
    }
    for w in &inspection.warnings {
        println!("  warning: {}", w);
    }
    Ok(())
}
