// Command-line front end for gbalz.
//
// Subcommands mirror the classic `gbalzss <e|d> <infile> <outfile>` tool
// (including `-` for stdin/stdout and the --lz11/--vram switches) plus an
// `inspect` command that lists the header and blocks of a stream.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::compress::decoder::BlockIter;
use crate::compress::encoder::EncodeOptions;
use crate::format::block::{Block, reference_size};
use crate::format::header::{
    HEADER_LEN, LZ10_MAX_LEN, LZ11_MAX_LEN, MAX_COMPRESSED_LEN, MAX_DISPLACEMENT,
    MAX_UNCOMPRESSED_LEN, Mode,
};
use crate::io::{self as gio, DecodeOptions, IoError};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Offset parsing (decimal or 0x-prefixed hex)
// ---------------------------------------------------------------------------

fn parse_offset(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty offset".into());
    }
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid offset '{s}': {e}"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// GBA BIOS LZ10/LZ11 encoder/decoder.
#[derive(Parser, Debug)]
#[command(
    name = "gbalz",
    version,
    about = "GBA LZ10/LZ11 (LZSS) encoder/decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compress an input file.
    #[command(visible_alias = "e")]
    Encode(EncodeArgs),
    /// Decompress an input file.
    #[command(visible_alias = "d")]
    Decode(DecodeArgs),
    /// Print the header and block layout of a compressed file.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Compress using LZ11 instead of LZ10.
    #[arg(long)]
    lz11: bool,

    /// Generate VRAM-safe output (no displacement-1 references).
    #[arg(long)]
    vram: bool,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (`-` or omitted: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (`-` or omitted: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Require an LZ10 stream.
    #[arg(long, conflicts_with = "lz11")]
    lz10: bool,

    /// Require an LZ11 stream.
    #[arg(long)]
    lz11: bool,

    /// Warn if the stream is not VRAM-safe.
    #[arg(long)]
    vram: bool,

    /// Byte offset of the compressed data inside the input (decimal or 0x hex).
    #[arg(long, value_parser = parse_offset, default_value_t = 0)]
    offset: u64,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (`-` or omitted: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (`-` or omitted: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// List every block, not just the summary.
    #[arg(long)]
    blocks: bool,

    /// Byte offset of the compressed data inside the input (decimal or 0x hex).
    #[arg(long, value_parser = parse_offset, default_value_t = 0)]
    offset: u64,

    /// Compressed input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Encode,
    Decode,
    Inspect,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    mode: Option<Mode>,
    vram_safe: bool,
    offset: u64,
    show_blocks: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

/// `-` means the standard stream.
fn file_arg(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| p.as_os_str() != "-")
}

fn resolve_options(cli: Cli) -> Options {
    let base = Options {
        command: Command::Config,
        use_stdout: false,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        mode: None,
        vram_safe: false,
        offset: 0,
        show_blocks: false,
        input_file: None,
        output_file: None,
    };

    match cli.command {
        Cmd::Encode(args) => Options {
            command: Command::Encode,
            use_stdout: args.stdout,
            mode: Some(if args.lz11 { Mode::Lz11 } else { Mode::Lz10 }),
            vram_safe: args.vram,
            input_file: file_arg(args.input),
            output_file: file_arg(args.output),
            ..base
        },
        Cmd::Decode(args) => Options {
            command: Command::Decode,
            use_stdout: args.stdout,
            mode: match (args.lz10, args.lz11) {
                (true, _) => Some(Mode::Lz10),
                (_, true) => Some(Mode::Lz11),
                _ => None,
            },
            vram_safe: args.vram,
            offset: args.offset,
            input_file: file_arg(args.input),
            output_file: file_arg(args.output),
            ..base
        },
        Cmd::Inspect(args) => Options {
            command: Command::Inspect,
            offset: args.offset,
            show_blocks: args.blocks,
            input_file: Some(args.input),
            ..base
        },
        Cmd::Config => base,
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("gbalz".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared I/O plumbing
// ---------------------------------------------------------------------------

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>, String> {
    match path {
        Some(path) => File::open(path)
            .map(|f| Box::new(BufReader::with_capacity(BUF_SIZE, f)) as Box<dyn Read>)
            .map_err(|e| format!("input file: {}: {e}", path.display())),
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, String> {
    match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            File::create(path)
                .map(|f| Box::new(BufWriter::with_capacity(BUF_SIZE, f)) as Box<dyn Write>)
                .map_err(|e| format!("output file: {}: {e}", path.display()))
        }
    }
}

fn input_label(opts: &Options) -> String {
    opts.input_file
        .as_ref()
        .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
}

fn hex_digest(digest: &[u8; 32]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("gbalz version {version} (Rust)");

    let file_io = cfg!(feature = "file-io") as u8;
    let parallel = cfg!(feature = "parallel") as u8;

    eprintln!("FILE_IO={file_io}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("HEADER_LEN={HEADER_LEN}");
    eprintln!("LZ10_MAX_LEN={LZ10_MAX_LEN}");
    eprintln!("LZ11_MAX_LEN={LZ11_MAX_LEN}");
    eprintln!("MAX_DISPLACEMENT={MAX_DISPLACEMENT}");
    eprintln!("MAX_ENCODE_LEN={MAX_UNCOMPRESSED_LEN:#010X}");
    eprintln!("MAX_DECODE_LEN={MAX_COMPRESSED_LEN:#010X}");

    0
}

// ---------------------------------------------------------------------------
// Encode command
// ---------------------------------------------------------------------------

fn cmd_encode(opts: &Options) -> i32 {
    let enc_opts = EncodeOptions::new(opts.mode.unwrap_or_default(), opts.vram_safe);

    let mut reader = match open_input(opts.input_file.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("gbalz: {e}");
            return 1;
        }
    };

    // Encode into memory first so a failed encode never creates or
    // truncates the output file.
    let mut packed = Vec::new();
    let stats = match gio::encode_stream(&mut reader, &mut packed, enc_opts) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("gbalz: {}: {e}", input_label(opts));
            return 1;
        }
    };

    let mut writer = match open_output(opts) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("gbalz: {e}");
            return 1;
        }
    };
    if let Err(e) = writer.write_all(&packed).and_then(|()| writer.flush()) {
        eprintln!("gbalz: write error: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "gbalz: encoder: {}: input size: {}, output size: {}, vram-safe: {}",
            stats.mode, stats.input_size, stats.output_size, opts.vram_safe
        );
        if let Some(digest) = &stats.input_sha256 {
            eprintln!("gbalz: encoder: input sha256: {}", hex_digest(digest));
        }
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "encode",
            "mode": stats.mode.name(),
            "vram_safe": opts.vram_safe,
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "input_sha256": stats.input_sha256.as_ref().map(hex_digest),
        });
        eprintln!("{json:#}");
    }

    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

fn cmd_decode(opts: &Options) -> i32 {
    let dec_opts = DecodeOptions {
        mode: opts.mode,
        vram_safe: opts.vram_safe,
        offset: opts.offset,
    };

    let mut reader = match open_input(opts.input_file.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("gbalz: {e}");
            return 1;
        }
    };

    // Decode into memory first so a corrupt stream never creates or
    // truncates the output file.
    let mut decoded = Vec::new();
    let stats = match gio::decode_stream(&mut reader, &mut decoded, dec_opts) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("gbalz: {}: {e}", input_label(opts));
            return 1;
        }
    };

    let mut writer = match open_output(opts) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("gbalz: {e}");
            return 1;
        }
    };
    if let Err(e) = writer.write_all(&decoded).and_then(|()| writer.flush()) {
        eprintln!("gbalz: write error: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "gbalz: decoder: {}: consumed {} of {} input bytes, output size: {}, warnings: {}",
            stats.mode, stats.consumed, stats.input_size, stats.output_size, stats.warnings
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "decode",
            "mode": stats.mode.name(),
            "offset": opts.offset,
            "consumed": stats.consumed,
            "output_size": stats.output_size,
            "warnings": stats.warnings,
            "output_sha256": stats.output_sha256.as_ref().map(hex_digest),
        });
        eprintln!("{json:#}");
    }

    0
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BlockSummary {
    literals: u64,
    references: u64,
    /// References by codeword size (2, 3, 4 bytes).
    by_size: [u64; 3],
    longest: usize,
    farthest: usize,
    displacement_one: u64,
}

fn read_at_offset(path: &Path, offset: u64) -> Result<Vec<u8>, IoError> {
    let mut file = BufReader::with_capacity(BUF_SIZE, File::open(path)?);
    gio::skip(&mut file, offset)?;
    gio::read_limited(&mut file, MAX_COMPRESSED_LEN)
}

fn cmd_inspect(opts: &Options) -> i32 {
    let Some(path) = opts.input_file.as_deref() else {
        eprintln!("gbalz: inspect requires an input file");
        return 1;
    };

    let data = match read_at_offset(path, opts.offset) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("gbalz: {}: {e}", path.display());
            return 1;
        }
    };

    let iter = match BlockIter::new(&data) {
        Ok(it) => it,
        Err(e) => {
            eprintln!("gbalz: {}: {e}", path.display());
            return 1;
        }
    };
    let header = *iter.header();

    println!("format:             {}", header.mode);
    println!("uncompressed size:  {}", header.uncompressed_size);
    println!("input size:         {}", data.len());

    let mut summary = BlockSummary::default();
    for item in iter {
        let (offset, block) = match item {
            Ok(item) => item,
            Err(e) => {
                eprintln!("gbalz: {}: {e}", path.display());
                return 1;
            }
        };
        match block {
            Block::Literal(byte) => {
                summary.literals += 1;
                if opts.show_blocks {
                    println!("{offset:08X}  LIT  {byte:02X}");
                }
            }
            Block::Reference(m) => {
                summary.references += 1;
                summary.by_size[reference_size(header.mode, m.length) - 2] += 1;
                summary.longest = summary.longest.max(m.length);
                summary.farthest = summary.farthest.max(m.displacement);
                if m.displacement == 1 {
                    summary.displacement_one += 1;
                }
                if opts.show_blocks {
                    println!(
                        "{offset:08X}  REF  len {:5}  disp {:4}",
                        m.length, m.displacement
                    );
                }
            }
        }
    }

    println!("literals:           {}", summary.literals);
    println!("references:         {}", summary.references);
    if header.mode == Mode::Lz11 {
        println!(
            "  2/3/4-byte:       {}/{}/{}",
            summary.by_size[0], summary.by_size[1], summary.by_size[2]
        );
    }
    println!("longest reference:  {}", summary.longest);
    println!("farthest reference: {}", summary.farthest);
    println!(
        "vram-safe:          {}",
        if summary.displacement_one == 0 { "yes" } else { "no" }
    );

    if opts.json_output {
        let json = serde_json::json!({
            "command": "inspect",
            "mode": header.mode.name(),
            "uncompressed_size": header.uncompressed_size,
            "literals": summary.literals,
            "references": summary.references,
            "references_by_size": summary.by_size,
            "vram_safe": summary.displacement_one == 0,
        });
        eprintln!("{json:#}");
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    let default_filter = match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Warn if -c overrides output filename.
    if opts.use_stdout && !opts.quiet
        && let Some(path) = &opts.output_file
    {
        eprintln!(
            "gbalz: warning: -c option overrides output filename: {}",
            path.display()
        );
    }
    if opts.use_stdout {
        opts.output_file = None;
    }

    let exit_code = match opts.command {
        Command::Encode => cmd_encode(&opts),
        Command::Decode => cmd_decode(&opts),
        Command::Inspect => cmd_inspect(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
