//! Command-line entry point: parses arguments, runs the assembler, and
//! reports errors either as a `miette` graphical diagnostic or, under
//! `-q`, as a plain `<filename>(<lineno>): <message>` line.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use asm8::{Assembler, AssemblyError, ListingLine};
use clap::Parser;

/// `asm8 [options] sourcefile [outputfile] [listfile]`
#[derive(Debug, Parser)]
#[command(name = "asm8", about = "A two-pass assembler for the 6502 microprocessor", version)]
struct Cli {
	/// Source file to assemble.
	source: PathBuf,

	/// Output file; defaults to the source path with its extension
	/// replaced by `.bin`.
	output: Option<PathBuf>,

	/// Listing file; defaults to the source path with its extension
	/// replaced by `.lst`. Only used together with `-l`/`-L`.
	listfile: Option<PathBuf>,

	/// Emit a listing to the default (or given) listing path.
	#[arg(short = 'l')]
	listing: bool,

	/// Emit a listing that also expands MACRO/REPT bodies line by line.
	#[arg(short = 'L')]
	verbose_listing: bool,

	/// Pre-define a VALUE label with value 1. May be repeated.
	#[arg(short = 'd', value_name = "name")]
	defines: Vec<String>,

	/// Suppress per-pass progress messages.
	#[arg(short = 'q')]
	quiet: bool,
}

fn default_with_extension(source: &Path, extension: &str) -> PathBuf {
	source.with_extension(extension)
}

fn main() -> ExitCode {
	human_panic::setup_panic!();
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	let cli = Cli::parse();
	run(&cli).unwrap_or_else(|message| {
		eprintln!("{message}");
		ExitCode::FAILURE
	})
}

fn run(cli: &Cli) -> Result<ExitCode, String> {
	let source_text = std::fs::read_to_string(&cli.source)
		.map_err(|os_error| format_error(&AssemblyError::CantOpenFile {
			file_name: cli.source.display().to_string(),
			os_error: os_error.to_string(),
		}, &cli.source, None, cli.quiet))?;

	let want_listing = cli.listing || cli.verbose_listing;
	let listing_path =
		want_listing.then(|| cli.listfile.clone().unwrap_or_else(|| default_with_extension(&cli.source, "lst")));
	let mut listing_lines: Vec<String> = Vec::new();

	let mut assembler = Assembler::new().with_verbose_listing(cli.verbose_listing);
	if want_listing {
		assembler = assembler.with_listing(collect_listing_text(&mut listing_lines));
	}
	for name in &cli.defines {
		log::info!("pre-defining {name} = 1");
		assembler.define_value(name, 1).map_err(|error| format_error(&error, &cli.source, Some(&source_text), cli.quiet))?;
	}

	let bytes = match assembler.assemble_str(&cli.source.display().to_string(), &source_text) {
		Ok(bytes) => bytes,
		Err(error) => return Ok(report_and_fail(&error, &cli.source, &source_text, cli.quiet)),
	};

	let output_path = cli.output.clone().unwrap_or_else(|| default_with_extension(&cli.source, "bin"));
	write_bytes(&output_path, &bytes)?;

	if let Some(listing_path) = listing_path {
		write_listing(&listing_path, &listing_lines)?;
	}

	Ok(ExitCode::SUCCESS)
}

fn collect_listing_text(into: &mut Vec<String>) -> impl FnMut(&ListingLine<'_>) + '_ {
	move |line: &ListingLine<'_>| {
		let pc_text = line.pc.map_or_else(|| "    ".to_owned(), |pc| format!("{pc:04X}"));
		let bytes_text: String = line.bytes_emitted.iter().map(|byte| format!("{byte:02X} ")).collect();
		into.push(format!("{pc_text}  {bytes_text:<12}{}", line.expanded_text));
	}
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), String> {
	let mut file = File::create(path).map_err(|error| format!("{}: {error}", path.display()))?;
	file.write_all(bytes).map_err(|error| format!("{}: {error}", path.display()))
}

fn write_listing(path: &Path, lines: &[String]) -> Result<(), String> {
	let mut file = File::create(path).map_err(|error| format!("{}: {error}", path.display()))?;
	for line in lines {
		writeln!(file, "{line}").map_err(|error| format!("{}: {error}", path.display()))?;
	}
	Ok(())
}

fn report_and_fail(error: &AssemblyError, source: &Path, source_text: &str, quiet: bool) -> ExitCode {
	eprintln!("{}", format_error(error, source, Some(source_text), quiet));
	ExitCode::FAILURE
}

fn format_error(error: &AssemblyError, source: &Path, source_text: Option<&str>, quiet: bool) -> String {
	let file_name = source.display().to_string();
	if quiet {
		return error.plain(&file_name);
	}
	let mut handler_output = String::new();
	let rendered = match source_text {
		Some(text) => {
			let report = miette::Report::new(error.clone().with_source(&file_name, text));
			miette::GraphicalReportHandler::new().render_report(&mut handler_output, report.as_ref())
		},
		None => {
			let report = miette::Report::new(error.clone());
			miette::GraphicalReportHandler::new().render_report(&mut handler_output, report.as_ref())
		},
	};
	let _ = rendered;
	handler_output
}
