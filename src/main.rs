//! Command-line driver: read a source file, translate it statement by
//! statement and write the assembly listing.
//!
//! The driver is a thin wrapper with no invariants of its own. Any
//! translation failure aborts the whole run before anything is written, so
//! a partially filled instruction buffer is never flushed.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use armlet::Translator;

#[derive(Parser)]
#[command(
  version,
  about = "Translate a line-oriented toy language into register-machine assembly"
)]
struct Args {
  /// Source file, one statement per line.
  input: PathBuf,

  /// Where to write the listing; defaults to the input path with
  /// extension `s`.
  #[arg(short, long)]
  output: Option<PathBuf>,
}

fn main() {
  let args = Args::parse();

  let source = match fs::read_to_string(&args.input) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("{}: {err}", args.input.display());
      process::exit(1);
    }
  };

  let mut translator = Translator::new();
  for (index, line) in source.lines().enumerate() {
    if line.trim().is_empty() {
      continue;
    }
    if let Err(err) = translator.translate_line(line) {
      eprintln!("{}: line {}: {err}", args.input.display(), index + 1);
      process::exit(1);
    }
  }

  println!("register mapping:");
  for (name, reg) in translator.bindings() {
    println!("  {name} -> {reg}");
  }
  print!("{}", translator.listing());

  let output = args
    .output
    .unwrap_or_else(|| args.input.with_extension("s"));
  if let Err(err) = fs::write(&output, translator.listing()) {
    eprintln!("{}: {err}", output.display());
    process::exit(1);
  }
}
