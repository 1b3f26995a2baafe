/*
    This is a small utility for reorganizing a Google Photos Takeout export
    into a deduplicated, date-organized photo library.

    Copyright 2023-5 Seth Pendergrass. See LICENSE.
*/
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use env_logger::Builder;
use log::LevelFilter;

use takeout_organizer::config::{AlbumBehavior, DateDivision, FixExtensions, PipelineConfig};
use takeout_organizer::error::PipelineError;
use takeout_organizer::model::{MediaCollection, ProcessingContext};
use takeout_organizer::pipeline;

#[derive(Parser)]
struct Args {
  /// Root of the extracted Google Photos Takeout export.
  input: PathBuf,

  /// Where the reorganized library is written.
  output: PathBuf,

  /// How files that belong to an album are handled alongside the main
  /// chronological tree.
  #[arg(long, value_enum, default_value_t = AlbumBehaviorArg::Shortcut)]
  album_behavior: AlbumBehaviorArg,

  /// How finely destination folders are split by capture date.
  #[arg(long, value_enum, default_value_t = DateDivisionArg::YearMonth)]
  date_division: DateDivisionArg,

  /// Copy files into the output tree instead of moving them.
  #[arg(long)]
  copy: bool,

  /// Skip EXIF date/GPS write-back (stage 7).
  #[arg(long)]
  no_write_exif: bool,

  /// Skip filesystem timestamp synchronization (stage 8).
  #[arg(long)]
  no_update_creation_time: bool,

  /// How aggressively mismatched file extensions are corrected (stage 1).
  #[arg(long, value_enum, default_value_t = FixExtensionsArg::Standard)]
  fix_extensions: FixExtensionsArg,

  /// Leave oversized files entirely dateless rather than running the date
  /// extractor chain on them.
  #[arg(long)]
  max_file_size: Option<u64>,

  /// Path to the `exiftool` binary, if not on `PATH`.
  #[arg(long)]
  exiftool_path: Option<PathBuf>,

  /// Resume from (and update) a progress document at this path instead of
  /// always running all eight stages from scratch.
  #[arg(long)]
  progress_file: Option<PathBuf>,

  /// Enable Debug and Trace logs.
  #[arg(long, short, action = ArgAction::Count)]
  verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlbumBehaviorArg {
  Shortcut,
  DuplicateCopy,
  ReverseShortcut,
  Json,
  Nothing,
  IgnoreAlbums,
}

impl From<AlbumBehaviorArg> for AlbumBehavior {
  fn from(arg: AlbumBehaviorArg) -> Self {
    match arg {
      AlbumBehaviorArg::Shortcut => AlbumBehavior::Shortcut,
      AlbumBehaviorArg::DuplicateCopy => AlbumBehavior::DuplicateCopy,
      AlbumBehaviorArg::ReverseShortcut => AlbumBehavior::ReverseShortcut,
      AlbumBehaviorArg::Json => AlbumBehavior::Json,
      AlbumBehaviorArg::Nothing => AlbumBehavior::Nothing,
      AlbumBehaviorArg::IgnoreAlbums => AlbumBehavior::IgnoreAlbums,
    }
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum DateDivisionArg {
  None,
  Year,
  YearMonth,
  YearMonthDay,
}

impl From<DateDivisionArg> for DateDivision {
  fn from(arg: DateDivisionArg) -> Self {
    match arg {
      DateDivisionArg::None => DateDivision::None,
      DateDivisionArg::Year => DateDivision::Year,
      DateDivisionArg::YearMonth => DateDivision::YearMonth,
      DateDivisionArg::YearMonthDay => DateDivision::YearMonthDay,
    }
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum FixExtensionsArg {
  Off,
  Standard,
  NonJpeg,
  Solo,
}

impl From<FixExtensionsArg> for FixExtensions {
  fn from(arg: FixExtensionsArg) -> Self {
    match arg {
      FixExtensionsArg::Off => FixExtensions::Off,
      FixExtensionsArg::Standard => FixExtensions::Standard,
      FixExtensionsArg::NonJpeg => FixExtensions::NonJpeg,
      FixExtensionsArg::Solo => FixExtensions::Solo,
    }
  }
}

// Sets up env_logger, with the formatting "ERROR_LEVEL message" (e.g. "WARN something went wrong").
fn enable_logging(verbose: u8) {
  let level = match verbose {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };

  Builder::new()
    .filter_level(level)
    .format(|buf, record| writeln!(buf, "{} {}", buf.default_level_style(record.level()).value(record.level()), record.args()))
    .init();
}

fn config_from_args(args: &Args) -> PipelineConfig {
  let mut config = PipelineConfig {
    input_dir: args.input.clone(),
    output_dir: args.output.clone(),
    album_behavior: args.album_behavior.into(),
    date_division: args.date_division.into(),
    copy_mode: args.copy,
    write_exif: !args.no_write_exif,
    update_creation_time: !args.no_update_creation_time,
    fix_extensions: args.fix_extensions.into(),
    verbose: args.verbose > 0,
    exiftool_path: args.exiftool_path.clone(),
    ..PipelineConfig::default()
  };

  if let Some(max_file_size) = args.max_file_size {
    config.enforce_max_file_size = true;
    config.max_file_size = max_file_size;
  }

  config
}

fn main() -> ExitCode {
  let args = Args::parse();
  enable_logging(args.verbose);

  let config = config_from_args(&args);
  let exiftool = pipeline::discover_exiftool(&config);
  let mut ctx = ProcessingContext::new(config, exiftool);
  let mut collection = MediaCollection::new();

  match pipeline::run_resumable(&mut ctx, &mut collection, args.progress_file.as_deref(), None) {
    Ok(results) => {
      for result in &results {
        log::info!("{}", result.summary_line());
      }
      ExitCode::SUCCESS
    }
    Err(PipelineError::InsufficientDiskSpace { path, needed, available }) => {
      log::error!("{}: not enough free disk space (need {needed} bytes, have {available} bytes)", path.display());
      ExitCode::from(69)
    }
    Err(e) => {
      log::error!("{e}");
      ExitCode::FAILURE
    }
  }
}
