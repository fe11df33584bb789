use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{crate_version, App, AppSettings, Arg, ErrorKind};
use log::{debug, error, Level, LevelFilter, Log, Metadata};

use crate::data::{json_kind, CloudEvent, SAMPLED_RATE};
use crate::error::{DiagnoseError, Result};

mod data;
mod error;

#[derive(Debug)]
struct Options {
    data: PathBuf,
    reencode: bool,
}

fn main() {
    init_logging();
    if let Err(err) = parse_args(std::env::args_os()).and_then(|options| run(&options)) {
        error!("{}", err);
        process::exit(1);
    }
}

fn init_logging() {
    let filters = std::env::var("RUST_LOG").ok();
    log_builder(filters.as_deref()).init();
}

/// `RUST_LOG` may raise or lower verbosity, but fatal errors from this crate
/// always stay visible.
fn log_builder(filters: Option<&str>) -> env_logger::Builder {
    let mut builder = base_log_builder(filters);
    if !base_log_builder(filters).build().enabled(&fatal_metadata()) {
        builder.filter_module(module_path!(), LevelFilter::Error);
    }
    builder
}

fn base_log_builder(filters: Option<&str>) -> env_logger::Builder {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(LevelFilter::Info);
    if let Some(filters) = filters {
        builder.parse_filters(filters);
    }
    builder
}

fn fatal_metadata() -> Metadata<'static> {
    Metadata::builder()
        .level(Level::Error)
        .target(module_path!())
        .build()
}

fn app() -> App<'static, 'static> {
    App::new("diagnose")
        .version(crate_version!())
        .about("Prints the id and sample rate of a CloudEvent stored as JSON")
        .setting(AppSettings::ColorNever)
        .arg(
            Arg::with_name("data")
                .long("data")
                .value_name("PATH")
                .takes_value(true)
                .help("Path of event to diagnose"),
        )
        .arg(
            Arg::with_name("reencode")
                .long("reencode")
                .help("Also print the event re-encoded with inline extensions"),
        )
}

fn parse_args<I, T>(args: I) -> Result<Options>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match app().get_matches_from_safe(args) {
        Ok(matches) => matches,
        Err(e) if e.kind == ErrorKind::HelpDisplayed || e.kind == ErrorKind::VersionDisplayed => {
            e.exit()
        }
        Err(e) => return Err(DiagnoseError::config(clap_summary(&e))),
    };
    let data = matches
        .value_of_os("data")
        .filter(|path| !path.is_empty())
        .ok_or_else(|| DiagnoseError::config("Must specify the path to a JSON event file with --data"))?;
    Ok(Options {
        data: PathBuf::from(data),
        reencode: matches.is_present("reencode"),
    })
}

/// First line of a clap error, without its `error: ` prefix or usage block.
fn clap_summary(e: &clap::Error) -> String {
    let first = e.message.lines().next().unwrap_or_default();
    first.trim_start_matches("error: ").trim().to_owned()
}

fn run(options: &Options) -> Result<()> {
    let event = load_event(&options.data)?;
    println!("Got event {}", event.event_id);
    println!("{}", sampling_line(&event));
    if options.reencode {
        let encoded = data::encode(&event).map_err(|source| DiagnoseError::Codec {
            path: options.data.clone(),
            source,
        })?;
        println!("{}", String::from_utf8_lossy(&encoded));
    }
    Ok(())
}

fn load_event(path: &Path) -> Result<CloudEvent> {
    let bytes = fs::read(path).map_err(|source| DiagnoseError::Io {
        path: path.to_owned(),
        source,
    })?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    data::decode(&bytes).map_err(|source| DiagnoseError::Codec {
        path: path.to_owned(),
        source,
    })
}

fn sampling_line(event: &CloudEvent) -> String {
    match event.sampled_rate() {
        Some(rate) => format!("(It was sampled at a rate of 1 in {})", rate),
        None => {
            if let Some(other) = event.extension(SAMPLED_RATE) {
                // only string rates are understood
                debug!("{} is a {}, treating event as unsampled", SAMPLED_RATE, json_kind(other));
            }
            "(It was not sampled)".to_owned()
        }
    }
}
