use std::{env, io::Write, process::ExitCode};

mod args;
mod choices;
mod cmd;
mod form;
mod logger;
mod parse;
mod rule;
mod style;
mod visibility;

fn main() -> ExitCode {
    let err = match run() {
        Ok(code) => return code,
        Err(err) => err,
    };
    if let Some(help) = err.root_cause().downcast_ref::<args::Help>() {
        let _ = writeln!(&mut std::io::stdout(), "{help}");
        return ExitCode::SUCCESS;
    }
    if let Some(version) = err.root_cause().downcast_ref::<args::Version>() {
        let _ = writeln!(&mut std::io::stdout(), "{version}");
        return ExitCode::SUCCESS;
    }
    // A broken pipe means whoever was reading our output went away. Unix
    // convention is to quit quietly, but the Rust runtime ignores SIGPIPE,
    // so it shows up here as an I/O error instead.
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<std::io::Error>() {
            if err.kind() == std::io::ErrorKind::BrokenPipe {
                return ExitCode::SUCCESS;
            }
        }
        // `serde_json` hides the underlying `std::io::Error` when writing.
        if let Some(err) = cause.downcast_ref::<serde_json::Error>() {
            if err.io_error_kind() == Some(std::io::ErrorKind::BrokenPipe) {
                return ExitCode::SUCCESS;
            }
        }
    }
    if env::var("RUST_BACKTRACE").map_or(false, |v| v == "1")
        && env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        let _ = writeln!(&mut std::io::stderr(), "{err:?}");
    } else {
        let _ = writeln!(&mut std::io::stderr(), "{err:#}");
    }
    ExitCode::from(1)
}

fn run() -> anyhow::Result<ExitCode> {
    let level = match &*env::var("RRFORM_LOG").unwrap_or_default() {
        "" | "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        unk => anyhow::bail!("unrecognized log level '{unk}'"),
    };
    log::set_max_level(level);
    logger::Logger::init()?;
    cmd::run(&mut lexopt::Parser::from_env())?;
    Ok(ExitCode::SUCCESS)
}
