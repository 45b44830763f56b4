use std::{
    fmt::{Debug, Display, Write},
    str::FromStr,
    sync::LazyLock,
};

use {
    anyhow::Context,
    lexopt::{Arg, Parser, ValueExt},
    regex::Regex,
};

pub mod flags;

/// A thing that knows how to consume some of the arguments of a command.
///
/// Each command builds one or more of these and hands them to `configure`,
/// which offers every argument to each of them in turn.
pub trait Configurable: Debug {
    /// Consume the given argument if it is recognized.
    ///
    /// Returns `false` when the argument isn't recognized, in which case
    /// the next target gets a shot at it.
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool>;

    /// Usage docs for the flags and arguments consumed by this target.
    fn usage(&self) -> &[Usage] {
        &[]
    }
}

/// Parse all remaining arguments into the given targets.
///
/// `-h` and `--help` are handled here. They render `usage`, after
/// substituting `%args%` and `%flags%` with the docs collected from the
/// targets, and return it as a `Help` error.
pub fn configure(
    p: &mut Parser,
    usage: &str,
    targets: &mut [&mut dyn Configurable],
) -> anyhow::Result<()> {
    // Drops `%snip-start%`, `%snip-end%` and everything in between. Used for
    // the short docs.
    static REMOVE_SNIPS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\s*%snip-start%\p{any}*?%snip-end%\s*$").unwrap()
    });

    // Drops only the `%snip-start%` and `%snip-end%` markers. Used for the
    // long docs.
    static REMOVE_SNIP_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\s*%snip-(start|end)%\s*$").unwrap()
    });

    while let Some(arg) = p.next()? {
        if matches!(arg, Arg::Short('h') | Arg::Long("help")) {
            let short = arg == Arg::Short('h');
            let args = collect_usage(targets, false);
            let flags = collect_usage(targets, true);
            let (usage, args, flags) = if short {
                let usage = REMOVE_SNIPS.replace_all(usage, "").into_owned();
                (usage, Usage::short(&args), Usage::short(&flags))
            } else {
                let usage =
                    REMOVE_SNIP_MARKERS.replace_all(usage, "").into_owned();
                (usage, Usage::long(&args), Usage::long(&flags))
            };
            let usage =
                usage.replace("%args%", &args).replace("%flags%", &flags);
            return Err(anyhow::Error::from(Help(usage.trim().to_string())));
        }
        // The borrow of `p` inside of a long flag name would otherwise
        // outlive the call to `configure` below, which needs `p` mutably.
        let long: Option<String> = match arg {
            Arg::Long(name) => Some(name.to_string()),
            _ => None,
        };
        let mut arg = match (long.as_deref(), arg) {
            (Some(name), _) => Arg::Long(name),
            (None, Arg::Short(c)) => Arg::Short(c),
            (None, Arg::Value(v)) => Arg::Value(v),
            (None, Arg::Long(_)) => unreachable!(),
        };
        let mut recognized = false;
        for t in targets.iter_mut() {
            if t.configure(p, &mut arg)? {
                recognized = true;
                break;
            }
        }
        if !recognized {
            return Err(arg.unexpected().into());
        }
    }
    Ok(())
}

/// Collects either the flag docs or the positional argument docs of every
/// target.
///
/// Flags are sorted by their long name and always include `-h/--help` and
/// `--version`. Positional arguments keep the order given by the targets.
fn collect_usage(
    targets: &[&mut dyn Configurable],
    flags: bool,
) -> Vec<Usage> {
    let mut usages =
        if flags { vec![Help::USAGE, Version::USAGE] } else { vec![] };
    for t in targets.iter() {
        usages.extend(t.usage().iter().copied().filter(|u| u.flag == flags));
    }
    if flags {
        usages.sort_by_key(|u| {
            u.format.split_once(", ").map(|(_, long)| long).unwrap_or(u.format)
        });
    }
    usages
}

/// Parses the next argument as a command name.
///
/// This also handles `-h/--help` and `--version` given in place of a
/// command.
pub fn next_as_command(usage: &str, p: &mut Parser) -> anyhow::Result<String> {
    let usage = usage.trim();
    let arg = match p.next()? {
        Some(arg) => arg,
        None => anyhow::bail!("{}", usage),
    };
    let cmd = match arg {
        Arg::Value(cmd) => cmd.string()?,
        Arg::Short('h') | Arg::Long("help") => {
            return Err(anyhow::Error::from(Help(usage.to_string())));
        }
        Arg::Long("version") => return Err(anyhow::Error::from(Version)),
        arg => return Err(arg.unexpected().into()),
    };
    Ok(cmd)
}

/// Parses the value of the current flag into `T`. Errors mention
/// `flag_name`.
pub fn parse<T>(p: &mut Parser, flag_name: &'static str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: Display + Debug + Send + Sync + 'static,
{
    let osv = p.value().context(flag_name)?;
    let strv = match osv.into_string() {
        Ok(strv) => strv,
        Err(osv) => {
            let err = lexopt::Error::NonUnicodeValue(osv);
            return Err(anyhow::Error::from(err).context(flag_name));
        }
    };
    strv.parse().map_err(|err| anyhow::Error::msg(err).context(flag_name))
}

/// Like `parse`, but for a positional value that was already consumed.
pub fn parse_value<T>(
    value: std::ffi::OsString,
    name: &'static str,
) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: Display + Debug + Send + Sync + 'static,
{
    let strv = value.string().context(name)?;
    strv.parse().map_err(|err| anyhow::Error::msg(err).context(name))
}

/// The docs of a single flag or positional argument.
///
/// `Usage::short` renders a slice of these as a two column table and
/// `Usage::long` renders them with their full, wrapped descriptions.
#[derive(Clone, Copy, Debug)]
pub struct Usage {
    /// `true` for an optional flag, `false` for a positional argument.
    pub flag: bool,
    /// How the flag is written, e.g., `-f, --format <kind>`.
    pub format: &'static str,
    /// A one line description.
    pub short: &'static str,
    /// The full description. Paragraphs are separated by blank lines.
    pub long: &'static str,
}

impl Usage {
    pub const fn flag(
        format: &'static str,
        short: &'static str,
        long: &'static str,
    ) -> Usage {
        Usage { flag: true, format, short, long }
    }

    pub const fn arg(
        format: &'static str,
        short: &'static str,
        long: &'static str,
    ) -> Usage {
        Usage { flag: false, format, short, long }
    }

    pub fn short(usages: &[Usage]) -> String {
        let mut result = String::new();
        let Some(width) = usages.iter().map(|u| u.format.len()).max() else {
            return result;
        };
        for usage in usages.iter() {
            writeln!(
                result,
                "    {:width$}  {}",
                usage.format,
                usage.short,
                width = width,
            )
            .unwrap();
        }
        result
    }

    pub fn long(usages: &[Usage]) -> String {
        let wrap_opts = textwrap::Options::new(79)
            .initial_indent("        ")
            .subsequent_indent("        ");
        let mut result = String::new();
        for (i, usage) in usages.iter().enumerate() {
            if i > 0 {
                result.push('\n');
            }
            writeln!(result, "    {}", usage.format).unwrap();
            for (j, paragraph) in usage.long.trim().split("\n\n").enumerate() {
                if j > 0 {
                    result.push('\n');
                }
                let flattened = paragraph.replace("\n", " ");
                for line in textwrap::wrap(&flattened, &wrap_opts) {
                    result.push_str(&line);
                    result.push('\n');
                }
            }
        }
        result
    }
}

/// A `-h/--help` message masquerading as an error.
///
/// `main` sniffs this out and prints it to stdout with a success exit code.
#[derive(Debug)]
pub struct Help(String);

impl Help {
    const USAGE: Usage = Usage::flag(
        "-h/--help",
        "Print help output.",
        r#"
Print help output.

The short flag, -h, shows condensed help with one line per flag. The long
flag, --help, shows the complete documentation of every flag.
"#,
    );
}

impl std::fmt::Display for Help {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Help {}

/// A `--version` message masquerading as an error.
#[derive(Debug)]
pub struct Version;

impl Version {
    const USAGE: Usage = Usage::flag(
        "--version",
        "Print the version of rrform.",
        r#"
Print the version of rrform.
"#,
    );
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let semver = option_env!("CARGO_PKG_VERSION").unwrap_or("N/A");
        write!(f, "rrform {semver}")
    }
}

impl std::error::Error for Version {}
