use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::args::Usage;

/// The output format of commands that print form rows or directives.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

impl Format {
    pub const USAGE_EVAL: Usage = Usage::flag(
        "-f, --format <kind>",
        "Print directives in this format.",
        r#"
Print directives in this format.

The legal values for this flag are `text` (default) and `json`.

The `text` format prints one block per form row, starting with the row's
prefix. Each subsequent line names the element id of a dependent field
followed by what should happen to it: whether it is visible or hidden,
enabled or disabled, and whether its value must be cleared. The last two
lines describe the option groups of the interval and weekday fields.

The `json` format prints one JSON object per form row, with the same
information keyed by field name.
"#,
    );

    pub const USAGE_CHANGE: Usage = Usage::flag(
        "-f, --format <kind>",
        "Print updated rows in this format.",
        r#"
Print updated rows in this format.

The legal values for this flag are `json` (default) and `text`.

The `json` format prints each updated form row as one JSON object per line.
This is the same format accepted as input, which makes it possible to pipe
the output of one `rrform change` into another, or into `rrform eval`.

The `text` format prints one block per form row with one line per field,
followed by the disabled option groups. Hidden fields are marked as such.
"#,
    );
}

impl std::str::FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Format> {
        Ok(match s {
            "text" => Format::Text,
            "json" => Format::Json,
            unk => anyhow::bail!(
                "unrecognized format `{unk}`, expected `text` or `json`"
            ),
        })
    }
}

/// A `<target>=<value>` assignment to a field of a form row.
///
/// The target is either a bare field name (e.g., `freq`) or an element id
/// or name scoped to one row (e.g., `id_form-0-freq` or `form-0-freq_type`).
/// Resolving the target against a row is left to the caller, since only the
/// row knows its own prefix.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assignment {
    target: String,
    value: String,
}

impl Assignment {
    pub const USAGE: Usage = Usage::flag(
        "-s, --set <target>=<value>",
        "Change a field and dispatch its change event.",
        r#"
Change a field and dispatch its change event.

The target may be a bare field name, in which case the change applies to every
form row. Or it may be an element id (like `id_form-0-freq`) or a radio input
name (like `form-0-freq_type`), in which case the change only applies to the
form row with that prefix.

The fields are: freq, year_month_mode, interval, bymonthday, byweekday,
freq_type, count, utc_until, advance_options and bysetpos.

Multi-valued fields (bymonthday, byweekday and bysetpos) accept a comma
separated list of values. An empty value clears the field. The interval field
accepts an interval value, which is selected in the option group of the row's
current frequency. The advance_options checkbox accepts `on` or `off`.

Changing freq, year_month_mode, byweekday, advance_options or freq_type
recomputes which fields are visible. Changing any other field only stores the
new value.

This flag may be given multiple times. Changes are applied in order.
"#,
    );

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::str::FromStr for Assignment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Assignment> {
        let Some((target, value)) = s.split_once('=') else {
            anyhow::bail!(
                "invalid assignment `{s}`, expected `<target>=<value>`"
            )
        };
        let target = target.trim();
        anyhow::ensure!(
            !target.is_empty(),
            "invalid assignment `{s}`, the target must not be empty",
        );
        Ok(Assignment { target: target.to_string(), value: value.to_string() })
    }
}

/// Either one file path or stdin.
#[derive(Clone, Debug)]
pub struct FileOrStdin {
    path: Option<PathBuf>,
}

impl FileOrStdin {
    /// Read from stdin. Nothing is read until `FileOrStdin::reader` is
    /// called.
    pub fn stdin() -> FileOrStdin {
        FileOrStdin { path: None }
    }

    /// Sets the path, but only if one hasn't been set already.
    pub fn set(&mut self, path: impl Into<PathBuf>) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.path.is_none(),
            "command only accepts a single path",
        );
        let path: PathBuf = path.into();
        if path != Path::new("-") {
            self.path = Some(path);
        }
        Ok(())
    }

    /// The file path, or `<stdin>`.
    pub fn display(&self) -> impl std::fmt::Display + '_ {
        self.path.as_deref().unwrap_or_else(|| Path::new("<stdin>")).display()
    }

    /// Return a buffered reader for the underlying file or stdin.
    pub fn reader(&self) -> anyhow::Result<Box<dyn io::BufRead>> {
        Ok(if let Some(ref path) = self.path {
            let file = std::fs::File::open(path)
                .with_context(|| format!("{}", path.display()))?;
            Box::new(io::BufReader::new(file))
        } else {
            Box::new(io::stdin().lock())
        })
    }
}

impl Default for FileOrStdin {
    fn default() -> FileOrStdin {
        FileOrStdin::stdin()
    }
}

impl From<OsString> for FileOrStdin {
    fn from(os_str: OsString) -> FileOrStdin {
        let mut input = FileOrStdin::stdin();
        // Can't fail, since no path has been set yet.
        let _ = input.set(os_str);
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments() {
        let a: Assignment = "freq=2".parse().unwrap();
        assert_eq!(a.target(), "freq");
        assert_eq!(a.value(), "2");

        let a: Assignment = "id_form-0-byweekday=MO,TU".parse().unwrap();
        assert_eq!(a.target(), "id_form-0-byweekday");
        assert_eq!(a.value(), "MO,TU");

        let a: Assignment = "count=".parse().unwrap();
        assert_eq!(a.value(), "");

        let a: Assignment = "bysetpos=-1".parse().unwrap();
        assert_eq!(a.value(), "-1");

        assert!("freq".parse::<Assignment>().is_err());
        assert!("=2".parse::<Assignment>().is_err());
    }

    #[test]
    fn formats() {
        assert_eq!("text".parse::<Format>().unwrap(), Format::Text);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn dash_is_stdin() {
        let input = FileOrStdin::from(OsString::from("-"));
        assert_eq!(input.display().to_string(), "<stdin>");
        let mut input = FileOrStdin::from(OsString::from("rows.jsonl"));
        assert_eq!(input.display().to_string(), "rows.jsonl");
        assert!(input.set("more.jsonl").is_err());
    }
}
