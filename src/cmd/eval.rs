use std::io::Write;

use {
    anyhow::Context,
    lexopt::{Arg, Parser},
};

use crate::{
    args::{self, Usage, flags},
    form::{FormRow, RowContext},
    parse::BufReadExt,
    rule::{Field, WeekdayGroup},
    style::Theme,
    visibility::{self, DEPENDENT_FIELDS, FieldDirective, FieldDirectives},
};

const USAGE: &'static str = r#"
Print the visibility directives of form rows.

Each form row is read as one JSON object per line. For each row, this computes
which of its dependent fields should be visible, which should be enabled and
which must have their values cleared. It also computes which option groups of
the interval and weekday fields are enabled, and which interval option must be
selected.

This command never changes the rows themselves. Use `rrform change` for that.

USAGE:
    rrform eval <path>
    rrform eval < line delimited form rows

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Show the directives for a monthly rule that repeats by day:

        $ echo '{"prefix":"form-0","freq":"1","year_month_mode":"2"}' \
            | rrform eval
        form-0:
          id_form-0-year_month_mode: visible, enabled
          id_form-0-bymonthday: hidden, disabled, cleared
          id_form-0-byweekday: visible, enabled
          id_form-0-count: hidden, disabled, cleared
          id_form-0-utc_until: hidden, disabled, cleared
          id_form-0-bysetpos: hidden, disabled, cleared
          id_form-0-interval: group 2 enabled, select 1
          id_form-0-byweekday optgroups: nth-weekday enabled, weekdays enabled

    %snip-start%

    Row fields that are missing are treated as empty. Values that can't be
    interpreted (for example, an unknown frequency) are treated as unset. Use
    `RRFORM_LOG=debug` to see which values were ignored.

    The JSON output is convenient for further processing with tools like `jq`:

        $ rrform eval -f json rows.jsonl | jq '.directives.interval'

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    args::configure(p, USAGE, &mut [&mut config])?;

    let mut wtr = std::io::stdout().lock();
    let result = config.input.reader()?.for_byte_line(|line| {
        if line.is_blank() {
            return Ok(true);
        }
        let row: FormRow = line.json().with_context(|| {
            format!("line {}: failed to parse form row", line.number())
        })?;
        let directives = visibility::compute(&row.state());
        match config.format {
            flags::Format::Text => {
                write_text(&mut wtr, row.context(), &directives)?;
            }
            flags::Format::Json => {
                let evaluated =
                    Evaluated { prefix: &row.prefix, directives: &directives };
                serde_json::to_writer(&mut wtr, &evaluated)?;
                writeln!(wtr)?;
            }
        }
        Ok(true)
    });
    result.with_context(|| format!("{}", config.input.display()))?;
    Ok(())
}

#[derive(Debug, serde::Serialize)]
struct Evaluated<'a> {
    prefix: &'a str,
    directives: &'a FieldDirectives,
}

fn write_text<W: Write>(
    mut wtr: W,
    cx: RowContext<'_>,
    directives: &FieldDirectives,
) -> anyhow::Result<()> {
    let theme = Theme::stdout();
    writeln!(wtr, "{}:", theme.highlight(cx.prefix()))?;
    for field in DEPENDENT_FIELDS {
        let directive = directives.get(field);
        writeln!(wtr, "  {}: {}", cx.id(field), styled(directive))?;
    }

    let interval = directives.interval();
    let enabled = match interval.enabled {
        Some(group) => format!("group {group} enabled"),
        None => "all groups disabled".to_string(),
    };
    let select = match interval.select {
        Some(choice) => choice.value.to_string(),
        None => "none".to_string(),
    };
    writeln!(wtr, "  {}: {enabled}, select {select}", cx.id(Field::Interval))?;

    let groups = directives.weekday_groups();
    let states: Vec<String> = WeekdayGroup::ALL
        .into_iter()
        .map(|group| {
            if groups.is_enabled(group) {
                format!("{group} {}", theme.shown("enabled"))
            } else {
                format!("{group} {}", theme.hidden("disabled"))
            }
        })
        .collect();
    writeln!(
        wtr,
        "  {} optgroups: {}",
        cx.id(Field::ByWeekday),
        states.join(", "),
    )?;
    Ok(())
}

fn styled(directive: FieldDirective) -> String {
    let theme = Theme::stdout();
    if directive.visible {
        theme.shown(directive).to_string()
    } else {
        theme.hidden(directive).to_string()
    }
}

#[derive(Debug, Default)]
struct Config {
    input: flags::FileOrStdin,
    format: flags::Format,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Short('f') | Arg::Long("format") => {
                self.format = args::parse(p, "-f/--format")?;
            }
            Arg::Value(ref mut v) => {
                self.input.set(std::mem::take(v))?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const PATH: Usage = Usage::arg(
            "<path>",
            "A file path to read line delimited form rows from.",
            r#"
A file path to read line delimited form rows from.

In lieu of a specific file path, users may also pass line delimited form rows
into stdin. Each row is a JSON object with a `prefix` and any of the fields
`freq`, `year_month_mode`, `interval`, `bymonthday`, `byweekday`, `freq_type`,
`count`, `utc_until`, `advance_options` and `bysetpos`. Blank lines are
skipped.
"#,
        );

        &[PATH, flags::Format::USAGE_EVAL]
    }
}
