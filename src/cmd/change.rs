use std::io::Write;

use {
    anyhow::Context,
    lexopt::{Arg, Parser},
};

use crate::{
    args::{self, Usage, flags},
    form::{Event, FormRow},
    parse::BufReadExt,
    rule::Field,
    style::Theme,
};

const USAGE: &'static str = r#"
Change fields of form rows and print the updated rows.

Each form row is read as one JSON object per line. Changes are then applied
to each row the way a browser would apply them to a live form: changing a
watched field recomputes which fields are visible, hides and clears the fields
that no longer apply and fixes up the option groups of the interval and
weekday fields.

Each row is printed after all changes have been applied to it. By default,
rows are printed as JSON, which means the output of this command can be fed
back into `rrform change` or `rrform eval`.

USAGE:
    rrform change [--init] [-s <target>=<value> ...] <path>
    rrform change [--init] [-s <target>=<value> ...] < line delimited form rows

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Switch a monthly rule to a daily one. The month day is cleared and the
    interval is reset to the first daily option:

        $ echo '{"prefix":"form-0","freq":"1","year_month_mode":"1","bymonthday":["15"]}' \
            | rrform change -s freq=3 -f text
        form-0:
          freq: 3
          year_month_mode: - (hidden)
          interval: 1
          bymonthday: - (hidden)
          byweekday: - (hidden)
          freq_type: -
          count: - (hidden)
          utc_until: - (hidden)
          advance_options: false
          bysetpos: - (hidden)
          disabled optgroups: interval 1, 2, 3; byweekday nth-weekday

    %snip-start%

    Only change the second row of a formset:

        $ rrform change -s id_form-1-freq_type=count -s id_form-1-count=5 rows.jsonl

    Initialize freshly loaded rows, as happens when a page with a formset is
    first opened:

        $ rrform change --init rows.jsonl

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    args::configure(p, USAGE, &mut [&mut config])?;
    let assignments = config
        .assignments
        .iter()
        .map(Target::new)
        .collect::<anyhow::Result<Vec<Target>>>()?;

    let mut matched = vec![false; assignments.len()];
    let mut wtr = std::io::stdout().lock();
    let result = config.input.reader()?.for_byte_line(|line| {
        if line.is_blank() {
            return Ok(true);
        }
        let mut row: FormRow = line.json().with_context(|| {
            format!("line {}: failed to parse form row", line.number())
        })?;
        if config.init {
            row.handle(Event::Init);
        }
        for (i, target) in assignments.iter().enumerate() {
            let Some(field) = target.resolve(&row) else { continue };
            matched[i] = true;
            row.set(field, target.assignment.value()).with_context(|| {
                format!(
                    "line {}: failed to set `{}`",
                    line.number(),
                    target.assignment.target(),
                )
            })?;
        }
        match config.format {
            flags::Format::Json => {
                serde_json::to_writer(&mut wtr, &row)?;
                writeln!(wtr)?;
            }
            flags::Format::Text => write_text(&mut wtr, &row)?,
        }
        Ok(true)
    });
    result.with_context(|| format!("{}", config.input.display()))?;
    for (target, matched) in assignments.iter().zip(matched) {
        if !matched {
            log::warn!(
                "`{}` did not match any form row",
                target.assignment.target(),
            );
        }
    }
    Ok(())
}

/// An assignment whose target has been checked to name a form field.
#[derive(Debug)]
struct Target<'a> {
    assignment: &'a flags::Assignment,
    /// Set when the target is a bare field name, which applies to every row.
    every_row: Option<Field>,
}

impl<'a> Target<'a> {
    fn new(assignment: &'a flags::Assignment) -> anyhow::Result<Target<'a>> {
        let target = assignment.target();
        if let Some(field) = Field::from_name(target) {
            return Ok(Target { assignment, every_row: Some(field) });
        }
        let names_field = Field::ALL.iter().any(|field| {
            target.ends_with(&format!("-{}", field.name()))
        });
        anyhow::ensure!(
            names_field,
            "unrecognized target `{target}`, expected a field name or an \
             element id or name like `id_form-0-freq`",
        );
        Ok(Target { assignment, every_row: None })
    }

    fn resolve(&self, row: &FormRow) -> Option<Field> {
        if let Some(field) = self.every_row {
            return Some(field);
        }
        row.context().resolve(self.assignment.target())
    }
}

fn write_text<W: Write>(mut wtr: W, row: &FormRow) -> anyhow::Result<()> {
    let theme = Theme::stdout();
    writeln!(wtr, "{}:", theme.highlight(&row.prefix))?;
    for field in Field::ALL {
        let value = row.value(field);
        let value = if value.is_empty() { "-".to_string() } else { value };
        if row.hidden.contains(&field) {
            let value = format!("{value} (hidden)");
            writeln!(wtr, "  {field}: {}", theme.hidden(value))?;
        } else {
            writeln!(wtr, "  {field}: {value}")?;
        }
    }
    let mut groups = vec![];
    if !row.disabled_groups.interval.is_empty() {
        let labels: Vec<String> = row
            .disabled_groups
            .interval
            .iter()
            .map(|group| group.to_string())
            .collect();
        groups.push(format!("interval {}", labels.join(", ")));
    }
    if !row.disabled_groups.byweekday.is_empty() {
        let labels: Vec<&str> = row
            .disabled_groups
            .byweekday
            .iter()
            .map(|group| group.label())
            .collect();
        groups.push(format!("byweekday {}", labels.join(", ")));
    }
    let groups =
        if groups.is_empty() { "none".to_string() } else { groups.join("; ") };
    writeln!(wtr, "  disabled optgroups: {groups}")?;
    Ok(())
}

#[derive(Debug)]
struct Config {
    input: flags::FileOrStdin,
    init: bool,
    assignments: Vec<flags::Assignment>,
    format: flags::Format,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            input: flags::FileOrStdin::default(),
            init: false,
            assignments: vec![],
            format: flags::Format::Json,
        }
    }
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Long("init") => {
                self.init = true;
            }
            Arg::Short('s') | Arg::Long("set") => {
                self.assignments.push(args::parse(p, "-s/--set")?);
            }
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
into stdin. Blank lines are skipped.
"#,
        );

        const INIT: Usage = Usage::flag(
            "--init",
            "Initialize each row before applying changes.",
            r#"
Initialize each row before applying changes.

This does what happens when a form row is first added to a page. Namely, when
an advanced option (the set position) already has a value, the advanced
options checkbox is checked. Then the directives are computed from the row's
current values and applied to it.
"#,
        );

        &[PATH, INIT, flags::Assignment::USAGE, flags::Format::USAGE_CHANGE]
    }
}
