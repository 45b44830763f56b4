use std::io::Write;

use lexopt::{Arg, Parser};

use crate::{
    args::{self, Usage},
    choices::{self, Choice},
    rule::{Frequency, IntervalGroup, WeekdayGroup},
    style::Theme,
};

const USAGE: &'static str = r#"
Print the option groups of the interval and weekday fields.

Both the interval field and the weekday field present their options in
labeled groups. The interval field has one group per frequency, labeled `1`
(yearly) through `4` (daily). The weekday field has a `nth-weekday` group
(like "second Tuesday") and a plain `weekdays` group (like "Tuesdays").

USAGE:
    rrform choices interval [--freq <frequency>]
    rrform choices byweekday

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    List the intervals offered for monthly rules:

        $ rrform choices interval --freq monthly

    %snip-start%

    Count the weekday options of each group:

        $ rrform choices byweekday | grep -c '^  '
        49

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    args::configure(p, USAGE, &mut [&mut config])?;
    let Some(catalog) = config.catalog else {
        anyhow::bail!(
            "missing catalog name, expected `interval` or `byweekday`"
        )
    };

    let mut wtr = std::io::stdout().lock();
    match catalog {
        Catalog::Interval => {
            let groups: Vec<IntervalGroup> = match config.freq {
                Some(freq) => vec![IntervalGroup::new(freq)],
                None => IntervalGroup::all().collect(),
            };
            for group in groups {
                let name = format!("group {group} ({})", group.frequency());
                let choices = choices::interval_choices(group);
                write_group(&mut wtr, &name, &choices)?;
            }
        }
        Catalog::ByWeekday => {
            anyhow::ensure!(
                config.freq.is_none(),
                "--freq only applies to the interval catalog",
            );
            for group in WeekdayGroup::ALL {
                let choices = choices::weekday_choices(group);
                write_group(&mut wtr, group.label(), &choices)?;
            }
        }
    }
    Ok(())
}

fn write_group<W: Write>(
    mut wtr: W,
    name: &str,
    choices: &[Choice],
) -> anyhow::Result<()> {
    writeln!(wtr, "{}:", Theme::stdout().highlight(name))?;
    for choice in choices.iter() {
        writeln!(wtr, "  {}: {}", choice.value, choice.label)?;
    }
    Ok(())
}

#[derive(Clone, Copy, Debug)]
enum Catalog {
    Interval,
    ByWeekday,
}

impl std::str::FromStr for Catalog {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Catalog> {
        Ok(match s {
            "interval" => Catalog::Interval,
            "byweekday" => Catalog::ByWeekday,
            unk => anyhow::bail!(
                "unrecognized catalog `{unk}`, expected `interval` or \
                 `byweekday`",
            ),
        })
    }
}

#[derive(Debug, Default)]
struct Config {
    catalog: Option<Catalog>,
    freq: Option<Frequency>,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Long("freq") => {
                self.freq = Some(args::parse(p, "--freq")?);
            }
            Arg::Value(ref mut v) => {
                anyhow::ensure!(
                    self.catalog.is_none(),
                    "only one catalog may be given",
                );
                let v = std::mem::take(v);
                self.catalog = Some(args::parse_value(v, "<catalog>")?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const CATALOG: Usage = Usage::arg(
            "<catalog>",
            "The catalog to print, `interval` or `byweekday`.",
            r#"
The catalog to print, `interval` or `byweekday`.

Each group is printed on its own line, followed by one indented line per
option. Each option line has the value submitted by the form and the label
shown to users.
"#,
        );

        &[CATALOG, Frequency::USAGE]
    }
}
