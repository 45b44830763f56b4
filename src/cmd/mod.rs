mod change;
mod choices;
mod eval;

const USAGE: &'static str = "\
Decide which fields of recurrence rule form rows are visible.

Form rows are read as line delimited JSON, one row per line.

USAGE:
    rrform <command> ...

COMMANDS:
    change   Change fields of form rows and print the updated rows
    choices  Print the option groups of the interval and weekday fields
    eval     Print the visibility directives of form rows
";

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let cmd = crate::args::next_as_command(USAGE, p)?;
    match &*cmd {
        "change" => change::run(p),
        "choices" => choices::run(p),
        "eval" => eval::run(p),
        unk => anyhow::bail!("unrecognized command '{}'", unk),
    }
}
