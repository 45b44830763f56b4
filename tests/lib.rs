use std::{ffi::OsStr, path::Path};


/// A temporary directory for tests that read form rows from files.
#[derive(Debug)]
struct TempDir(tempfile::TempDir);

impl TempDir {
    fn new() -> TempDir {
        TempDir(tempfile::tempdir().unwrap())
    }

    /// Create a new `rrform` command whose CWD is this directory and with
    /// the given arguments appended to it.
    fn rrform<T: AsRef<OsStr>>(
        &self,
        args: impl IntoIterator<Item = T>,
    ) -> crate::command::Command {
        rrform(args).current_dir(self.0.path())
    }

    /// Create a new file in this temporary directory with the given relative
    /// path and contents.
    fn create(
        &self,
        relative_path: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) {
        let path = self.0.path().join(relative_path.as_ref());
        std::fs::write(&path, contents).unwrap();
    }
}

/// Return a command for the `rrform` binary with the given arguments
/// appended to it.
fn rrform<T: AsRef<OsStr>>(
    args: impl IntoIterator<Item = T>,
) -> crate::command::Command {
    crate::command::bin("rrform").env("NO_COLOR", "1").args(args)
}

#[test]
fn no_args() {
    crate::command::assert_cmd_snapshot!(
        rrform::<&str>([]),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    Decide which fields of recurrence rule form rows are visible.

    Form rows are read as line delimited JSON, one row per line.

    USAGE:
        rrform <command> ...

    COMMANDS:
        change   Change fields of form rows and print the updated rows
        choices  Print the option groups of the interval and weekday fields
        eval     Print the visibility directives of form rows
    ",
    );
}

#[test]
fn unknown_command() {
    crate::command::assert_cmd_snapshot!(
        rrform(["show"]),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    unrecognized command 'show'
    ",
    );
}

#[test]
fn bad_log_level() {
    crate::command::assert_cmd_snapshot!(
        rrform(["choices", "byweekday"]).env("RRFORM_LOG", "loud"),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    unrecognized log level 'loud'
    ",
    );
}
