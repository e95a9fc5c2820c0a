use std::{ffi::OsString, io};

use libc::{EACCES, ENOENT};

use crate::{
    error::{Error, Result},
    process_manager::types::{CommandSpec, SHELL},
};

/// Words the shell handles itself; nothing to look up on disk.
const SHELL_WORDS: &[&str] = &[
    "!", ".", ":", "[", "{", "alias", "break", "case", "cd", "command", "continue", "echo",
    "eval", "exec", "exit", "export", "false", "for", "if", "kill", "local", "printf", "pwd",
    "read", "return", "set", "shift", "source", "test", "time", "trap", "true", "type",
    "ulimit", "umask", "unset", "until", "wait", "while",
];

const SHELL_SYNTAX: &[char] = &[
    '\'', '"', '\\', '$', '`', '(', ')', '{', '}', '*', '?', ';', '&', '|', '<', '>', '~', '#',
];

fn is_assignment(word: &str) -> bool {
    word.split_once('=').is_some_and(|(name, _)| {
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// The program a `sh -c` line starts with, when it can be told without
/// running the shell.
fn program_word(line: &str) -> Option<&str> {
    let word = line.split_whitespace().find(|word| !is_assignment(word))?;
    if SHELL_WORDS.contains(&word) || word.contains(SHELL_SYNTAX) {
        return None;
    }
    Some(word)
}

fn launch_error(program: &str, errno: i32) -> Error {
    Error::Launch {
        program: program.to_owned(),
        source: io::Error::from_raw_os_error(errno),
    }
}

/// Fails with the OS error `exec` would have hit when the program of a
/// shell command line is missing or not executable.
///
/// Lines whose first word is shell syntax or a builtin are left to the
/// shell.
pub(crate) fn check(spec: &CommandSpec) -> Result<()> {
    let [shell, flag, line] = spec.cmd.as_slice() else {
        return Ok(());
    };
    if [shell.as_str(), flag.as_str()] != SHELL {
        return Ok(());
    }
    let Some(program) = program_word(line) else {
        return Ok(());
    };

    let cwd = match &spec.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir()?,
    };
    // A missing working directory is reported by the spawn itself.
    if !cwd.is_dir() {
        return Ok(());
    }
    let search: OsString = spec
        .env
        .iter()
        .find(|(key, _)| key == "PATH")
        .map(|(_, value)| OsString::from(value))
        .or_else(|| std::env::var_os("PATH"))
        .unwrap_or_default();

    if which::which_in(program, Some(&search), &cwd).is_ok() {
        return Ok(());
    }

    // `which` skips files without an execute bit; exec reports those as EACCES.
    let present = if program.contains('/') {
        cwd.join(program).is_file()
    } else {
        std::env::split_paths(&search).any(|dir| dir.join(program).is_file())
    };
    Err(launch_error(program, if present { EACCES } else { ENOENT }))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn shell(line: &str) -> CommandSpec {
        CommandSpec {
            name: "svc".to_owned(),
            cmd: vec!["sh".to_owned(), "-c".to_owned(), line.to_owned()],
            cwd: None,
            env: vec![],
        }
    }

    #[test]
    fn test_program_word() {
        assert_eq!(program_word("cargo run --bin api"), Some("cargo"));
        assert_eq!(program_word("  PORT=1 RUST_LOG=debug ./api"), Some("./api"));
        assert_eq!(program_word("exit 1"), None);
        assert_eq!(program_word("echo hi; sleep 1"), None);
        assert_eq!(program_word("$HOME/bin/api"), None);
        assert_eq!(program_word("(cd api && make)"), None);
        assert_eq!(program_word(""), None);
    }

    #[test]
    fn test_found_on_path() {
        assert!(check(&shell("sh -c true")).is_ok());
        assert!(check(&shell("echo builtin")).is_ok());
    }

    #[test]
    fn test_missing_program() {
        let err = check(&shell("definitely-not-a-real-binary-xyz --flag")).unwrap_err();
        assert!(matches!(
            &err,
            Error::Launch { program, source }
                if program == "definitely-not-a-real-binary-xyz"
                    && source.kind() == io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn test_missing_relative_path() {
        let mut spec = shell("./nope --serve");
        spec.cwd = Some(PathBuf::from("/"));
        assert!(check(&spec).is_err());
    }

    #[test]
    fn test_service_path_overrides_inherited() {
        let mut spec = shell("sh -c true");
        spec.env = vec![("PATH".to_owned(), "/definitely/not/a/dir".to_owned())];
        assert!(check(&spec).is_err());
    }

    #[test]
    fn test_non_shell_specs_are_not_checked() {
        let spec = CommandSpec {
            name: "direct".to_owned(),
            cmd: vec!["definitely-not-a-real-binary-xyz".to_owned()],
            cwd: None,
            env: vec![],
        };
        assert!(check(&spec).is_ok());
    }
}
