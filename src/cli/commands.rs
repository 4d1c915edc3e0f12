//! cli::commands
//!
//! Command dispatch and output formatting.
//!
//! # Design
//!
//! Each handler opens a [`Repository`] session, takes the repository
//! lock when it mutates anything, calls one engine operation, and
//! formats the result. Recognized failures propagate as [`RepoError`]
//! values and are printed by the binary's entry point; nothing in this
//! module terminates the process.

use std::io;
use std::path::Path;

use anyhow::bail;
use clap::CommandFactory;

use crate::cli::args::{Cli, Command, Shell};
use crate::core::lock::RepoLock;
use crate::repo::history::LogEntry;
use crate::repo::merge::MergeOutcome;
use crate::repo::worktree::StatusReport;
use crate::repo::{self, Repository};
use crate::ui::output::{self, Verbosity};

/// Dispatch a parsed command.
pub fn dispatch(
    command: Command,
    cwd: Option<&Path>,
    verbosity: Verbosity,
) -> anyhow::Result<()> {
    let root = repo::working_dir(cwd)?;

    match command {
        Command::Init { branch } => {
            let repo = Repository::init(&root, branch.as_deref())?;
            output::debug(
                format_args!("initialized repository at {}", repo.root().display()),
                verbosity,
            );
        }
        Command::Add { file } => {
            let mut repo = open_locked(&root)?;
            repo.session.add(&file)?;
        }
        Command::Commit { message } => {
            let mut repo = open_locked(&root)?;
            let id = repo.session.commit(&message, None)?;
            output::debug(format_args!("created commit {id}"), verbosity);
        }
        Command::Rm { file } => {
            let mut repo = open_locked(&root)?;
            repo.session.remove(&file)?;
        }
        Command::Log => {
            let repo = Repository::open(&root)?;
            for entry in repo.log()? {
                print!("{}", format_log_entry(&entry));
            }
        }
        Command::GlobalLog => {
            let repo = Repository::open(&root)?;
            for entry in repo.global_log()? {
                print!("{}", format_log_entry(&entry));
            }
        }
        Command::Find { message } => {
            let repo = Repository::open(&root)?;
            for id in repo.find(&message)? {
                println!("{id}");
            }
        }
        Command::Status => {
            let repo = Repository::open(&root)?;
            print!("{}", format_status(&repo.status()?));
        }
        Command::Checkout { target, file } => {
            let mut repo = open_locked(&root)?;
            match (target, file.as_slice()) {
                (Some(branch), []) => repo.session.checkout_branch(&branch)?,
                (None, [file]) => repo.session.checkout_file(file)?,
                (Some(commit), [file]) => {
                    repo.session.checkout_commit_file(&commit, file)?;
                }
                _ => bail!("Incorrect operands."),
            }
        }
        Command::Branch { name } => {
            let repo = open_locked(&root)?;
            repo.session.create_branch(&name)?;
        }
        Command::RmBranch { name } => {
            let repo = open_locked(&root)?;
            repo.session.remove_branch(&name)?;
        }
        Command::Reset { commit } => {
            let mut repo = open_locked(&root)?;
            repo.session.reset(&commit)?;
        }
        Command::Merge { branch } => {
            let mut repo = open_locked(&root)?;
            let outcome = repo.session.merge(&branch)?;
            report_merge(&outcome, verbosity);
        }
        Command::AddRemote { name, path } => {
            let repo = open_locked(&root)?;
            repo.session.add_remote(&name, &path)?;
        }
        Command::RmRemote { name } => {
            let repo = open_locked(&root)?;
            repo.session.rm_remote(&name)?;
        }
        Command::Push { remote, branch } => {
            let repo = open_locked(&root)?;
            repo.session.push(&remote, &branch)?;
        }
        Command::Fetch { remote, branch } => {
            let repo = open_locked(&root)?;
            let tracking = repo.session.fetch(&remote, &branch)?;
            output::debug(
                format_args!("fetched into {}", tracking.as_str()),
                verbosity,
            );
        }
        Command::Pull { remote, branch } => {
            let mut repo = open_locked(&root)?;
            let outcome = repo.session.pull(&remote, &branch)?;
            report_merge(&outcome, verbosity);
        }
        Command::Completion { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

/// A repository session paired with the repository lock.
///
/// The lock is never read after acquisition; holding the guard until
/// the handler returns is its entire job.
struct LockedRepo {
    session: Repository,
    _lock: RepoLock,
}

/// Open the repository and take the exclusive lock for a mutating
/// command. The session is opened first so an uninitialized directory
/// fails with the right message instead of growing a stray lock file.
fn open_locked(root: &Path) -> Result<LockedRepo, repo::RepoError> {
    let session = Repository::open(root)?;
    let lock = RepoLock::acquire(session.paths())?;
    Ok(LockedRepo {
        session,
        _lock: lock,
    })
}

/// Render one log entry in the fixed display format.
fn format_log_entry(entry: &LogEntry) -> String {
    let mut out = String::new();
    out.push_str("===\n");
    out.push_str(&format!("commit {}\n", entry.id));
    if let Some((first, second)) = &entry.merge_parents {
        out.push_str(&format!("Merge: {} {}\n", first.short(), second.short()));
    }
    out.push_str(&format!("Date: {}\n", entry.timestamp));
    out.push_str(&format!("{}\n\n", entry.message));
    out
}

/// Render the five-section status report.
fn format_status(report: &StatusReport) -> String {
    let mut out = String::new();

    out.push_str("=== Branches ===\n");
    for branch in &report.branches {
        if *branch == report.current_branch {
            out.push_str(&format!("*{branch}\n"));
        } else {
            out.push_str(&format!("{branch}\n"));
        }
    }
    out.push('\n');

    out.push_str("=== Staged Files ===\n");
    for path in &report.staged {
        out.push_str(&format!("{path}\n"));
    }
    out.push('\n');

    out.push_str("=== Removed Files ===\n");
    for path in &report.removed {
        out.push_str(&format!("{path}\n"));
    }
    out.push('\n');

    out.push_str("=== Modifications Not Staged For Commit ===\n");
    for (path, kind) in &report.modifications {
        out.push_str(&format!("{path} ({})\n", kind.label()));
    }
    out.push('\n');

    out.push_str("=== Untracked Files ===\n");
    for path in &report.untracked {
        out.push_str(&format!("{path}\n"));
    }
    out.push('\n');

    out
}

fn report_merge(outcome: &MergeOutcome, verbosity: Verbosity) {
    match outcome {
        MergeOutcome::FastForward => {
            output::print("Current branch fast-forwarded.", verbosity);
        }
        MergeOutcome::Merged { conflicts: true } => {
            output::print("Encountered a merge conflict.", verbosity);
        }
        MergeOutcome::Merged { conflicts: false } => {}
    }
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "strata", &mut io::stdout());
}
