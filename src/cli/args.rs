//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use clap_complete::Shell;

/// Strata - a small local version-control engine
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if strata was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new repository in the current directory
    #[command(long_about = "Create a new repository in the current directory.\n\n\
        Sets up the .strata storage layout with a single root commit on the \
        initial branch (master unless overridden with --branch).")]
    Init {
        /// Name of the initial branch
        #[arg(long)]
        branch: Option<String>,
    },

    /// Stage a file for the next commit
    Add {
        /// Path of the file, relative to the repository root
        file: String,
    },

    /// Record staged changes as a new commit
    Commit {
        /// The commit message
        message: String,
    },

    /// Unstage a file, or stage a tracked file for removal
    Rm {
        /// Path of the file, relative to the repository root
        file: String,
    },

    /// Show the current branch's history (first parents only)
    Log,

    /// Show every commit in the object store
    #[command(name = "global-log")]
    GlobalLog,

    /// List ids of commits with an exact message
    Find {
        /// The message to match exactly
        message: String,
    },

    /// Show branches, staged changes, and working-tree differences
    Status,

    /// Restore a file or switch branches
    #[command(long_about = "Restore a file or switch branches.\n\n\
        Three forms:\n  \
        strata checkout -- <file>            restore <file> from the head commit\n  \
        strata checkout <commit> -- <file>   restore <file> from <commit>\n  \
        strata checkout <branch>             check out a branch")]
    Checkout {
        /// Branch name, or a commit id when followed by `-- <file>`
        target: Option<String>,

        /// File to restore, given after `--`
        #[arg(last = true)]
        file: Vec<String>,
    },

    /// Create a branch pointing at the current commit
    Branch {
        /// Name of the new branch
        name: String,
    },

    /// Delete a branch's pointer (its commits are kept)
    #[command(name = "rm-branch")]
    RmBranch {
        /// Name of the branch to delete
        name: String,
    },

    /// Move the current branch to a commit and restore its tree
    Reset {
        /// Commit id (abbreviations of 4+ characters are accepted)
        commit: String,
    },

    /// Merge a branch into the current branch
    Merge {
        /// The branch to merge in
        branch: String,
    },

    /// Register another repository as a named remote
    #[command(name = "add-remote")]
    AddRemote {
        /// Local name for the remote
        name: String,
        /// Path to the remote repository's root
        path: PathBuf,
    },

    /// Forget a registered remote
    #[command(name = "rm-remote")]
    RmRemote {
        /// Name of the remote to forget
        name: String,
    },

    /// Copy local history to a remote branch (fast-forward only)
    Push {
        /// Name of the registered remote
        remote: String,
        /// Branch to push
        branch: String,
    },

    /// Copy a remote branch's history into a local tracking branch
    Fetch {
        /// Name of the registered remote
        remote: String,
        /// Branch to fetch
        branch: String,
    },

    /// Fetch a remote branch, then merge its tracking branch
    Pull {
        /// Name of the registered remote
        remote: String,
        /// Branch to pull
        branch: String,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_grammar_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn checkout_forms_parse() {
        let cli = Cli::try_parse_from(["strata", "checkout", "dev"]).unwrap();
        match cli.command {
            Command::Checkout { target, file } => {
                assert_eq!(target.as_deref(), Some("dev"));
                assert!(file.is_empty());
            }
            _ => panic!("wrong command"),
        }

        let cli = Cli::try_parse_from(["strata", "checkout", "--", "a.txt"]).unwrap();
        match cli.command {
            Command::Checkout { target, file } => {
                assert_eq!(target, None);
                assert_eq!(file, ["a.txt"]);
            }
            _ => panic!("wrong command"),
        }

        let cli =
            Cli::try_parse_from(["strata", "checkout", "abc123de", "--", "a.txt"]).unwrap();
        match cli.command {
            Command::Checkout { target, file } => {
                assert_eq!(target.as_deref(), Some("abc123de"));
                assert_eq!(file, ["a.txt"]);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn operand_counts_are_enforced() {
        assert!(Cli::try_parse_from(["strata", "add"]).is_err());
        assert!(Cli::try_parse_from(["strata", "push", "origin"]).is_err());
        assert!(Cli::try_parse_from(["strata", "log", "extra"]).is_err());
    }
}
