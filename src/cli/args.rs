//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};

/// treeline - branch and multi-file commit orchestration for GitHub
#[derive(Parser, Debug)]
#[command(name = "tl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; never prompt
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

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
    /// Create, list, or inspect branches
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },

    /// Commit file additions and deletions to a branch in one step
    #[command(
        name = "commit",
        long_about = "Commit file additions and deletions to a branch in one step.\n\n\
            The branch tip is read, a tree is built from it with the requested \
            changes, and the branch is advanced to a new commit. The update is \
            never forced: if someone else pushed to the branch in the meantime, \
            the command fails and can simply be run again.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Add one file and delete another on main
    tl commit https://github.com/acme/widgets -m \"Update docs\" \\
        --add docs/guide.md=./guide.md --delete docs/old.md

    # Commit to a branch named in the URL
    tl commit https://github.com/acme/widgets/tree/release/v2 -m \"Bump\" \\
        --add VERSION=./VERSION

    # Or name the branch explicitly
    tl commit https://github.com/acme/widgets --branch develop -m \"Bump\" \\
        --add VERSION=./VERSION"
    )]
    Commit {
        /// Repository URL, optionally with /tree/<branch>
        repo_url: String,

        /// Branch to commit to (overrides the URL)
        #[arg(long)]
        branch: Option<String>,

        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Set a repository path to the contents of a local file
        #[arg(long = "add", value_name = "PATH=FILE")]
        add: Vec<String>,

        /// Remove a repository path
        #[arg(long = "delete", value_name = "PATH")]
        delete: Vec<String>,
    },

    /// Read files and file history
    File {
        #[command(subcommand)]
        action: FileAction,
    },

    /// Store a GitHub token
    #[command(
        name = "auth",
        long_about = "Store a GitHub personal access token.\n\n\
            Tokens are kept per API host in ~/.treeline/credentials.toml (mode 0600). \
            TREELINE_GITHUB_TOKEN, when set, takes precedence over stored tokens.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Prompt for a token (input is hidden)
    tl auth

    # Non-interactive
    tl auth --token ghp_xxxx

    # Check whether a token is available
    tl auth --status

    # Remove the stored token
    tl auth --logout"
    )]
    Auth {
        /// Token value (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,

        /// API host the token is for (defaults to the configured API host)
        #[arg(long)]
        host: Option<String>,

        /// Show current authentication status
        #[arg(long, conflicts_with = "logout")]
        status: bool,

        /// Remove stored authentication
        #[arg(long)]
        logout: bool,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        after_help = "\
WORKFLOW EXAMPLES:
    # List all configuration values
    tl config list

    # Point at GitHub Enterprise
    tl config set api_base https://github.example.com/api/v3

    # Smaller listing pages
    tl config set listing.per_page 50"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    tl completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    tl completion zsh >> ~/.zshrc

    # Fish
    tl completion fish > ~/.config/fish/completions/tl.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Branch subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum BranchAction {
    /// Create a branch from the tip of main (or the URL's /tree/<branch>)
    Create {
        /// Repository URL
        repo_url: String,
        /// New branch name
        name: String,
    },
    /// List every branch
    List {
        /// Repository URL
        repo_url: String,
    },
    /// Show the repository's default branch
    #[command(name = "default")]
    DefaultBranch {
        /// Repository URL
        repo_url: String,
    },
}

/// File subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FileAction {
    /// Print the blob a content URL points at
    Get {
        /// Content URL (.../repos/<owner>/<repo>/git/blobs/<id>)
        content_url: String,
    },
    /// Print a file at the tip of a branch
    Latest {
        /// Repository URL
        repo_url: String,
        /// Path within the repository
        path: String,
        /// Branch to read (overrides the URL)
        #[arg(long)]
        branch: Option<String>,
    },
    /// Show when a file last took on the given content
    LastEdit {
        /// Repository URL
        repo_url: String,
        /// Path within the repository
        path: String,
        /// Blob id of the content
        object_id: String,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn commit_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "tl",
            "commit",
            "https://github.com/acme/widgets",
            "-m",
            "msg",
            "--add",
            "a.txt=./a",
            "--add",
            "b.txt=./b",
            "--delete",
            "c.txt",
        ])
        .unwrap();

        match cli.command {
            Command::Commit {
                add,
                delete,
                branch,
                ..
            } => {
                assert_eq!(add, vec!["a.txt=./a", "b.txt=./b"]);
                assert_eq!(delete, vec!["c.txt"]);
                assert!(branch.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tl",
            "branch",
            "list",
            "https://github.com/acme/widgets",
            "--json",
            "-q",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
    }

    #[test]
    fn last_edit_is_kebab_case() {
        let cli = Cli::try_parse_from([
            "tl",
            "file",
            "last-edit",
            "https://github.com/acme/widgets",
            "a.txt",
            "abc123",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::File {
                action: FileAction::LastEdit { .. }
            }
        ));
    }

    #[test]
    fn status_and_logout_conflict() {
        assert!(Cli::try_parse_from(["tl", "auth", "--status", "--logout"]).is_err());
    }
}
