//! cli
//!
//! Command-line harness for the adapter.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to the library modules
//! - Does NOT perform repository mutations directly
//!
//! The harness stands in for the embedding host: it opens one
//! [`RepositoryContext`] per invocation and wires the terminal
//! collaborators into the library calls.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

use crate::context::RepositoryContext;
use crate::core::config::{AuthorConfig, Config};
use crate::history;
use crate::host::{ConflictPresenter as _, SignatureResolver};
use crate::integrate::{self, IntegrationOp, IntegrationResult, ResetMode};
use crate::remote::{PullStrategy, RemoteOutcome, RemoteSession};
use crate::stage::{IndexTransaction, StageAction};
use crate::status::{self, HostCommand, Scope};
use crate::ui::output::{self, Verbosity};
use crate::ui::progress::{
    TerminalCertificates, TerminalConflicts, TerminalCredentials, TerminalProgress,
    TerminalSignatures,
};

/// Sccbridge - drive a Git repository through a legacy host's vocabulary
#[derive(Parser, Debug)]
#[command(name = "sccb")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Run as if sccb was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Shells supported by the completions command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Populate filter, mirroring the host batch commands.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PopulateFor {
    Checkout,
    Checkin,
    Add,
    Remove,
    Diff,
    History,
}

impl From<PopulateFor> for HostCommand {
    fn from(value: PopulateFor) -> Self {
        match value {
            PopulateFor::Checkout => HostCommand::Checkout,
            PopulateFor::Checkin => HostCommand::Checkin,
            PopulateFor::Add => HostCommand::Add,
            PopulateFor::Remove => HostCommand::Remove,
            PopulateFor::Diff => HostCommand::Diff,
            PopulateFor::History => HostCommand::History,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show host status flags for files
    Status {
        /// Absolute or relative paths to query
        paths: Vec<String>,
        /// Enumerate directories instead of answering exact paths
        #[arg(long)]
        dir: bool,
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Enumerate the files a host batch command applies to
    Populate {
        /// Paths (files or directories) to enumerate
        paths: Vec<String>,
        /// The host command the enumeration feeds
        #[arg(long, value_enum, default_value = "checkin")]
        command: PopulateFor,
    },

    /// Stage files for the next commit
    Stage {
        /// Paths to stage
        paths: Vec<String>,
        /// Stage removals instead of additions
        #[arg(long)]
        remove: bool,
    },

    /// Commit the staged state
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Merge a revision into HEAD
    Merge {
        /// Revision to merge
        rev: String,
        /// Fail instead of creating a merge commit
        #[arg(long)]
        ff_only: bool,
    },

    /// Apply one commit's changes onto HEAD
    CherryPick {
        /// Revision to apply
        rev: String,
    },

    /// Reverse-apply one commit's changes onto HEAD
    Revert {
        /// Revision to reverse-apply
        rev: String,
    },

    /// Move HEAD to a revision
    Reset {
        /// Target revision
        rev: String,
        /// Discard working-tree changes
        #[arg(long)]
        hard: bool,
    },

    /// Show the commits that changed a file
    History {
        /// File to inspect
        path: String,
        /// Maximum number of entries
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show a file's changes against HEAD
    Diff {
        /// File to diff
        path: String,
    },

    /// Push a branch to a remote
    Push {
        /// Remote name (config default when omitted)
        #[arg(long)]
        remote: Option<String>,
        /// Branch to push (current branch when omitted)
        #[arg(long)]
        branch: Option<String>,
    },

    /// Fetch from a remote, optionally integrating into HEAD
    Pull {
        /// Remote name (config default when omitted)
        #[arg(long)]
        remote: Option<String>,
        /// Fetch without touching the working tree
        #[arg(long)]
        fetch_only: bool,
    },

    /// Clone a repository
    Clone {
        /// Source URL or path
        url: String,
        /// Destination directory
        destination: PathBuf,
        /// Branch for the initial checkout
        #[arg(long)]
        branch: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    if let Command::Completions { shell } = cli.command {
        generate_completions(shell);
        return Ok(());
    }

    if let Command::Clone {
        url,
        destination,
        branch,
    } = &cli.command
    {
        let progress = TerminalProgress::new(verbosity);
        let session = RemoteSession::new(
            &progress,
            Some(&TerminalCredentials),
            Some(&TerminalCertificates),
        );
        let outcome = session.clone(url, destination, branch.as_deref())?;
        report_outcome(outcome, verbosity);
        return Ok(());
    }

    let cwd = match &cli.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to resolve working directory")?,
    };
    let ctx = RepositoryContext::open(&cwd)?;
    let config = Config::load(Some(ctx.git_dir()))?;

    dispatch(cli.command, &ctx, &config, verbosity)
}

fn dispatch(
    command: Command,
    ctx: &RepositoryContext,
    config: &Config,
    verbosity: Verbosity,
) -> Result<()> {
    match command {
        Command::Status { paths, dir, json } => {
            let scope = if dir { Scope::Directory } else { Scope::File };
            let paths = absolutize(ctx, paths);
            let entries = status::status_of(ctx, &paths, scope)?;
            if json {
                let rows: Vec<_> = entries
                    .iter()
                    .map(|e| serde_json::json!({ "path": &e.path, "status": e.status }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for entry in &entries {
                    output::print(format!("{}  {}", entry.status, entry.path), verbosity);
                    if let Some(error) = &entry.error {
                        output::error(format!("{}: {}", entry.path, error));
                    }
                }
            }
        }

        Command::Populate { paths, command } => {
            let paths = absolutize(ctx, paths);
            let entries = status::populate(ctx, &paths, command.into())?;
            for entry in &entries {
                output::print(format!("{}  {}", entry.status, entry.path), verbosity);
            }
        }

        Command::Stage { paths, remove } => {
            let action = if remove {
                StageAction::Remove
            } else {
                StageAction::Add
            };
            let paths = absolutize(ctx, paths);
            let mut txn = IndexTransaction::begin(ctx)?;
            let outcomes = txn.stage(&paths, action)?;
            for outcome in &outcomes {
                match &outcome.result {
                    // Per-path failures are recorded, not fatal; the rest
                    // of the batch still went through.
                    Ok(()) => output::print(format!("staged  {}", outcome.path), verbosity),
                    Err(e) => output::warn(format!("{}: {}", outcome.path, e), verbosity),
                }
            }
        }

        Command::Commit { message } => {
            let mut txn = IndexTransaction::begin(ctx)?;
            let resolver = ConfiguredSignature {
                author: config.author.as_ref(),
            };
            let oid = txn.commit_staged(&message, &resolver, None)?;
            output::print(format!("committed {}", oid), verbosity);
        }

        Command::Merge { rev, ff_only } => {
            let theirs = resolve(ctx, &rev)?;
            let ff_only = ff_only || config.fastforward_only();
            let result = integrate::integrate(ctx, IntegrationOp::Merge {
                theirs,
                fastforward_only: ff_only,
            })?;
            report_integration(result, verbosity);
        }

        Command::CherryPick { rev } => {
            let commit = resolve(ctx, &rev)?;
            let result = integrate::integrate(ctx, IntegrationOp::CherryPick { commit })?;
            report_integration(result, verbosity);
        }

        Command::Revert { rev } => {
            let commit = resolve(ctx, &rev)?;
            let result = integrate::integrate(ctx, IntegrationOp::Revert { commit })?;
            report_integration(result, verbosity);
        }

        Command::Reset { rev, hard } => {
            let target = resolve(ctx, &rev)?;
            let mode = if hard { ResetMode::Hard } else { ResetMode::Soft };
            let result = integrate::integrate(ctx, IntegrationOp::Reset { target, mode })?;
            report_integration(result, verbosity);
        }

        Command::History { path, limit } => {
            let abs = absolutize_one(ctx, &path);
            for entry in history::file_log(ctx, &abs, limit)? {
                output::print(
                    format!(
                        "{}  {}  {} <{}>  {}",
                        &entry.oid.to_string()[..7],
                        entry.author_time.format("%Y-%m-%d"),
                        entry.author_name,
                        entry.author_email,
                        entry.summary
                    ),
                    verbosity,
                );
            }
        }

        Command::Diff { path } => {
            let abs = absolutize_one(ctx, &path);
            print!("{}", history::diff_to_head(ctx, &abs)?);
        }

        Command::Push { remote, branch } => {
            let remote = remote.unwrap_or_else(|| config.remote().to_string());
            let branch = match branch {
                Some(b) => b,
                None => current_branch(ctx)?,
            };
            let progress = TerminalProgress::new(verbosity);
            let session = RemoteSession::new(
                &progress,
                Some(&TerminalCredentials),
                Some(&TerminalCertificates),
            );
            let outcome = session.push(ctx, &remote, &branch)?;
            report_outcome(outcome, verbosity);
        }

        Command::Pull { remote, fetch_only } => {
            let remote = remote.unwrap_or_else(|| config.remote().to_string());
            let strategy = if fetch_only {
                PullStrategy::FetchOnly
            } else {
                PullStrategy::FetchAndMergeToHead
            };
            let progress = TerminalProgress::new(verbosity);
            let session = RemoteSession::new(
                &progress,
                Some(&TerminalCredentials),
                Some(&TerminalCertificates),
            );
            let outcome = session.pull(ctx, &remote, strategy, config.fastforward_only())?;
            report_outcome(outcome, verbosity);
        }

        Command::Clone { .. } | Command::Completions { .. } => {
            // Handled before a context is opened.
            unreachable!("dispatched without a repository context")
        }
    }

    Ok(())
}

/// Identity resolution for commits: the configured fallback author wins
/// over the terminal prompt.
struct ConfiguredSignature<'a> {
    author: Option<&'a AuthorConfig>,
}

impl SignatureResolver for ConfiguredSignature<'_> {
    fn resolve_or_prompt(&self) -> Option<(String, String)> {
        match self.author {
            Some(author) => Some((author.name.clone(), author.email.clone())),
            None => TerminalSignatures.resolve_or_prompt(),
        }
    }
}

/// Turn host-relative CLI paths into the absolute form the library wants.
fn absolutize(ctx: &RepositoryContext, paths: Vec<String>) -> Vec<String> {
    paths.iter().map(|p| absolutize_one(ctx, p)).collect()
}

fn absolutize_one(ctx: &RepositoryContext, path: &str) -> String {
    let normalized = crate::core::paths::normalize_separators(path);
    if std::path::Path::new(&normalized).is_absolute() {
        path.to_string()
    } else {
        ctx.absolute(path)
    }
}

/// Resolve a revision spec to a commit id.
fn resolve(ctx: &RepositoryContext, rev: &str) -> Result<git2::Oid> {
    let object = ctx
        .repo()
        .revparse_single(rev)
        .with_context(|| format!("cannot resolve revision '{rev}'"))?;
    Ok(object.id())
}

/// Name of the branch HEAD points at.
fn current_branch(ctx: &RepositoryContext) -> Result<String> {
    let head = ctx.repo().head().context("cannot resolve HEAD")?;
    head.shorthand()
        .map(str::to_string)
        .context("HEAD is not a named branch")
}

fn report_integration(result: IntegrationResult, verbosity: Verbosity) {
    match result {
        IntegrationResult::FastForwarded(oid) => {
            output::print(format!("fast-forwarded to {}", oid), verbosity)
        }
        IntegrationResult::Merged(oid) => output::print(
            format!("merged {} (commit to conclude)", oid),
            verbosity,
        ),
        IntegrationResult::MergedWithConflicts(conflicts) => {
            TerminalConflicts.present(&conflicts);
        }
        IntegrationResult::CherryPicked(oid) => output::print(
            format!("cherry-picked {} (commit to conclude)", oid),
            verbosity,
        ),
        IntegrationResult::Reverted(oid) => output::print(
            format!("reverted {} (commit to conclude)", oid),
            verbosity,
        ),
        IntegrationResult::ResetTo(oid, mode) => {
            output::print(format!("reset ({:?}) to {}", mode, oid), verbosity)
        }
    }
}

fn report_outcome(outcome: RemoteOutcome, verbosity: Verbosity) {
    match outcome {
        RemoteOutcome::Completed => output::print("done", verbosity),
        RemoteOutcome::Integrated(result) => report_integration(result, verbosity),
        RemoteOutcome::Cancelled => output::print("cancelled", verbosity),
    }
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
    };
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
