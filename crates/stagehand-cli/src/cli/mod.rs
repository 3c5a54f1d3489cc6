//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "stagehand",
    bin_name = "stagehand",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{1f39b} Declarative feature orchestration for project scaffolding",
    long_about = "Stagehand runs a feature pack against a project: it resolves \
                  feature dependencies, asks only the questions your answers \
                  make relevant, and executes each active feature's stages \
                  (dependency merges, scripts, templates, codemods).",
    after_help = "EXAMPLES:\n\
        \x20 stagehand run  --pack ./pack --project ./my-app\n\
        \x20 stagehand run  --pack ./pack --answers answers.json --continue-on-error\n\
        \x20 stagehand plan --pack ./pack --answers answers.json\n\
        \x20 stagehand list --pack ./pack --format json\n\
        \x20 stagehand completions bash > /usr/share/bash-completion/completions/stagehand",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a feature pack against a project.
    #[command(
        visible_alias = "r",
        about = "Run a feature pack",
        after_help = "EXAMPLES:\n\
            \x20 stagehand run --pack ./pack\n\
            \x20 stagehand run --pack ./pack --project ../my-app --answers answers.json\n\
            \x20 stagehand run --pack ./pack --continue-on-error --timeout 600"
    )]
    Run(RunArgs),

    /// Show what a run would do without touching any file.
    #[command(
        about = "Preview resolution and activation",
        after_help = "EXAMPLES:\n\
            \x20 stagehand plan --pack ./pack\n\
            \x20 stagehand plan --pack ./pack --answers answers.json"
    )]
    Plan(PlanArgs),

    /// List the features a pack declares.
    #[command(
        visible_alias = "ls",
        about = "List pack features",
        after_help = "EXAMPLES:\n\
            \x20 stagehand list --pack ./pack\n\
            \x20 stagehand list --pack ./pack --format json"
    )]
    List(ListArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 stagehand completions bash > ~/.local/share/bash-completion/completions/stagehand\n\
            \x20 stagehand completions zsh  > ~/.zfunc/_stagehand\n\
            \x20 stagehand completions fish > ~/.config/fish/completions/stagehand.fish"
    )]
    Completions(CompletionsArgs),
}

// ── run ───────────────────────────────────────────────────────────────────────

/// Arguments for `stagehand run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Feature pack directory (contains `features/`).
    ///
    /// Falls back to `run.pack` from the config file when omitted.
    #[arg(
        short = 'p',
        long = "pack",
        value_name = "DIR",
        help = "Feature pack directory (default: run.pack from config)"
    )]
    pub pack: Option<PathBuf>,

    /// Project root the pack executes against.
    #[arg(
        long = "project",
        value_name = "DIR",
        default_value = ".",
        help = "Project root (default: current directory)"
    )]
    pub project: PathBuf,

    /// JSON file of pre-supplied answers; skips interactive prompting.
    #[arg(
        short = 'a',
        long = "answers",
        value_name = "FILE",
        help = "Answers file (JSON object of option id to value)"
    )]
    pub answers: Option<PathBuf>,

    /// Record failures and keep going instead of stopping at the first one.
    #[arg(
        long = "continue-on-error",
        help = "Continue with remaining features after a failure"
    )]
    pub continue_on_error: bool,

    /// Per-script timeout in seconds.
    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help = "Per-script timeout in seconds (default: 300)"
    )]
    pub timeout: Option<u64>,
}

// ── plan ──────────────────────────────────────────────────────────────────────

/// Arguments for `stagehand plan`.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Feature pack directory.
    #[arg(short = 'p', long = "pack", value_name = "DIR", help = "Feature pack directory")]
    pub pack: PathBuf,

    /// JSON file of pre-supplied answers.
    #[arg(
        short = 'a',
        long = "answers",
        value_name = "FILE",
        help = "Answers file (JSON object of option id to value)"
    )]
    pub answers: Option<PathBuf>,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `stagehand list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Feature pack directory.
    #[arg(short = 'p', long = "pack", value_name = "DIR", help = "Feature pack directory")]
    pub pack: PathBuf,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One feature id per line.
    List,
    /// JSON array.
    Json,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `stagehand completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_run_command() {
        let cli = Cli::parse_from([
            "stagehand",
            "run",
            "--pack",
            "./pack",
            "--project",
            "../app",
            "--continue-on-error",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.pack, Some(PathBuf::from("./pack")));
        assert_eq!(args.project, PathBuf::from("../app"));
        assert!(args.continue_on_error);
        assert!(args.answers.is_none());
    }

    #[test]
    fn run_project_defaults_to_cwd() {
        let cli = Cli::parse_from(["stagehand", "run", "--pack", "p"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.project, PathBuf::from("."));
    }

    #[test]
    fn parse_plan_with_answers() {
        let cli = Cli::parse_from(["stagehand", "plan", "-p", "pack", "-a", "a.json"]);
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(args.answers, Some(PathBuf::from("a.json")));
    }

    #[test]
    fn list_alias() {
        let cli = Cli::parse_from(["stagehand", "ls", "--pack", "p", "--format", "json"]);
        assert!(matches!(cli.command, Commands::List(_)));
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        // clap should reject --quiet --verbose together
        let result = Cli::try_parse_from(["stagehand", "--quiet", "--verbose", "list", "-p", "x"]);
        assert!(result.is_err());
    }
}
