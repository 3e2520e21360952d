//! Command-line interface definitions.
//!
//! Every option has a default, so a bare invocation from the site root
//! refreshes `src/components/WritingSection.astro` with the built-in sources.

use crate::config::Transport;
use clap::Parser;

/// Refresh the latest-posts section of the site from Substack.
///
/// # Examples
///
/// ```sh
/// # Standard scheduled run from the repository root
/// latest_writing
///
/// # Use the JSON archive endpoint and print the result instead of writing
/// latest_writing --transport archive --dry-run
///
/// # Custom sources and retry settings
/// latest_writing -c writing.yaml -t site/src/components/WritingSection.astro
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// File containing the generated post arrays
    #[arg(short, long, env = "WRITING_TARGET", default_value = "src/components/WritingSection.astro")]
    pub target: String,

    /// Optional path to a YAML settings file
    #[arg(short, long, env = "WRITING_CONFIG")]
    pub config: Option<String>,

    /// Override the endpoint used for every source
    #[arg(long, value_enum)]
    pub transport: Option<Transport>,

    /// Fetch and render, but print the result instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["latest_writing"]);
        assert_eq!(cli.target, "src/components/WritingSection.astro");
        assert!(cli.config.is_none());
        assert!(cli.transport.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "latest_writing",
            "-t",
            "/tmp/WritingSection.astro",
            "-c",
            "/tmp/writing.yaml",
        ]);

        assert_eq!(cli.target, "/tmp/WritingSection.astro");
        assert_eq!(cli.config.as_deref(), Some("/tmp/writing.yaml"));
    }

    #[test]
    fn test_cli_transport_and_dry_run() {
        let cli = Cli::parse_from(["latest_writing", "--transport", "archive", "--dry-run"]);
        assert_eq!(cli.transport, Some(Transport::Archive));
        assert!(cli.dry_run);
    }
}
