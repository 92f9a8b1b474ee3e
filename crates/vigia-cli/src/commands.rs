//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vigia::IgnoreRegion;

/// Vigia: compare screenshots against trusted baselines
#[derive(Parser, Debug)]
#[command(name = "vigia")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only on stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare an actual screenshot against a baseline
    ///
    /// Exit status: 0 when the images match, 1 when they do not, 2 on error.
    Compare(CompareArgs),

    /// Report the pixel backend and perceptual model status
    Probe(ProbeArgs),
}

/// Arguments for the compare command
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Baseline image (PNG or JPEG); its size is authoritative
    pub baseline: PathBuf,

    /// Actual image (PNG or JPEG)
    pub actual: PathBuf,

    /// Diff fraction accepted in the gray zone when no model decides
    #[arg(short, long, default_value_t = 0.05)]
    pub tolerance: f64,

    /// Diff fraction at or under which the images pass outright
    #[arg(long, default_value_t = 0.01)]
    pub low_pass: f64,

    /// Diff fraction over which the images fail outright
    #[arg(long, default_value_t = 0.20)]
    pub high_fail: f64,

    /// Minimum perceptual similarity for a gray-zone match
    #[arg(long, default_value_t = 0.95)]
    pub ai_threshold: f64,

    /// Per-channel delta above which a pixel counts as different
    #[arg(long, default_value_t = vigia::pixel::DEFAULT_COLOR_THRESHOLD)]
    pub color_threshold: u8,

    /// Rectangle to exclude, as x,y,width,height in baseline pixels (repeatable)
    #[arg(long = "ignore", value_name = "X,Y,W,H", value_parser = parse_ignore)]
    pub ignore: Vec<IgnoreRegion>,

    /// Write the annotated diff image (PNG) here
    #[arg(long, value_name = "FILE")]
    pub diff_out: Option<PathBuf>,

    /// Print the full result as JSON instead of the summary line
    #[arg(long)]
    pub json: bool,

    /// Perceptual model selection
    #[command(flatten)]
    pub model: ModelArgs,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,

    /// Perceptual model selection
    #[command(flatten)]
    pub model: ModelArgs,
}

/// Perceptual model selection shared by commands
///
/// Supplying any custom model source skips the embedded model.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Disable the perceptual fallback entirely
    #[arg(long)]
    pub no_ai: bool,

    /// Model artifact on disk (bincode or JSON)
    #[arg(long, value_name = "FILE")]
    pub model_path: Option<PathBuf>,

    /// Model artifact URL (needs the `remote` feature)
    #[arg(long, value_name = "URL")]
    pub model_url: Option<String>,

    /// Model repository id, e.g. acme/screenshot-embedder (needs `remote`)
    #[arg(long, value_name = "ID")]
    pub model_repo: Option<String>,

    /// File within the model repository
    #[arg(long, default_value = "model.bin", requires = "model_repo")]
    pub model_file: String,

    /// Repository revision
    #[arg(long, default_value = "main", requires = "model_repo")]
    pub model_revision: String,

    /// Download timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub download_timeout: u64,
}

impl ModelArgs {
    /// Whether any non-embedded model source was given
    #[must_use]
    pub const fn has_custom_source(&self) -> bool {
        self.model_path.is_some() || self.model_url.is_some() || self.model_repo.is_some()
    }
}

/// Parse `x,y,w,h`
///
/// # Errors
///
/// Returns a message if there are not exactly four unsigned integers
pub fn parse_ignore(s: &str) -> Result<IgnoreRegion, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("expected X,Y,W,H, got '{s}'"));
    };
    let num = |v: &str| {
        v.parse::<u32>()
            .map_err(|e| format!("invalid number '{v}' in '{s}': {e}"))
    };
    Ok(IgnoreRegion::new(num(*x)?, num(*y)?, num(*w)?, num(*h)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ignore() {
        assert_eq!(parse_ignore("1,2,3,4").unwrap(), IgnoreRegion::new(1, 2, 3, 4));
        assert_eq!(
            parse_ignore(" 10, 20 ,30,40 ").unwrap(),
            IgnoreRegion::new(10, 20, 30, 40)
        );
    }

    #[test]
    fn test_parse_ignore_rejects_bad_input() {
        assert!(parse_ignore("1,2,3").is_err());
        assert!(parse_ignore("1,2,3,4,5").is_err());
        assert!(parse_ignore("a,2,3,4").unwrap_err().contains("invalid number"));
        assert!(parse_ignore("-1,2,3,4").is_err());
    }

    #[test]
    fn test_compare_defaults() {
        let cli = Cli::try_parse_from(["vigia", "compare", "a.png", "b.png"]).unwrap();
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.tolerance, 0.05);
        assert_eq!(args.low_pass, 0.01);
        assert_eq!(args.high_fail, 0.20);
        assert_eq!(args.ai_threshold, 0.95);
        assert_eq!(args.color_threshold, 25);
        assert!(args.ignore.is_empty());
        assert!(!args.model.has_custom_source());
    }

    #[test]
    fn test_repeated_ignore() {
        let cli = Cli::try_parse_from([
            "vigia", "compare", "a.png", "b.png", "--ignore", "0,0,5,5", "--ignore", "9,9,1,1",
        ])
        .unwrap();
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.ignore.len(), 2);
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["vigia", "-vv", "probe"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_model_file_requires_repo() {
        assert!(Cli::try_parse_from(["vigia", "probe", "--model-file", "x.bin"]).is_err());
    }
}
