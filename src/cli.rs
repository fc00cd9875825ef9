use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "flexzip")]
#[command(version)]
#[command(about = "Validate and fingerprint Bruker flexControl sample archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  flexzip run.zip                 validate every sample in run.zip\n  \
  flexzip -l run.zip              list sample directories only\n  \
  flexzip -d store run.zip        export valid samples as store/<digest>.zip\n  \
  flexzip --json run.zip > out    write one JSON record per valid sample")]
pub struct Cli {
    /// ZIP archive exported by flexControl
    #[arg(value_name = "FILE")]
    pub file: String,

    /// List samples without validating them
    #[arg(short = 'l')]
    pub list: bool,

    /// Print every metadata field of valid samples
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Print one JSON record per valid sample
    #[arg(long)]
    pub json: bool,

    /// Export valid samples into DIR, named by digest
    #[arg(short = 'd', value_name = "DIR")]
    pub export_dir: Option<String>,

    /// Never overwrite existing exports
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite existing exports WITHOUT prompting
    #[arg(short = 'o', conflicts_with = "never_overwrite")]
    pub overwrite: bool,

    /// Report at most N invalid samples individually
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub max_errors: usize,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.json
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.quiet > 0 { "error" } else { "warn" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["flexzip", "-d", "store", "-o", "--max-errors", "3", "run.zip"]);
        assert_eq!(cli.file, "run.zip");
        assert_eq!(cli.export_dir.as_deref(), Some("store"));
        assert!(cli.overwrite);
        assert_eq!(cli.max_errors, 3);
        assert!(!cli.is_quiet());
    }

    #[test]
    fn test_json_implies_quiet() {
        let cli = Cli::parse_from(["flexzip", "--json", "run.zip"]);
        assert!(cli.is_quiet());
        assert_eq!(cli.max_errors, 10);
    }

    #[test]
    fn test_overwrite_flags_conflict() {
        assert!(Cli::try_parse_from(["flexzip", "-n", "-o", "run.zip"]).is_err());
    }
}
