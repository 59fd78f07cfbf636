//! Command-line interface definitions for listing2rss.
//!
//! This module defines the CLI arguments and options using the `clap` crate.

use clap::Parser;

/// Command-line arguments for the listing2rss application.
///
/// # Examples
///
/// ```sh
/// # Process every site defined in sites.yaml
/// listing2rss -c sites.yaml -o ./feeds
///
/// # Restrict the run to one site, with a visible browser window
/// listing2rss -c sites.yaml -o ./feeds -s example-society --headful
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the site definitions YAML file
    #[arg(short, long, default_value = "sites.yaml")]
    pub config: String,

    /// Output directory for the generated feed XML files
    #[arg(short, long, default_value = "feeds")]
    pub output_dir: String,

    /// Restrict the run to the named site(s); may be repeated
    #[arg(short, long)]
    pub site: Vec<String>,

    /// Run the browser with a visible window instead of headless
    #[arg(long)]
    pub headful: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(&["listing2rss"]);
        assert_eq!(cli.config, "sites.yaml");
        assert_eq!(cli.output_dir, "feeds");
        assert!(cli.site.is_empty());
        assert!(!cli.headful);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(&[
            "listing2rss",
            "-c",
            "/tmp/sites.yaml",
            "-o",
            "/tmp/feeds",
            "-s",
            "one",
            "-s",
            "two",
        ]);

        assert_eq!(cli.config, "/tmp/sites.yaml");
        assert_eq!(cli.output_dir, "/tmp/feeds");
        assert_eq!(cli.site, vec!["one".to_string(), "two".to_string()]);
    }
}
