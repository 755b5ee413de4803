use std::path::Path;

use colored::Colorize;

use crate::adapters::aws::profiles::ProfileListing;
use crate::cli::output;
use crate::core::errors::Result;

/// Execute `trailwatch profiles`.
///
/// Lists the profiles from the shared credentials and config files.
pub fn execute() -> Result<()> {
    let listing = ProfileListing::discover();

    output::header("Available AWS Profiles");

    if listing.no_files() {
        output::warning("No AWS credentials or config file found");
        println!("  Run 'aws configure' to create one.");
        return Ok(());
    }

    if let Some(path) = &listing.credentials_path {
        print_section(path, &listing.credentials);
    }
    if let Some(path) = &listing.config_path {
        print_section(path, &listing.config);
    }

    println!("\n  To use a specific profile, pass --profile:");
    println!("  {}", "trailwatch kms --profile your-profile --key your-key-id --last-n 1h".dimmed());
    Ok(())
}

fn print_section(path: &Path, profiles: &[String]) {
    println!("\n  From {}:", path.display());
    if profiles.is_empty() {
        println!("    (none)");
    }
    for profile in profiles {
        println!("    - {}", profile.cyan());
    }
}
