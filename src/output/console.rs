//! Console output utilities.

use console::style;

use crate::config::Config;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Facebook Downloader                               ║
║     Graph API media synchronization                   ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print the run configuration ahead of the first request.
pub fn print_config_summary(config: &Config, targets: &[String], proxy_count: usize) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Targets:   {}", targets.join(", "));
    println!("  Mode:      {}", config.options.sync_mode);
    println!("  Directory: {}", config.download_directory().display());
    println!(
        "  Quality:   {}",
        if config.options.prefer_hd {
            "prefer HD photos"
        } else {
            "standard renditions"
        }
    );
    if !config.options.resume {
        println!("  Resume:    off for this run");
    }
    if let Some(limit) = config.options.max_pages {
        println!("  Pages:     at most {} per collection", limit);
    }
    if proxy_count > 0 {
        println!("  Proxies:   {}", proxy_count);
    }
    println!();
}
