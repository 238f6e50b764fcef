//! Statistics reporting.

use console::style;

use crate::api::PoolHealth;
use crate::download::batch::BatchSummary;
use crate::download::{GlobalState, SyncState};

/// Print statistics for a single target.
pub fn print_target_stats(state: &SyncState) {
    println!();
    println!(
        "{}",
        style(format!("Statistics for {}:", state.label())).bold()
    );
    println!("  Photos:   {}", state.photo_count);
    println!("  Videos:   {}", state.video_count);
    if state.upgrade_count > 0 {
        println!("  Upgraded: {} (standard replaced by HD)", state.upgrade_count);
    }
    println!("  Skipped:  {} (already synced)", state.total_skipped());
    if state.error_count > 0 {
        println!("  Errors:   {}", style(state.error_count).red());
    }
    println!("  Total:    {} downloaded", state.total_saved());
}

/// Print global statistics across all targets.
pub fn print_global_stats(state: &GlobalState) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Global Statistics:").bold());
    println!("  Targets processed: {}", state.targets_processed);
    if state.targets_failed > 0 {
        println!(
            "  Targets failed:    {}",
            style(state.targets_failed).red()
        );
    }
    println!("  Photos:   {}", state.photo_count);
    println!("  Videos:   {}", state.video_count);
    if state.upgrade_count > 0 {
        println!("  Upgraded: {}", state.upgrade_count);
    }
    println!("  Skipped:  {} (already synced)", state.skip_count);
    if state.error_count > 0 {
        println!("  Errors:   {}", style(state.error_count).red());
    }
    println!("  Total:    {} downloaded", state.total_saved());
    println!("{}", style("═".repeat(50)).dim());
}

/// Print the per-target outcome table for a finished batch.
pub fn print_batch_summary(summary: &BatchSummary) {
    if summary.cancelled {
        println!();
        println!("{}", style("Run cancelled, partial results:").yellow().bold());
    }

    for outcome in &summary.outcomes {
        match &outcome.failed {
            Some(reason) => println!(
                "  {} {} ({} saved before failure): {}",
                style("FAILED").red().bold(),
                outcome.target,
                outcome.saved,
                reason
            ),
            None => println!(
                "  {} {}: {} saved, {} skipped{}",
                style("DONE").green().bold(),
                outcome.target,
                outcome.saved,
                outcome.skipped,
                if outcome.errors > 0 {
                    format!(", {} errors", outcome.errors)
                } else {
                    String::new()
                }
            ),
        }
    }
}

/// Print the result of a proxy pool health check.
pub fn print_pool_health(health: &PoolHealth) {
    println!();
    println!("{}", style("Proxy health check:").bold());

    for result in &health.results {
        match &result.outcome {
            Ok(latency) => println!(
                "  {} {} ({} ms)",
                style("UP").green().bold(),
                result.spec,
                latency.as_millis()
            ),
            Err(reason) => println!(
                "  {} {} ({})",
                style("DEAD").red().bold(),
                result.spec,
                reason
            ),
        }
    }

    println!(
        "  {} healthy, {} dead",
        health.healthy_count(),
        health.dead_count()
    );
}
