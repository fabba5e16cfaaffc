//! Status command.

use todofeed_server::FeedStore;

use crate::config::CliConfig;
use crate::error::CliResult;

/// Prints the last sync report and the stored feeds.
pub fn run(config: &CliConfig) -> CliResult<()> {
    let store = FeedStore::open(config.server_config()?.store_dir)?;

    match store.last_sync_report()? {
        Some(report) => {
            println!("last sync: {}", report.last_sync.to_rfc3339());
            for outcome in &report.results {
                if outcome.succeeded() {
                    println!(
                        "  {}: ok ({} events)",
                        outcome.calendar_name,
                        outcome.count.unwrap_or(0)
                    );
                } else {
                    println!(
                        "  {}: failed ({})",
                        outcome.calendar_name,
                        outcome.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }
        None => println!("no sync has run yet"),
    }

    let feeds = store.list_feeds()?;
    if feeds.is_empty() {
        println!("no feeds stored in {}", store.root().display());
        return Ok(());
    }

    println!("feeds in {}:", store.root().display());
    for filename in feeds {
        match store.metadata(&filename)? {
            Some(meta) => println!(
                "  {} ({} bytes, updated {})",
                filename,
                meta.size,
                meta.last_updated.to_rfc3339()
            ),
            None => println!("  {}", filename),
        }
    }
    Ok(())
}
