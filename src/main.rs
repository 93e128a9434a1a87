use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use riggs_feed::{add_item, AddItemReport, Config, NewItem};

/// Add an item to an RSS feed file.
///
/// The item is skipped if the feed already holds an item with the same
/// identifier (explicit GUID, else the link without tracking parameters,
/// else the title).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Item title.
    title: String,

    /// Item link; may be empty.
    link: String,

    /// Item description.
    description: String,

    /// Explicit item identifier.
    guid: Option<String>,

    /// Configuration file; built-in defaults are used if it does not exist.
    #[arg(long, default_value = "riggs-feed.toml")]
    config: PathBuf,

    /// Feed file to update; defaults to `feed.xml` beside the tool.
    #[arg(long)]
    feed: Option<PathBuf>,

    /// Maximum number of items kept in the feed.
    #[arg(long)]
    max_items: Option<usize>,

    /// Publication date (RFC 2822); defaults to now.
    #[arg(long)]
    pub_date: Option<String>,
}

fn load_config(args: &Args) -> riggs_feed::Result<Config> {
    let mut config = Config::load_or_default(&args.config)?;
    if let Some(feed) = &args.feed {
        config.feed.path = Some(feed.to_string_lossy().into_owned());
    }
    if let Some(max_items) = args.max_items {
        config.feed.max_items = max_items;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args, config: &Config) -> riggs_feed::Result<AddItemReport> {
    let mut item = NewItem::new(args.title, args.link, args.description);
    if let Some(guid) = args.guid {
        item = item.with_guid(guid);
    }
    if let Some(pub_date) = args.pub_date {
        item = item.with_pub_date(pub_date);
    }

    add_item(
        &config.feed.resolve_path()?,
        &item,
        &config.feed,
        &config.channel,
    )
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = riggs_feed::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        riggs_feed::logging::init_console_only(&config.logging.level);
    }

    match run(args, &config) {
        Ok(report) => {
            info!(
                guid = %report.outcome.guid(),
                inserted = report.outcome.is_inserted(),
                items = report.item_count,
                "feed written"
            );
            println!("Updated {}", report.path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
