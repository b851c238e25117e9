//! whatfilm-rs: browse a movie catalog from the command line.

use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use whatfilm_rs::models::without_duplicates;
use whatfilm_rs::{
    Args, Command, Config, Film, Image, ImagePath, ImageService, MemoryCache, NextPageTrigger,
    PageRequest, PaginationSession, ResourceCache, TieredCache, TmdbClient,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug {
        Level::DEBUG
    } else if args.silent {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let command = args.command.clone();
    let config = Config::from(args);
    if config.api_key.is_none() {
        warn!("No --api-key given, the API will most likely reject requests");
    }

    let client = Arc::new(TmdbClient::new(config.service_configuration())?);

    match command.listing() {
        Some((request, pages)) => list_films(client, request, pages).await,
        None => match command {
            Command::Image {
                path,
                kind,
                size,
                output,
            } => {
                let path = ImagePath::new(&kind, path)
                    .ok_or_else(|| format!("unknown image kind '{}'", kind))?;
                fetch_image(&config, &client, path, size, output).await
            }
            _ => Ok(()),
        },
    }
}

/// Prints up to `pages` pages of a listing, one film per line.
async fn list_films(client: Arc<TmdbClient>, request: PageRequest, pages: usize) -> Result<(), BoxError> {
    let trigger = NextPageTrigger::new();
    let mut session = PaginationSession::<Film, _>::start(client, request, trigger.clone());

    while let Some(emission) = session.next().await {
        let list = emission?;
        let page = list.page_count() - 1;
        let range = list.page_range(page);
        for (offset, film) in without_duplicates(list.items_of_page(page)).into_iter().enumerate() {
            println!("{:>5}  {}", range.start + offset + 1, film.full_title());
        }

        if list.page_count() >= pages || !list.has_more_content() {
            break;
        }
        trigger.fire();
    }

    info!("Done");
    Ok(())
}

async fn fetch_image(
    config: &Config,
    client: &TmdbClient,
    path: ImagePath,
    size: whatfilm_rs::ImageSize,
    output: Option<std::path::PathBuf>,
) -> Result<(), BoxError> {
    let configuration = client.fetch_configuration().await?;
    let budget = config.memory_budget();

    let tiered = match &config.cache_dir {
        Some(dir) if !config.in_memory => match TieredCache::<Image>::open(dir, budget).await {
            Ok(cache) => Some(Arc::new(cache)),
            Err(e) => {
                warn!("Cannot open cache at {}: {}, using memory only", dir.display(), e);
                None
            }
        },
        _ => None,
    };
    let cache: Arc<dyn ResourceCache<Image>> = match &tiered {
        Some(cache) => cache.clone(),
        None => Arc::new(MemoryCache::<Image>::new(budget)),
    };

    let fetcher = Arc::new(client.images(configuration.clone()));
    let service = ImageService::new(configuration, fetcher, cache);
    let cached = service.image(&path, size).await?;

    println!(
        "{} {} {}x{} ({} bytes, {})",
        path.kind(),
        path.path(),
        cached.resource.width(),
        cached.resource.height(),
        cached.resource.data().len(),
        if cached.was_cached { "cached" } else { "downloaded" }
    );

    if let Some(output) = output {
        tokio::fs::write(&output, cached.resource.data()).await?;
        info!("Wrote {}", output.display());
    }
    if let Some(cache) = tiered {
        cache.flush().await;
    }
    Ok(())
}
