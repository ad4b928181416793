//! Test harness for the movie service.
//!
//! Loads the TMDB tables, builds the engine and prints one page of each
//! query. Set `TMDB_API_KEY` to fetch real posters and trailers.

use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use data_loader::{Catalog, LoadOptions};
use engine::{BuildConfig, RecommendationEngine, DEFAULT_SIMILAR_COUNT, DEFAULT_TRENDING_COUNT};
use media_client::{MediaLookup, OfflineMedia, TmdbClient};
use server::MovieService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,engine=debug")),
        )
        .init();

    info!("Starting movie service test harness");

    let movies = Path::new("data/tmdb_5000_movies.csv");
    let credits = Path::new("data/tmdb_5000_credits.csv");
    let catalog = tokio::task::spawn_blocking(move || {
        Catalog::load_from_files(movies, credits, &LoadOptions::new())
    })
    .await?
    .context("Failed to load the TMDB tables")?;
    info!("Catalog loaded: {} movies", catalog.len());

    let engine = tokio::task::spawn_blocking(move || {
        RecommendationEngine::build(catalog.into_movies(), BuildConfig::new())
    })
    .await?
    .context("Failed to build the recommendation engine")?;

    let media: Arc<dyn MediaLookup> = match env::var("TMDB_API_KEY") {
        Ok(key) => Arc::new(TmdbClient::new(key)?),
        Err(_) => {
            warn!("TMDB_API_KEY not set, posters and trailers disabled");
            Arc::new(OfflineMedia)
        }
    };
    let service = MovieService::new(Arc::new(engine), media);

    let Some(title) = service.titles().into_iter().next() else {
        warn!("Catalog is empty, nothing to show");
        return Ok(());
    };

    info!("Movies similar to {:?}:", title);
    for (i, card) in service
        .recommend(&title, DEFAULT_SIMILAR_COUNT)
        .await?
        .iter()
        .enumerate()
    {
        info!(
            "{}. {} ({}) - similarity {:.3}",
            i + 1,
            card.movie.title,
            card.movie
                .release_year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| "????".to_string()),
            card.score.unwrap_or_default()
        );
        if let Some(poster) = &card.poster_url {
            info!("   {}", poster);
        }
    }

    info!("Trending:");
    for (i, card) in service.trending(DEFAULT_TRENDING_COUNT).await.iter().enumerate() {
        info!("{}. {} (popularity {:.1})", i + 1, card.movie.title, card.movie.popularity);
    }

    Ok(())
}
