use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Catalog, LoadOptions, MalformedPolicy, TV_MOVIE_GENRE};
use engine::{
    clamp_result_count, BuildConfig, RecommendationEngine, DEFAULT_GENRE_COUNT,
    DEFAULT_SIMILAR_COUNT, DEFAULT_TRENDING_COUNT,
};
use media_client::{MediaLookup, OfflineMedia, TmdbClient};
use server::{MovieCard, MoviePage, MovieService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::warn;

/// movie-recs - content-based movie recommendations from the TMDB 5000 tables
#[derive(Parser)]
#[command(name = "movie-recs")]
#[command(about = "Recommend movies by genre, cast, crew, keyword and plot similarity", long_about = None)]
struct Cli {
    /// Path to tmdb_5000_movies.csv
    #[arg(long, default_value = "data/tmdb_5000_movies.csv", global = true)]
    movies: PathBuf,

    /// Path to tmdb_5000_credits.csv
    #[arg(long, default_value = "data/tmdb_5000_credits.csv", global = true)]
    credits: PathBuf,

    /// Skip rows with malformed JSON fields instead of failing the load
    #[arg(long, global = true)]
    skip_malformed: bool,

    /// Genre to leave out of the catalog (repeatable, defaults to "TV Movie")
    #[arg(long = "exclude-genre", global = true)]
    exclude_genres: Vec<String>,

    /// TMDB API key for posters and trailers
    #[arg(long, env = "TMDB_API_KEY", global = true, hide_env_values = true)]
    tmdb_api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Movies similar to a title
    Recommend {
        /// Exact catalog title
        title: String,

        /// Number of recommendations (negative counts return nothing)
        #[arg(long, default_value_t = DEFAULT_SIMILAR_COUNT as i64, allow_negative_numbers = true)]
        limit: i64,

        /// Print the similarity score of each result
        #[arg(long)]
        scores: bool,
    },

    /// Most popular movies
    Trending {
        #[arg(long, default_value_t = DEFAULT_TRENDING_COUNT as i64, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Movies of one genre, in catalog order
    Genre {
        /// Exact genre name, e.g. "Science Fiction"
        genre: String,

        #[arg(long, default_value_t = DEFAULT_GENRE_COUNT as i64, allow_negative_numbers = true)]
        limit: i64,
    },

    /// List every genre in the catalog
    Genres,

    /// Search for movies by title
    Search {
        /// Case-insensitive substring of the title
        title: String,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show one movie with poster, trailer and reviews
    Show {
        /// Exact catalog title
        title: String,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run concurrent similar-title queries and report latencies
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let service = load_service(&cli).await?;

    match cli.command {
        Commands::Recommend {
            title,
            limit,
            scores,
        } => handle_recommend(&service, &title, clamp_result_count(limit), scores).await?,
        Commands::Trending { limit } => {
            let cards = service.trending(clamp_result_count(limit)).await;
            print_cards("Trending now", &cards, false);
        }
        Commands::Genre { genre, limit } => handle_genre(&service, &genre, clamp_result_count(limit)).await,
        Commands::Genres => {
            for genre in service.genres() {
                println!("{} {}", "•".green(), genre);
            }
        }
        Commands::Search { title, limit } => handle_search(&service, &title, limit),
        Commands::Show { title, json } => handle_show(&service, &title, json).await?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(service, requests, concurrent).await?,
    }

    Ok(())
}

/// Load both tables, build the engine and wire up media lookup
async fn load_service(cli: &Cli) -> Result<MovieService> {
    let excluded = if cli.exclude_genres.is_empty() {
        vec![TV_MOVIE_GENRE.to_string()]
    } else {
        cli.exclude_genres.clone()
    };
    let policy = if cli.skip_malformed {
        MalformedPolicy::Skip
    } else {
        MalformedPolicy::Abort
    };
    let options = LoadOptions::new()
        .with_malformed_policy(policy)
        .with_excluded_genres(excluded.clone());
    let config = BuildConfig::new().with_excluded_genres(excluded);

    println!(
        "Loading {} and {}...",
        cli.movies.display(),
        cli.credits.display()
    );
    let start = Instant::now();
    let (movies, credits) = (cli.movies.clone(), cli.credits.clone());
    let engine = tokio::task::spawn_blocking(move || -> Result<RecommendationEngine> {
        let catalog = Catalog::load_from_files(&movies, &credits, &options)
            .context("Failed to load the TMDB tables")?;
        print_load_report(&catalog);
        RecommendationEngine::build(catalog.into_movies(), config)
            .context("Failed to build the recommendation engine")
    })
    .await??;
    println!(
        "{} Built index of {} movies in {:?}",
        "✓".green(),
        engine.snapshot().len(),
        start.elapsed()
    );

    let media: Arc<dyn MediaLookup> = match &cli.tmdb_api_key {
        Some(key) => Arc::new(TmdbClient::new(key.clone())?),
        None => Arc::new(OfflineMedia),
    };
    Ok(MovieService::new(Arc::new(engine), media))
}

fn print_load_report(catalog: &Catalog) {
    let report = catalog.report();
    println!(
        "{} {} movie rows: {} kept, {} excluded by genre, {} without credits, {} malformed, {} duplicate",
        "•".cyan(),
        report.movie_rows,
        catalog.len(),
        report.excluded,
        report.unmatched,
        report.skipped.len(),
        report.duplicates.len()
    );
    if !report.skipped.is_empty() {
        warn!("Skipped malformed movie ids: {:?}", report.skipped);
    }
    if !report.duplicates.is_empty() {
        warn!("Skipped repeated movie ids: {:?}", report.duplicates);
    }
}

/// Handle the 'recommend' command
async fn handle_recommend(service: &MovieService, title: &str, limit: usize, scores: bool) -> Result<()> {
    let cards = service
        .recommend(title, limit)
        .await
        .with_context(|| format!("No recommendations for {title:?}"))?;
    print_cards(&format!("Because you liked {title}"), &cards, scores);
    Ok(())
}

/// Handle the 'genre' command
async fn handle_genre(service: &MovieService, genre: &str, limit: usize) {
    let cards = service.by_genre(genre, limit).await;
    if cards.is_empty() {
        println!("No movies in genre {:?}. Try `movie-recs genres`.", genre);
        return;
    }
    print_cards(genre, &cards, false);
}

/// Handle the 'search' command
fn handle_search(service: &MovieService, title: &str, limit: usize) {
    let snapshot = service.engine().snapshot();
    let matches = snapshot.search_titles(title, limit);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  (none)");
    }
    for movie in matches {
        println!(
            "{}: {} ({}) [{}] rated {:.1} ({} votes)",
            movie.id,
            movie.title,
            year_label(movie.release_year()),
            movie.genres.join(", "),
            movie.vote_average,
            movie.vote_count
        );
    }
}

/// Handle the 'show' command
async fn handle_show(service: &MovieService, title: &str, json: bool) -> Result<()> {
    let movie_id = service
        .engine()
        .snapshot()
        .find_by_title(title)
        .map(|movie| movie.id)
        .ok_or_else(|| anyhow!("Movie {:?} is not in the catalog", title))?;
    let page = service.details(movie_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print_page(&page);
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(service: MovieService, requests: usize, concurrent: usize) -> Result<()> {
    let titles = service.titles();
    if titles.is_empty() || requests == 0 {
        return Err(anyhow!("Benchmark needs a non-empty catalog and at least one request"));
    }

    let limiter = Arc::new(Semaphore::new(concurrent.max(1)));
    let started = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for _ in 0..requests {
        let title = titles[rand::random::<u32>() as usize % titles.len()].clone();
        let service = service.clone();
        let limiter = Arc::clone(&limiter);
        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire_owned().await?;
            let start = Instant::now();
            service.recommend(&title, DEFAULT_SIMILAR_COUNT).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = started.elapsed();

    timings.sort();
    let total: Duration = timings.iter().sum();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", total / timings.len() as u32);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        requests as f64 / wall_time.as_secs_f64()
    );
    Ok(())
}

fn year_label(year: Option<u16>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "????".to_string())
}

fn print_cards(header: &str, cards: &[MovieCard], scores: bool) {
    println!("{}", format!("{header}:").bold().blue());
    if cards.is_empty() {
        println!("  (none)");
    }
    for (i, card) in cards.iter().enumerate() {
        let movie = &card.movie;
        let mut line = format!(
            "{}. {} ({}) [{}]",
            (i + 1).to_string().green(),
            movie.title,
            year_label(movie.release_year()),
            movie.genres.join(", ")
        );
        if scores {
            if let Some(score) = card.score {
                line.push_str(&format!(" - similarity {:.3}", score));
            }
        }
        println!("{line}");
        if let Some(poster) = &card.poster_url {
            println!("   {}", poster.dimmed());
        }
    }
}

fn print_page(page: &MoviePage) {
    let movie = &page.movie;
    println!(
        "{}",
        format!("{} ({})", movie.title, year_label(movie.release_year()))
            .bold()
            .blue()
    );
    println!("{}Genres: {}", "• ".green(), movie.genres.join(", "));
    println!("{}Directed by: {}", "• ".green(), movie.directors.join(", "));
    println!("{}Cast: {}", "• ".green(), movie.cast.join(", "));
    println!(
        "{}Rated {:.1} from {} votes, popularity {:.1}",
        "• ".cyan(),
        movie.vote_average,
        movie.vote_count,
        movie.popularity
    );
    if !movie.overview.is_empty() {
        println!("\n{}\n", movie.overview);
    }
    if let Some(poster) = &page.poster_url {
        println!("Poster: {}", poster);
    }
    if let Some(trailer) = &page.trailer_url {
        println!("Trailer: {}", trailer);
    }
    match page.average_rating {
        Some(avg) => println!("Reviews: {} (average {:.1}/10)", page.reviews.len(), avg),
        None => println!("Reviews: none yet"),
    }
}
