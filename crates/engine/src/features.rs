//! Feature composition.
//!
//! Each movie is projected into one text document that the vectorizer
//! consumes. Component order is fixed so that two builds over the same
//! catalog see exactly the same token stream.

use data_loader::MovieRecord;
use rayon::prelude::*;

/// Text document derived from one `MovieRecord`
pub type FeatureDocument = String;

/// Compose the document for a single movie.
///
/// Order: genres, cast, directors, keywords, production companies,
/// overview. Empty components still contribute their separator, which
/// the tokenizer ignores.
pub fn compose_document(movie: &MovieRecord) -> FeatureDocument {
    [
        movie.genres.join(" "),
        movie.cast.join(" "),
        movie.directors.join(" "),
        movie.keywords.join(" "),
        movie.production_companies.join(" "),
        movie.overview.clone(),
    ]
    .join(" ")
}

/// Compose documents for the whole catalog, aligned with `movies`
pub fn compose_documents(movies: &[MovieRecord]) -> Vec<FeatureDocument> {
    movies.par_iter().map(compose_document).collect()
}
