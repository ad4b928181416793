//! Service layer for the movie recommendation engine.
//!
//! `MovieService` is what a front end talks to: it queries the engine,
//! decorates results with posters and trailers from a `MediaLookup`, and
//! keeps user reviews in a `ReviewStore` next to (never inside) the
//! recommendation snapshot.

pub mod error;
pub mod reviews;
pub mod service;

pub use error::{Result, ServiceError};
pub use reviews::{Review, ReviewStore, MAX_RATING};
pub use service::{MovieCard, MoviePage, MovieService};
