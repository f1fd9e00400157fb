pub mod catalog;
pub mod interaction;
pub mod movie;

pub use catalog::{CatalogMovie, CatalogPage, CatalogVideo, Genre, GenreList, VideoList};
pub use interaction::{Interaction, InteractionFilter, InteractionKind, NewInteraction};
pub use movie::{Movie, MovieFilter, MovieSortField, NewMovie};
