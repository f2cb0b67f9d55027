pub mod movielens;

pub use movielens::{load_movielens_100k, Dataset};
