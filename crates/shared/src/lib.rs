pub mod endpoints;
pub mod error;
pub mod filter;
pub mod gesture;
pub mod layers;
pub mod mercator;
pub mod models;
pub mod popup;
pub mod sequence;
pub mod stats;
pub mod tiles;
