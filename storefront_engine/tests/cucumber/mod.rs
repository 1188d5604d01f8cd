mod steps;
mod world;

pub use world::{StorefrontSystem, StorefrontWorld};
