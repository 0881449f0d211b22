mod hub;

pub use hub::{FeedHub, ItemStats, ItemUpdate};
