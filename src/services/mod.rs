pub mod config_loader;
pub mod feed_parser;
pub mod grid_flow;
pub mod row_comparator;
pub mod selection;
pub mod sort_engine;
pub mod value_classifier;
pub mod visibility_filter;
