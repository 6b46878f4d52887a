pub mod filter_bar;
pub mod map_view;
pub mod popup;
pub mod stats_panel;
