pub mod breadcrumbs;
pub mod help;
pub mod listing;
pub mod status_bar;
