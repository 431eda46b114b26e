pub mod activity;
pub mod anime;
pub mod tracking;
