pub mod lists;
pub mod logs;
pub mod manual;
pub mod preferences;
pub mod ratings;
