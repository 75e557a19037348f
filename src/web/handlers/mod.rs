pub mod analyze;
pub mod evaluate;
pub mod export;
pub mod interactions;
pub mod posts;
