pub mod check;
pub mod plan;
pub mod report;
pub mod setup;
pub mod ui;
