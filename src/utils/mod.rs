pub mod geometry;
pub mod linalg;
pub mod logger;
pub mod report;
