//src/model/mod.rs
pub mod elements;
pub mod structure;
pub mod symmetry;

// Re-exports for cleaner imports
pub use elements::{element_data, normalize_symbol};
pub use structure::{Lattice, Site, Structure};
pub use symmetry::{MoyoReducer, SymmetryReducer};
