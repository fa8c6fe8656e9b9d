pub mod bonding;
pub mod cell;
pub mod neighbors;
pub mod orientation;

pub use bonding::{generate_bonds, Bond, BondMethod, BondingOptions};
pub use cell::{prepare_structure, CellMode, CellSettings};
pub use orientation::{rotation_from_orientation, Orientation};
