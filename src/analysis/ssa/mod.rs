//! SSA construction support for the circuit builder.

mod phi;

pub use phi::{collect_def_sites, insert_phis};
