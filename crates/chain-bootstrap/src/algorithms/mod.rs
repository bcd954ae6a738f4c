//! # Algorithms Module
//!
//! Pure functions of the pipeline: document merge, peer topology and
//! address handling.

pub mod address;
pub mod merge;
pub mod topology;

pub use address::{expand_home, expand_home_with, format_peer_address, parse_p2p_port};
pub use merge::{merge, merge_into};
pub use topology::assemble_persistent_peers;
