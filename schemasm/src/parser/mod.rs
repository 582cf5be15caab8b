pub mod netlist;

// Re-export for convenience
pub use netlist::{parse_netlist, NetEntry, NetlistParser, PinSignalMap};
