pub mod connection;
pub mod hash;
pub mod optimization_bailout;
pub mod raw_idx;
pub mod used_exports;
