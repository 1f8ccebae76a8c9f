pub mod indexmap;
pub mod request_shortener;
pub mod xxhash;
