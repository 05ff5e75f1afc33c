pub mod errors;
pub mod response;
