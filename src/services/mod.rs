// Stateless helpers used by the handlers and exported for direct use

pub mod content_sniffer;
pub mod file_storage;
pub mod push_client;
pub mod random;
pub mod slug;
