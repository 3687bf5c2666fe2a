pub mod api_key;
pub mod chats;
pub mod store;
pub mod usage;
