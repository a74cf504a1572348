mod ask;
mod chat;
mod ingest;
mod status;

pub use ask::handle_ask;
pub use chat::handle_chat;
pub use ingest::handle_ingest;
pub use status::handle_status;
