pub mod message_list;

pub use message_list::MessageList;
