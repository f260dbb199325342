//! Messaging platform glue: inbound event types, attachment download, channel upload.

pub mod events;
pub mod fetch;
pub mod upload;

pub use events::{FileDescriptor, InboundEvent, MessageEvent};
pub use fetch::AttachmentFetcher;
pub use upload::{ChannelUploader, SlackUploader, UploadedFile};
