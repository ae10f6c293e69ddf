pub mod fetch;
pub mod template;
pub mod transport;

pub use fetch::{AttachmentFetcher, AttachmentPayload, ResolvedAttachment};
pub use transport::{Mailer, OutgoingEmail, SendReceipt, SmtpMailer};
