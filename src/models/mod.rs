pub mod email;

pub use email::{
    AttachmentInput, EmailInput, EmailPage, EmailQuery, EmailRecord, EmailStatus, Pagination,
    Recipient, SendFailure, SendOutcome, StoredAttachment,
};
