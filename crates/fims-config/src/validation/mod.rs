//! Record validation and the messages it produces

mod dataset_validator;
mod messages;
mod record_validator;

pub use dataset_validator::DatasetValidator;
pub use messages::{EntityMessages, Message, MessagesGroup};
pub use record_validator::{RecordValidation, RecordValidator};
