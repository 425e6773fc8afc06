pub mod attendee;
pub mod question;

pub use attendee::{
    AttendeeIdentity, AttendeeRecord, RsvpStatus, SessionKey, TurnInput, UserProfile,
};
pub use question::QuestionRecord;
