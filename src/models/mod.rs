pub mod friend;
pub mod message;
pub mod status;
pub mod timetable;
pub mod user;

pub use friend::{Friend, FriendRequest, FriendRequests, FriendshipState, RemoteClassStatus, RequestId, UserResult};
pub use message::{Conversation, ConversationId, Message, MessageId};
pub use status::{ClassStatus, resolve_status, resolve_status_with};
pub use timetable::{ClassEntry, ClassForm, DayValue, TIME_SLOTS, TimeSlot, Timetable, TimetableRecord, Weekday};
pub use user::{Profile, ProfileUpdate, QrCode, User, UserId, UserSummary};
