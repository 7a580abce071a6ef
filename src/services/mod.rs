pub mod auth;
pub mod friends;
pub mod messaging;
pub mod profile;
pub mod qr;
pub mod status_ticker;
pub mod timetable_store;

pub use auth::{Auth, RegisterForm};
pub use friends::{FriendDirectory, StatusSummary};
pub use messaging::Inbox;
pub use profile::ProfileView;
pub use qr::{ParseError, QrInvite, build_share_url, parse_share_url};
pub use status_ticker::{Clock, StatusTicker, local_clock};
pub use timetable_store::{SaveReport, TimetableStore};
