pub mod salon;
pub mod session;
pub mod style;

pub use salon::{Salon, SalonSettings};
pub use session::{
    ClientSession, IndividualSessionClaims, NewClientSession, SessionKind, SessionLimits,
    SessionOwner, SessionSummary, StartedSession, UsageReceipt,
};
pub use style::{Style, StyleFilter};
