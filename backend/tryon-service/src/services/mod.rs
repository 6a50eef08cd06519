pub mod qr;
pub mod session;

pub use qr::SalonQrService;
pub use session::{ClientSessions, IndividualSessions, SessionBackend, SessionManager};
