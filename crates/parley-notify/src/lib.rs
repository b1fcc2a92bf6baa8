pub mod dispatcher;
pub mod mailer;

pub use dispatcher::Dispatcher;
pub use mailer::{EmailTransport, HttpMailer, NoopMailer};
