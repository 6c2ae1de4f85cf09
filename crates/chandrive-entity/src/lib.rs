//! Entity row types shared between the repositories and the services.

pub mod channel;
pub mod file;
pub mod session;
pub mod upload;

pub use channel::{BotToken, Channel};
pub use file::{CreateFile, File, Part, Parts};
pub use session::Session;
pub use upload::Upload;
