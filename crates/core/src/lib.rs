pub mod backend;
pub mod controller;
pub mod intent;
pub mod session;

/// Represents commands that the dialogue controller issues to an external runtime.
///
/// This enum is the primary API for decoupling the controller's decision-making
/// from the runtime's execution of side effects (like speaking text or
/// finalizing a session).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Command the runtime to speak the given text to the user.
    Say(String),
    /// Command indicating the session is over, with a final farewell message.
    EndSession(String),
}
