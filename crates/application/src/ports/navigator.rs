//! Navigation port

/// Sends the user to the unauthenticated entry point.
///
/// Fire-and-forget: implementations must not block and cannot fail.
pub trait Navigator: Send + Sync {
    /// Navigates to the login screen.
    fn redirect_to_login(&self);
}
