//! Comms — front-ends that feed user lines into the router.
//!
//! Each channel owns its [`Session`](crate::session::Session) and a shared
//! [`Router`](crate::router::Router), and runs until stdin closes, the user
//! quits, or the shutdown token is cancelled.

#[cfg(feature = "channel-pty")]
pub mod pty;

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::AppError;

/// A runnable front-end.
pub trait Channel: Send {
    fn id(&self) -> &str;

    /// Drive the channel to completion. Consumes the channel.
    fn run(
        self: Box<Self>,
        shutdown: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;
}
