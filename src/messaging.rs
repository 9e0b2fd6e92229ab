//! Messaging start-up, with an optional decorator that initializes the chat bot.

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("bot channel call failed: {0}")]
    Channel(String),
}

/// Client session flags touched during start-up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub started: bool,
    /// `None` when the server did not report the flag at all
    pub bot_initialized: Option<bool>,
}

pub trait MessagingInitializer {
    fn start(&mut self, session: &mut Session) -> Result<(), MessagingError>;
}

/// Server side of the bot initialization call
pub trait BotChannel {
    /// Returns whether the server initialized the bot
    fn init_bot(&self) -> Result<bool, MessagingError>;
}

#[derive(Debug, Default)]
pub struct BaseInitializer;

impl MessagingInitializer for BaseInitializer {
    fn start(&mut self, session: &mut Session) -> Result<(), MessagingError> {
        session.started = true;
        Ok(())
    }
}

/// Runs the inner initializer, then asks the channel to set up the bot
/// when the session reports it as not yet initialized.
pub struct BotInitializer<I, C> {
    inner: I,
    channel: C,
}

impl<I: MessagingInitializer, C: BotChannel> BotInitializer<I, C> {
    pub fn new(inner: I, channel: C) -> Self {
        Self { inner, channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    fn initialize_bot(&self, session: &mut Session) {
        match self.channel.init_bot() {
            Ok(true) => {
                debug!("bot initialized");
                session.bot_initialized = Some(true);
            }
            Ok(false) => debug!("bot initialization returned nothing"),
            Err(e) => warn!(error = %e, "bot initialization failed"),
        }
    }
}

impl<I: MessagingInitializer, C: BotChannel> MessagingInitializer for BotInitializer<I, C> {
    fn start(&mut self, session: &mut Session) -> Result<(), MessagingError> {
        self.inner.start(session)?;
        if session.bot_initialized == Some(false) {
            self.initialize_bot(session);
        }
        Ok(())
    }
}
