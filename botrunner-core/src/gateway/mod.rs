//! Connection to the chat service
//!
//! [`Connector`] and [`Connection`] abstract the realtime gateway,
//! [`ChatApi`] the outbound REST calls. [`discord`] implements them for
//! Discord; [`mock`] scripts them for tests.

pub mod discord;
pub mod mock;
pub mod traits;

pub use discord::{DiscordConfig, DiscordConnector};
pub use mock::{ApiCall, MockConnector, RecordingChatApi};
pub use traits::{BotIdentity, ChatApi, Connection, Connector, GatewayEvent, InboundMessage};
