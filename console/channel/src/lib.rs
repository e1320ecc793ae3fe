pub mod notification;

pub use notification::{ChannelConfig, ChannelState, NotificationChannel};
