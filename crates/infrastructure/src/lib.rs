//! Warden Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus the wiring that assembles
//! them into a ready-to-use authentication stack.

pub mod adapters;
pub mod navigation;
pub mod persistence;
pub mod settings;
pub mod stack;

pub use adapters::{ReqwestTransport, SystemClock};
pub use navigation::{ChannelNavigator, NavigationEvent};
pub use persistence::{FileKeyValueStore, MemoryKeyValueStore};
pub use settings::load_config;
pub use stack::{AuthStack, StackError};
