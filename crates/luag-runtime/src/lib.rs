//! LuaG Runtime - interpreter-independent console core.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   luag-cli (binary `luag`)                   │
//! │  command table, tick loop, stdin/stdout frontend, logging    │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   luag-lua                                   │
//! │  ScriptHost, plugin resolver, sandboxed Lua environment      │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Runtime Layer (THIS CRATE)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ring/      : BoundedQueue, RingBuffer                       │
//! │  cartridge/ : CartridgeWorkspace, Version, TileMap, archive  │
//! │  sandbox    : CartridgeSandbox (path confinement)            │
//! │  terminal/  : Terminal line editor, scrollback, history      │
//! │  config/    : ConsoleConfig, ConfigLoader                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! ## [`ring`] - Bounded containers
//!
//! - [`BoundedQueue`](ring::BoundedQueue): rejects pushes when full
//! - [`RingBuffer`](ring::RingBuffer): overwrites the oldest item when full
//!
//! ## [`cartridge`] - Game packages
//!
//! - [`CartridgeWorkspace`](cartridge::CartridgeWorkspace): an opened cartridge
//! - [`Version`](cartridge::Version): declared scripting API version
//! - [`archive`](cartridge::archive): `.luag` pack/unpack
//!
//! ## [`sandbox`] - Confinement
//!
//! - [`CartridgeSandbox`]: canonical prefix check for script file loads
//!
//! ## [`terminal`] - Shell line editor
//!
//! - [`Terminal`](terminal::Terminal): queues, active line, scrollback
//! - [`Display`](terminal::Display) / [`Clipboard`](terminal::Clipboard):
//!   collaborators
//!
//! ## [`config`] - Configuration Management
//!
//! - [`ConsoleConfig`](config::ConsoleConfig): merged settings
//! - [`ConfigLoader`](config::ConfigLoader): defaults, files, environment

pub mod cartridge;
pub mod config;
pub mod error;
pub mod ring;
pub mod sandbox;
pub mod terminal;
mod work_dir;

pub use cartridge::{CartridgeError, CartridgeSource, CartridgeWorkspace, Version};
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use sandbox::{CartridgeSandbox, SandboxError};
pub use terminal::Terminal;
pub use work_dir::WorkDir;
