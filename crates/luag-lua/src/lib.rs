//! Lua script host for LuaG cartridges.
//!
//! # Overview
//!
//! ```text
//! ┌──────────────────────────── ScriptHost ────────────────────────────┐
//! │                                                                     │
//! │  CartridgeWorkspace ──► version ──► PluginResolver ──► PluginHandle │
//! │         │                                                  │        │
//! │         ▼                                                  ▼        │
//! │   scripts/main.lua ──► Lua (LuaEnv sandbox) ◄── luag_lib_load       │
//! │                           │                                         │
//! │                     init / tick / render                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`engine`]: [`ScriptHost`] state machine and [`AudioSink`]
//! - [`plugin`]: version search, [`PluginHandle`], native loader
//! - [`lua_env`]: sandboxed interpreters and host functions
//! - [`exit`]: [`ExitMailbox`]
//! - [`error`]: [`EngineError`], [`PluginError`]

pub mod engine;
pub mod error;
pub mod exit;
pub mod lua_env;
pub mod plugin;

pub use engine::{AudioSink, HostOptions, NullAudio, ScriptHost, SCRIPTED_RENDER_MAJOR};
pub use error::{EngineError, PluginError};
pub use exit::{ExitMailbox, ExitRequest};
pub use lua_env::LuaEnv;
pub use plugin::{NativeLoader, Plugin, PluginHandle, PluginLoader, PluginResolver};
