//! WebSocket transport layer.
//!
//! This module owns the single WebSocket of the session: connecting,
//! serialized writes, frame reassembly, and the background read loop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  Plugin (Rust)   │                              │  Host           │
//! │                  │          WebSocket           │  Application    │
//! │  Socket          │◄────────────────────────────►│                 │
//! │  └─ read loop    │      ws://localhost:PORT     │  WebSocket      │
//! │                  │                              │  Server         │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Socket::connect` - open the socket, spawn the read loop
//! 2. `Socket::send` - serialized outbound frames
//! 3. `Socket::wait_for_close` - await the terminal close status
//! 4. `Socket::disconnect` - close frame, terminal state

// ============================================================================
// Submodules
// ============================================================================

/// Socket ownership, write serialization and the read loop.
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

pub use socket::{CloseStatus, FrameAssembler, FrameHandler, SessionState, Socket};
