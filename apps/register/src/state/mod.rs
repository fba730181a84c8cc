//! # State Module
//!
//! Shared state handed to the register commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────────┐  ┌──────────────────────────┐    │
//! │  │   Registers                      │  │   RegisterConfig         │    │
//! │  │                                  │  │                          │    │
//! │  │  "front-1" ─► Mutex<Session>     │  │  store_name              │    │
//! │  │  "front-2" ─► Mutex<Session>     │  │  currency_symbol         │    │
//! │  │        └─ shared Collaborators   │  │                          │    │
//! │  └──────────────────────────────────┘  └──────────────────────────┘    │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Registers: one tokio Mutex per register, held across checkout       │
//! │  • RegisterConfig: read-only after startup                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod registers;

pub use registers::Registers;
