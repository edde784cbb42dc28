//! # PromptJam
//!
//! WebSocket server for PromptJam, a party game where a Game Master
//! walks a room full of players through a pack of problems, players race
//! to submit the best prompt for each one, and a generative-AI judge
//! ranks the submissions.
//!
//! This crate ties the layers together: `promptjam-gateway` accepts
//! connections, `promptjam-protocol` gives the frames shape,
//! `promptjam-room` runs the rooms, and `promptjam-judge` ranks the
//! rounds.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use promptjam::PromptJamServer;
//! use promptjam_judge::{GeminiConfig, GeminiJudge};
//! use promptjam_room::LevelCatalog;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Arc::new(LevelCatalog::load("levels.json")?);
//! let judge = GeminiJudge::new(GeminiConfig::new("api-key"))?;
//!
//! let server = PromptJamServer::<GeminiJudge>::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(catalog, judge)
//!     .await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use server::{PromptJamServer, PromptJamServerBuilder};
