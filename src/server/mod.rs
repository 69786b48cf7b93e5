//! HTTP control surface for the agent.
//!
//! A thin wrapper over [`AgentController`](crate::agent::AgentController)
//! operations, used by the operator dashboard.
//!
//! # Endpoints
//!
//! - `GET  /health`            — Liveness probe
//! - `GET  /api/agent/status`  — Status snapshot
//! - `POST /api/agent/{start,stop,trigger,focus}` — Operator controls

pub mod routes;

pub use routes::{app_router, AppState};
