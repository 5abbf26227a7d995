//! Integration test suite for the devwallet session.
//!
//! Every test drives a real [`SessionHandle`](devwallet_session::SessionHandle) through its command queue,
//! backed by a scripted provider and an in-memory ledger.

pub mod helpers;
