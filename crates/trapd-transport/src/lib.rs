// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport to the TRAPD intake.
//!
//! Serializes a leased batch into the wire format and POSTs it with
//! bearer authentication. The client classifies every outcome into
//! success (any 2xx) or a transport error carrying the status code and a
//! bounded body excerpt; retry policy lives with the sender, not here.

pub mod client;

pub use client::IntakeClient;
