// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules for each table.

pub mod messages;
pub mod sessions;
