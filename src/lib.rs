//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![cfg_attr(
    feature = "testing",
    allow(dead_code, unused_variables, unused_imports)
)]
#![feature(extract_if, if_let_guard, let_chains)]

pub mod config;
pub mod debug;
pub mod error;
pub mod packet;
pub mod route;
pub mod session;
