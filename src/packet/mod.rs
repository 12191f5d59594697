//
// SPDX-License-Identifier: MIT
//

pub mod attribute;
pub mod consts;
pub mod error;
pub mod ext;
pub mod message;
pub mod nlri;
