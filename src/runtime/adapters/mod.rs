// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One adapter per runtime contract.

pub mod command;
pub mod native;
pub mod reactor;
pub mod shim;
mod stdio;

pub use command::CommandAdapter;
pub use native::NativeAdapter;
pub use reactor::ReactorAdapter;
pub use shim::HostRuntimeAdapter;
