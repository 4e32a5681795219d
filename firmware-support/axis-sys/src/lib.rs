// SPDX-FileCopyrightText: 2022 Google LLC
//
// SPDX-License-Identifier: Apache-2.0

#![no_std]

pub mod acquisition;
pub mod error;
pub mod exception;
pub mod handoff;
pub mod intc;
pub mod panic_handler;
pub mod params;
pub mod sink;
pub mod stream;
pub mod uart;
