// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Output naming and CSV emission

pub mod csv;
pub mod naming;

pub use csv::{format_number, format_value, quote_text, render_action, write_csv, WriteStatus, SEPARATOR};
pub use naming::{
    action_file_name, rail_file_name, sketch_file_name, split_segments, value_to_str, BlockLocation,
    OutputRegistry,
};
