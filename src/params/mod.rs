// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parameter table and arithmetic expression evaluation

pub mod evaluator;
pub mod expression;
pub mod table;

pub use evaluator::{evaluate, BareNames, Evaluator, CONSTANTS, FUNCTIONS};
pub use expression::{parse_expression, BinaryOp, Expr};
pub use table::{validate_name, Parameter, ParameterTable};
