// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Expression parser using pest

use crate::error::ExpressionError;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Parser)]
#[grammar = "params/expression.pest"]
struct ExpressionParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parsed arithmetic expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Number(f64),
    /// `$name` reference
    Parameter(String),
    /// Bare name: a constant, or a parameter inside a parameters block
    Identifier(String),
    Call { name: String, args: Vec<Expr> },
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Names referenced by the expression, in order of appearance
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Parameter(name) | Expr::Identifier(name) => names.push(name),
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_references(names)),
            Expr::Neg(inner) => inner.collect_references(names),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_references(names);
                rhs.collect_references(names);
            }
        }
    }
}

// `**` binds tighter than unary minus, so `-2**2` is -4 and `2**-1` is 0.5.
fn pratt() -> &'static PrattParser<Rule> {
    static PRATT: OnceLock<PrattParser<Rule>> = OnceLock::new();
    PRATT.get_or_init(|| {
        PrattParser::new()
            .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
            .op(Op::infix(Rule::mul, Assoc::Left) | Op::infix(Rule::div, Assoc::Left))
            .op(Op::prefix(Rule::neg) | Op::prefix(Rule::pos))
            .op(Op::infix(Rule::pow, Assoc::Right))
    })
}

/// Parse expression source text into an [`Expr`]
pub fn parse_expression(source: &str) -> Result<Expr, ExpressionError> {
    let mut pairs = ExpressionParser::parse(Rule::expression, source)
        .map_err(|e| ExpressionError::Syntax(e.variant.message().into_owned()))?;

    let expr = pairs
        .next()
        .and_then(|expression| expression.into_inner().next())
        .ok_or_else(|| ExpressionError::Syntax("empty expression".to_string()))?;
    build(expr.into_inner())
}

fn build(pairs: Pairs<Rule>) -> Result<Expr, ExpressionError> {
    pratt()
        .map_primary(build_primary)
        .map_prefix(|op, rhs| {
            let rhs = rhs?;
            Ok(match op.as_rule() {
                Rule::neg => Expr::Neg(Box::new(rhs)),
                _ => rhs,
            })
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                _ => BinaryOp::Pow,
            };
            Ok(Expr::Binary {
                op,
                lhs: Box::new(lhs?),
                rhs: Box::new(rhs?),
            })
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<Rule>) -> Result<Expr, ExpressionError> {
    match pair.as_rule() {
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|e| ExpressionError::Syntax(format!("invalid number `{}`: {}", pair.as_str(), e))),
        Rule::parameter => Ok(Expr::Parameter(pair.as_str().trim_start_matches('$').to_string())),
        Rule::identifier => Ok(Expr::Identifier(pair.as_str().to_string())),
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = inner
                .next()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            let args = inner
                .map(|arg| build(arg.into_inner()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::Call { name, args })
        }
        Rule::expr => build(pair.into_inner()),
        rule => Err(ExpressionError::Syntax(format!("unexpected {:?}", rule))),
    }
}
