// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI subsystem for the timeline compiler

pub mod reporter;

pub use reporter::Reporter;

/// Split `a.txt,b.txt` style arguments and drop empty entries
pub fn split_inputs<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_inputs() {
        assert_eq!(
            split_inputs(&["a.txt,b.txt", "c.txt", " ,d.txt"]),
            vec!["a.txt", "b.txt", "c.txt", "d.txt"]
        );
        assert!(split_inputs::<&str>(&[]).is_empty());
    }
}
