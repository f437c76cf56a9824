/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Reading graphs from line-oriented lists of arcs.
//!
//! Each non-comment line contains a source column, a target column and,
//! optionally, a weight column, separated by a separator character (a TAB by
//! default; if the separator is whitespace, any run of whitespace separates
//! columns). Node ids must be unsigned integers.
//!
//! By default ids are used directly as node ids, so the resulting graph has
//! as many nodes as the largest id plus one. With
//! [`labels`](ArcsOptions::labels) enabled ids are instead interned in
//! appearance order, and the graph keeps them as original ids (see
//! [`IdMapping`](crate::traits::IdMapping)).

use super::vec_graph::VecGraph;
use std::collections::HashMap;
use std::io::BufRead;
use thiserror::Error;

/// Errors that can happen while reading a list of arcs.
#[derive(Error, Debug)]
pub enum ParseArcsError {
    #[error("I/O error while reading arcs: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line}: cannot parse node id {value:?} as an unsigned integer")]
    InvalidId { line: usize, value: String },
    #[error("Line {line}: cannot parse weight {value:?} as a floating-point number")]
    InvalidWeight { line: usize, value: String },
    #[error("Node id {id} at line {line} is too large for this platform")]
    IdTooLarge { line: usize, id: u64 },
    #[error("The number of nodes specified ({specified}) is smaller than the number of nodes found ({found})")]
    TooFewNodes { specified: usize, found: usize },
}

/// Options for [`read_arcs`].
#[derive(Debug, Clone)]
pub struct ArcsOptions {
    /// Ignore lines that start with this symbol.
    pub line_comment_symbol: char,
    /// How many lines to skip, ignoring comment lines.
    pub lines_to_skip: usize,
    /// How many arcs to read at most.
    pub max_arcs: Option<usize>,
    /// The column separator.
    pub separator: char,
    /// The index of the column containing the source node of an arc.
    pub source_column: usize,
    /// The index of the column containing the target node of an arc.
    pub target_column: usize,
    /// The index of the column containing the weight of an arc, if any.
    pub weight_column: Option<usize>,
    /// Intern ids in appearance order instead of using them as node ids.
    pub labels: bool,
    /// The number of nodes of the graph, if larger than the one inferred.
    pub num_nodes: Option<usize>,
}

impl Default for ArcsOptions {
    fn default() -> Self {
        Self {
            line_comment_symbol: '#',
            lines_to_skip: 0,
            max_arcs: None,
            separator: '\t',
            source_column: 0,
            target_column: 1,
            weight_column: None,
            labels: false,
            num_nodes: None,
        }
    }
}

/// Reads a [`VecGraph`] from a list of arcs.
///
/// Lines with too few columns are skipped with a warning; ids or weights
/// that cannot be parsed are errors.
pub fn read_arcs(reader: impl BufRead, options: &ArcsOptions) -> Result<VecGraph, ParseArcsError> {
    let mut labels: HashMap<u64, usize> = HashMap::new();
    let mut original_ids = Vec::new();
    let mut arcs = Vec::new();
    let mut num_nodes = 0;

    let biggest_idx = options
        .source_column
        .max(options.target_column)
        .max(options.weight_column.unwrap_or(0));

    let mut skipped = 0;
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(options.line_comment_symbol) {
            continue;
        }
        if skipped < options.lines_to_skip {
            skipped += 1;
            continue;
        }
        if let Some(max_arcs) = options.max_arcs {
            if arcs.len() >= max_arcs {
                break;
            }
        }

        let vals: Vec<&str> = if options.separator.is_whitespace() {
            trimmed.split_whitespace().collect()
        } else {
            trimmed.split(options.separator).map(str::trim).collect()
        };

        if vals.get(biggest_idx).is_none() {
            log::warn!(
                "Line {}: {:?} does not have enough columns: got {} columns but expected at least {} columns separated by {:?}",
                line_num + 1,
                line,
                vals.len(),
                biggest_idx + 1,
                options.separator,
            );
            continue;
        }

        let mut node = |value: &str| -> Result<usize, ParseArcsError> {
            let id = value.parse::<u64>().map_err(|_| ParseArcsError::InvalidId {
                line: line_num + 1,
                value: value.to_owned(),
            })?;
            if options.labels {
                Ok(*labels.entry(id).or_insert_with(|| {
                    original_ids.push(id);
                    original_ids.len() - 1
                }))
            } else {
                usize::try_from(id).map_err(|_| ParseArcsError::IdTooLarge {
                    line: line_num + 1,
                    id,
                })
            }
        };

        let src = node(vals[options.source_column])?;
        let dst = node(vals[options.target_column])?;
        let weight = match options.weight_column {
            Some(column) => Some(vals[column].parse::<f64>().map_err(|_| {
                ParseArcsError::InvalidWeight {
                    line: line_num + 1,
                    value: vals[column].to_owned(),
                }
            })?),
            None => None,
        };

        num_nodes = num_nodes.max(src.max(dst) + 1);
        arcs.push((src, dst, weight));
    }

    if let Some(specified) = options.num_nodes {
        if specified < num_nodes {
            return Err(ParseArcsError::TooFewNodes {
                specified,
                found: num_nodes,
            });
        }
        num_nodes = specified;
    }

    log::info!("Arcs read: {} Nodes: {}", arcs.len(), num_nodes);

    let mut graph = VecGraph::empty(num_nodes);
    for (src, dst, weight) in arcs {
        match weight {
            Some(w) => graph.add_weighted_arc(src, dst, w),
            None => graph.add_arc(src, dst),
        }
    }

    if options.labels {
        // Extra nodes requested through num_nodes get fresh ids past the
        // largest label
        let mut next = original_ids.iter().max().map_or(0, |&max| max + 1);
        while original_ids.len() < num_nodes {
            original_ids.push(next);
            next += 1;
        }
        graph = graph.with_original_ids(original_ids);
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::*;

    #[test]
    fn test_exact() -> anyhow::Result<()> {
        let data = "# a comment\n0\t1\n1\t2\n\n2\t0\n3\n";
        let g = read_arcs(data.as_bytes(), &ArcsOptions::default())?;
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_relationships(), 3);
        assert_eq!(g.successors(2).collect::<Vec<_>>(), vec![0]);
        Ok(())
    }

    #[test]
    fn test_labels_and_weights() -> anyhow::Result<()> {
        let data = "100 7 0.5\n7 42 2\n";
        let options = ArcsOptions {
            separator: ' ',
            weight_column: Some(2),
            labels: true,
            ..Default::default()
        };
        let g = read_arcs(data.as_bytes(), &options)?;
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.to_original_node_id(0), 100);
        assert_eq!(g.to_mapped_node_id(42), Some(2));
        assert_eq!(g.weight(1, 2), 2.0);
        assert_eq!(g.weight(0, 1), 0.5);
        Ok(())
    }

    #[test]
    fn test_errors() {
        let err = read_arcs("0\tx\n".as_bytes(), &ArcsOptions::default()).unwrap_err();
        assert!(matches!(err, ParseArcsError::InvalidId { line: 1, .. }));

        let options = ArcsOptions {
            weight_column: Some(2),
            ..Default::default()
        };
        let err = read_arcs("0\t1\tfoo\n".as_bytes(), &options).unwrap_err();
        assert!(matches!(err, ParseArcsError::InvalidWeight { line: 1, .. }));

        let options = ArcsOptions {
            num_nodes: Some(1),
            ..Default::default()
        };
        let err = read_arcs("0\t1\n".as_bytes(), &options).unwrap_err();
        assert!(matches!(
            err,
            ParseArcsError::TooFewNodes {
                specified: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn test_skip_and_max() -> anyhow::Result<()> {
        let options = ArcsOptions {
            lines_to_skip: 1,
            max_arcs: Some(1),
            num_nodes: Some(10),
            ..Default::default()
        };
        let g = read_arcs("src\tdst\n0\t1\n1\t2\n".as_bytes(), &options)?;
        assert_eq!(g.num_nodes(), 10);
        assert_eq!(g.num_relationships(), 1);
        Ok(())
    }
}
