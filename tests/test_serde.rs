/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![cfg(feature = "serde")]

use anyhow::Result;
use rankprop::prelude::*;

#[test]
fn test_config_defaults() -> Result<()> {
    let config: RankConfig = serde_json::from_str("{}")?;
    assert_eq!(config, RankConfig::default());

    let config: RankConfig = serde_json::from_str(
        r#"{"variant": "article_rank", "iterations": 5, "direction": "both", "normalization": "l2_norm"}"#,
    )?;
    assert_eq!(config.variant, Variant::ArticleRank);
    assert_eq!(config.iterations, 5);
    assert_eq!(config.direction, Direction::Both);
    assert_eq!(config.normalization, Normalization::L2Norm);
    assert_eq!(config.damping_factor, 0.85);
    Ok(())
}

#[test]
fn test_config_round_trip() -> Result<()> {
    let config = RankConfig {
        variant: Variant::Weighted {
            cache_weights: true,
        },
        source_nodes: vec![3, 1],
        huge: true,
        ..RankConfig::default()
    };
    let json = serde_json::to_string(&config)?;
    assert!(json.contains(r#""weighted":{"cache_weights":true}"#));
    assert_eq!(serde_json::from_str::<RankConfig>(&json)?, config);
    Ok(())
}
