//! Graph reputation model
//!
//! Estimates proximity of an address to known illicit clusters. True graph
//! traversal needs an indexed transaction graph; this model approximates
//! distance by hex-prefix similarity against cluster members — a deliberate
//! simplification, not a bug. Match tiers (on the hex body after "0x"):
//! exact → 1.0×, 6 chars → 0.70×, 4 chars → 0.45×, 2 chars → 0.20× of the
//! cluster's base risk. The score is the maximum over every (cluster, member)
//! pair, rounded to 3 decimals.

use std::collections::HashSet;

use crate::utils::address::{normalize_address, strip_prefix};

/// A named cluster of related illicit addresses
#[derive(Debug, Clone)]
pub struct Cluster {
    pub label: &'static str,
    pub base_risk: f64,
    pub members: HashSet<String>,
}

impl Cluster {
    pub fn new(label: &'static str, base_risk: f64, members: &[&str]) -> Self {
        Self {
            label,
            base_risk: base_risk.clamp(0.0, 1.0),
            members: members.iter().map(|m| normalize_address(m)).collect(),
        }
    }
}

pub struct GraphReputationModel {
    clusters: Vec<Cluster>,
}

impl GraphReputationModel {
    /// Built-in demo clusters; production deployments replace these from a
    /// threat-intel feed via [`GraphReputationModel::with_clusters`].
    pub fn new() -> Self {
        Self::with_clusters(vec![
            Cluster::new(
                "Phishing Cluster",
                0.95,
                &[
                    "0x111aaa0000000000000000000000000000000001",
                    "0x111abb0000000000000000000000000000000002",
                    "0x111acc0000000000000000000000000000000003",
                ],
            ),
            Cluster::new(
                "Mixer Cluster",
                0.75,
                &[
                    "0x222aaa0000000000000000000000000000000004",
                    "0x222abb0000000000000000000000000000000005",
                ],
            ),
            Cluster::new(
                "Rugpull Cluster",
                0.90,
                &[
                    "0x333aaa0000000000000000000000000000000006",
                    "0x333abb0000000000000000000000000000000007",
                ],
            ),
        ])
    }

    pub fn with_clusters(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    /// Proximity risk in [0,1] for one address, rounded to 3 decimals
    pub fn score(&self, address: &str) -> f64 {
        let addr = normalize_address(address);
        let body = strip_prefix(&addr);
        if body.is_empty() {
            return 0.0;
        }

        let mut max_risk: f64 = 0.0;
        for cluster in &self.clusters {
            for member in &cluster.members {
                let member_body = strip_prefix(member);
                let multiplier = if body == member_body {
                    1.0
                } else if prefix_match(body, member_body, 6) {
                    0.70
                } else if prefix_match(body, member_body, 4) {
                    0.45
                } else if prefix_match(body, member_body, 2) {
                    0.20
                } else {
                    continue;
                };
                max_risk = max_risk.max(multiplier * cluster.base_risk);
            }
        }
        (max_risk * 1000.0).round() / 1000.0
    }

    /// Label of the closest cluster, if any tier matched
    pub fn closest_cluster(&self, address: &str) -> Option<&'static str> {
        let addr = normalize_address(address);
        let body = strip_prefix(&addr);
        self.clusters
            .iter()
            .filter(|c| {
                c.members
                    .iter()
                    .any(|m| prefix_match(body, strip_prefix(m), 2))
            })
            .max_by(|a, b| a.base_risk.total_cmp(&b.base_risk))
            .map(|c| c.label)
    }
}

impl Default for GraphReputationModel {
    fn default() -> Self {
        Self::new()
    }
}

fn prefix_match(a: &str, b: &str, n: usize) -> bool {
    // Byte comparison: avoids char-boundary panics on malformed input
    a.len() >= n && b.len() >= n && a.as_bytes()[..n] == b.as_bytes()[..n]
}
