use crate::adjacency::GeometricOracle;
use crate::index::RegionIndex;
use crate::types::Region;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborPair {
    pub first: String,
    pub second: String,
}

/// The adjacency relation of a whole dataset, materialised once.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    pairs: Vec<NeighborPair>,
    neighbors: HashMap<String, Vec<String>>,
}

impl AdjacencyGraph {
    pub fn build(regions: &[Region], oracle: &GeometricOracle) -> Self {
        let index = RegionIndex::build(regions);
        let candidates = index.candidate_pairs(oracle.tolerance());
        info!(
            regions = regions.len(),
            candidates = candidates.len(),
            "evaluating candidate pairs"
        );

        // par_iter keeps the canonical order on collect.
        let pairs: Vec<NeighborPair> = candidates
            .par_iter()
            .filter(|&&(i, j)| oracle.is_adjacent(&regions[i], &regions[j]))
            .map(|&(i, j)| NeighborPair {
                first: regions[i].id.clone(),
                second: regions[j].id.clone(),
            })
            .collect();

        let mut neighbors: HashMap<String, Vec<String>> = HashMap::new();
        for pair in &pairs {
            neighbors.entry(pair.first.clone()).or_default().push(pair.second.clone());
            neighbors.entry(pair.second.clone()).or_default().push(pair.first.clone());
        }

        info!(pairs = pairs.len(), "adjacency graph built");
        Self { pairs, neighbors }
    }

    pub fn pairs(&self) -> &[NeighborPair] {
        &self.pairs
    }

    pub fn neighbors_of(&self, id: &str) -> &[String] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, id: &str) -> usize {
        self.neighbors_of(id).len()
    }

    /// Region with the most neighbours; ties go to the smaller id.
    pub fn max_degree(&self) -> Option<(&str, usize)> {
        self.neighbors
            .iter()
            .map(|(id, n)| (id.as_str(), n.len()))
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for pair in &self.pairs {
            wtr.serialize(pair).context("Failed to write neighbor pair")?;
        }
        wtr.flush().context("Failed to flush CSV output")?;
        Ok(())
    }
}
