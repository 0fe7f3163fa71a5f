//! Boundjoin core library.
//!
//! Builds neighbour-joining trees from distance matrices. The plain and
//! BIONJ engines can run with a full scan per join, or under a
//! branch-and-bound search that keeps each row's distances sorted and stops
//! scanning a row once no remaining entry can beat the best candidate.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod bounding;
mod builder;
mod engine;
mod error;
mod joiner;
mod matrix;
mod real;
mod source;
#[cfg(test)]
mod test_utils;
mod tree;

pub use crate::{
    bounding::{
        BoundingConfig, BoundingMatrix, JoinRecord, Phase, RapidBionj, RapidNj, SearchStats,
    },
    builder::{Algorithm, JoinerBuilder},
    engine::{
        Bionj, BionjFormula, ClusteringEngine, JoinFormula, JoinOutcome, NeighbourJoining, Nj,
        NjFormula, RowMinimum,
    },
    error::{
        JoinError, JoinErrorCode, MatrixError, MatrixErrorCode, Result, SourceError,
        SourceErrorCode,
    },
    joiner::Joiner,
    matrix::DistanceMatrix,
    real::Real,
    source::DistanceSource,
    tree::{Cluster, ClusterId, ClusterTree, Link, PhyloTree},
};
