//! Hybrid retrieval: lexical and vector sub-searches fused into one ranked
//! result set.

pub mod hybrid;

pub use hybrid::{
    fuse, FusionWeights, HybridHit, HybridResponse, HybridSearcher, LexicalSearch, SearchType,
};
