//! The edge domain model: a typed, attributed relationship between two
//! blobs, its binary codec, and the in-memory edge-map used during a cache
//! rebuild pass.

mod codec;
mod confidence;
mod edge;
mod edge_map;
mod lane;
mod rel_type;
mod source_type;

pub use codec::{decode_one, encode_attributed, encode_basic, EdgeRecord};
pub use confidence::Confidence;
pub use edge::{
    Attribution, AttributedEdge, Edge, MAX_AUTHOR_LEN, MAX_PATH_LEN, MAX_SESSION_ID_LEN,
};
pub use edge_map::EdgeMap;
pub use lane::Lane;
pub use rel_type::RelType;
pub use source_type::SourceType;
