//! Line-oriented sidecar files written next to each part.

pub mod codec;
pub mod hash_listing;
pub mod tar_listing;

pub use codec::{decode_hash_line, decode_path_line, encode_hash_line, encode_path_line};
pub use hash_listing::{
    HashListing, artifact_hash_path, read_artifact_hash, read_hash_listing, read_part_count,
    read_path_listing, write_artifact_hash, write_hash_listing, write_part_count,
    write_path_listing,
};
pub use tar_listing::{parse_tar_listing, read_tar_listing};
