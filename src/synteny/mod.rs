mod anchors;
mod blocks;
mod seq_db;

pub use anchors::{find_anchors, Anchor};
pub use blocks::{
    align_block, detect_blocks, export_blocks, find_synteny, synteny_figplot, Block, ChainParams,
    PairSynteny,
};
pub use seq_db::SeqDb;
