mod index;

pub use index::ChecksumIndex;
