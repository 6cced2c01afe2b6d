mod tfs;

pub use tfs::TfsProvider;
