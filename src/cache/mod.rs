//! Local cache of HDFS files
//!
//! Files are stored flat in one directory, named by the MD5 digest of
//! their HDFS path. A file's presence is the only cache-hit signal: its
//! contents are never verified, refreshed or evicted.

pub mod fetch;
pub mod path;

pub use fetch::{FetchOutcome, Fetcher, HadoopCopier, RemoteCopier};
pub use path::{local_name, local_path};
