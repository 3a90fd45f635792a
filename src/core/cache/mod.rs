pub mod resolver;

pub use resolver::{
    cache_dir_name, cache_dir_path, describe_missing, missing_files, resolve, CacheDirectory,
    PARTIAL_SUFFIX,
};
