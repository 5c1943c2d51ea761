mod crypto;
mod import;
mod query;
mod recovery;
mod utils;
