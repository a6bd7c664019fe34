pub mod csv_codec;
pub mod error;
pub mod fetcher;
pub mod repositories;
pub mod transfer;
pub mod uploader;
pub mod url_issuer;
