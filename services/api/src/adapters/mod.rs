pub mod blob;
pub mod db;
pub mod generator;

pub use blob::HttpBlobAdapter;
pub use db::DbAdapter;
pub use generator::OpenAiGenerationAdapter;
