pub mod provider_json;
pub mod text;
