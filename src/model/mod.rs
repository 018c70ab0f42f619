pub mod attention;
pub mod distilbert;
pub mod embeddings;
pub mod ffn;
pub mod transformer_block;
